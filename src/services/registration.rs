//! Event registration service

use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::{optional_text, require_email, require_length, ServiceError};
use crate::cache::QueryCache;
use crate::db::repositories::{Booking, EventRepository, RegistrationRepository};
use crate::models::{CreateRegistrationInput, Registration};

pub const MAX_SEATS: i64 = 20;
pub const MAX_FULL_NAME: usize = 100;
pub const MAX_PHONE: usize = 30;
pub const MAX_MESSAGE: usize = 1000;

pub struct RegistrationService {
    registrations: Arc<dyn RegistrationRepository>,
    events: Arc<dyn EventRepository>,
    cache: QueryCache,
}

impl RegistrationService {
    pub fn new(
        registrations: Arc<dyn RegistrationRepository>,
        events: Arc<dyn EventRepository>,
        cache: QueryCache,
    ) -> Self {
        Self {
            registrations,
            events,
            cache,
        }
    }

    /// Register a visitor to an event
    pub async fn register(
        &self,
        event_id: i64,
        input: CreateRegistrationInput,
    ) -> Result<Registration, ServiceError> {
        self.register_at(event_id, input, Utc::now()).await
    }

    /// [`register`](Self::register) with an explicit reference time
    pub async fn register_at(
        &self,
        event_id: i64,
        input: CreateRegistrationInput,
        now: DateTime<Utc>,
    ) -> Result<Registration, ServiceError> {
        let input = validate(input)?;

        let event = match self.events.get_by_id(event_id).await? {
            Some(event) if event.is_published => event,
            _ => return Err(ServiceError::NotFound(format!("Event {}", event_id))),
        };
        if !event.registration_open {
            return Err(ServiceError::Closed(
                "Registrations are closed for this event".to_string(),
            ));
        }
        if event.starts_at < now {
            return Err(ServiceError::Closed("This event has already started".to_string()));
        }
        if self
            .registrations
            .exists_for_email(event_id, &input.email)
            .await?
        {
            return Err(ServiceError::Conflict(
                "This email is already registered for the event".to_string(),
            ));
        }

        let registration = match self.registrations.create(event_id, &input).await? {
            Booking::Confirmed(registration) => registration,
            Booking::Full { left: 0 } => {
                return Err(ServiceError::Closed("This event is full".to_string()))
            }
            Booking::Full { left } => {
                return Err(ServiceError::Closed(format!("Only {} seats left", left)))
            }
            Booking::DuplicateEmail => {
                return Err(ServiceError::Conflict(
                    "This email is already registered for the event".to_string(),
                ))
            }
        };

        tracing::info!(event_id, seats = registration.seats, "Registration recorded");
        self.cache.invalidate("events:*").await;
        Ok(registration)
    }
}

fn validate(input: CreateRegistrationInput) -> Result<CreateRegistrationInput, ServiceError> {
    if !(1..=MAX_SEATS).contains(&input.seats) {
        return Err(ServiceError::ValidationError(format!(
            "Seats must be between 1 and {}",
            MAX_SEATS
        )));
    }
    let phone = optional_text(input.phone.as_deref());
    if phone.as_ref().is_some_and(|p| p.chars().count() > MAX_PHONE) {
        return Err(ServiceError::ValidationError(format!(
            "Phone must be at most {} characters",
            MAX_PHONE
        )));
    }
    let message = match optional_text(input.message.as_deref()) {
        Some(message) => Some(require_length("Message", &message, 1, MAX_MESSAGE)?),
        None => None,
    };

    Ok(CreateRegistrationInput {
        full_name: require_length("Name", &input.full_name, 1, MAX_FULL_NAME)?,
        email: require_email(&input.email)?,
        phone,
        seats: input.seats,
        message,
    })
}
