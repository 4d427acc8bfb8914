//! Registration and contact repositories
//!
//! Both tables are append-only from the public site. A registration books
//! its seats on the event row and inserts the registration in one
//! transaction, so the counter always matches the stored rows and capacity
//! holds under concurrent requests.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

use crate::db::{is_unique_violation, DynDatabasePool, InsertedId};
use crate::models::{Contact, ContactInput, CreateRegistrationInput, Registration};
use crate::with_pool;

/// Outcome of a registration attempt
#[derive(Debug)]
pub enum Booking {
    Confirmed(Registration),
    /// Not enough seats; nothing was written
    Full { left: i64 },
    /// The email is already registered to the event; nothing was written
    DuplicateEmail,
}

/// Registration repository trait
#[async_trait]
pub trait RegistrationRepository: Send + Sync {
    /// Book `input.seats` on the event and store the registration
    async fn create(&self, event_id: i64, input: &CreateRegistrationInput) -> Result<Booking>;

    /// Whether this email is already registered to the event (case-insensitive)
    async fn exists_for_email(&self, event_id: i64, email: &str) -> Result<bool>;
}

/// Contact repository trait
#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn create(&self, input: &ContactInput) -> Result<Contact>;
}

/// SQLx-based registration repository
pub struct SqlxRegistrationRepository {
    pool: DynDatabasePool,
}

impl SqlxRegistrationRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn RegistrationRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl RegistrationRepository for SqlxRegistrationRepository {
    async fn create(&self, event_id: i64, input: &CreateRegistrationInput) -> Result<Booking> {
        let booking = with_pool!(self.pool, |p| {
            let mut tx = p.begin().await.context("Failed to begin transaction")?;

            // Row lock on the event serialises concurrent bookings. The
            // comparisons are written so that no sum can overflow.
            let reserved = sqlx::query(
                r#"UPDATE events SET registration_count = registration_count + ?
                   WHERE id = ?
                     AND registration_count <= ?
                     AND (capacity IS NULL OR registration_count <= capacity - ?)"#,
            )
            .bind(input.seats)
            .bind(event_id)
            .bind(i64::MAX.saturating_sub(input.seats))
            .bind(input.seats)
            .execute(&mut *tx)
            .await
            .context("Failed to reserve seats")?
            .rows_affected();

            if reserved == 0 {
                let left = sqlx::query_scalar::<_, Option<i64>>(
                    "SELECT capacity - registration_count FROM events WHERE id = ?",
                )
                .bind(event_id)
                .fetch_optional(&mut *tx)
                .await
                .context("Failed to read remaining seats")?
                .flatten()
                .unwrap_or(0);
                return Ok(Booking::Full { left: left.max(0) });
            }

            let inserted = sqlx::query(
                r#"INSERT INTO registrations (event_id, full_name, email, phone, seats, message)
                   VALUES (?, ?, ?, ?, ?, ?)"#,
            )
            .bind(event_id)
            .bind(&input.full_name)
            .bind(input.email.to_lowercase())
            .bind(&input.phone)
            .bind(input.seats)
            .bind(&input.message)
            .execute(&mut *tx)
            .await;
            let id = match inserted {
                Ok(result) => result.inserted_id(),
                Err(e) if is_unique_violation(&e) => return Ok(Booking::DuplicateEmail),
                Err(e) => return Err(e).context("Failed to create registration"),
            };

            let registration =
                sqlx::query_as::<_, Registration>("SELECT * FROM registrations WHERE id = ?")
                    .bind(id)
                    .fetch_one(&mut *tx)
                    .await
                    .context("Failed to read registration back")?;

            tx.commit().await.context("Failed to commit registration")?;
            Booking::Confirmed(registration)
        });
        Ok(booking)
    }

    async fn exists_for_email(&self, event_id: i64, email: &str) -> Result<bool> {
        let count = with_pool!(self.pool, |p| {
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM registrations WHERE event_id = ? AND LOWER(email) = ?",
            )
            .bind(event_id)
            .bind(email.to_lowercase())
            .fetch_one(p)
            .await
            .context("Failed to check registration")?
        });
        Ok(count > 0)
    }
}

/// SQLx-based contact repository
pub struct SqlxContactRepository {
    pool: DynDatabasePool,
}

impl SqlxContactRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ContactRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ContactRepository for SqlxContactRepository {
    async fn create(&self, input: &ContactInput) -> Result<Contact> {
        let id = with_pool!(self.pool, |p| {
            sqlx::query(
                "INSERT INTO contacts (name, email, phone, subject, message) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.subject)
            .bind(&input.message)
            .execute(p)
            .await
            .context("Failed to store contact message")?
            .inserted_id()
        });

        let contact = with_pool!(self.pool, |p| {
            sqlx::query_as::<_, Contact>("SELECT * FROM contacts WHERE id = ?")
                .bind(id)
                .fetch_one(p)
                .await
                .context("Failed to read contact message back")?
        });
        Ok(contact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fixtures::{insert_event, migrated_pool};
    use chrono::Utc;

    async fn confirmed(
        repo: &SqlxRegistrationRepository,
        event: i64,
        input: CreateRegistrationInput,
    ) -> Registration {
        match repo.create(event, &input).await.unwrap() {
            Booking::Confirmed(registration) => registration,
            other => panic!("expected a confirmed booking, got {:?}", other),
        }
    }

    async fn booked_seats(pool: &DynDatabasePool, event: i64) -> i64 {
        sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(seats), 0) FROM registrations WHERE event_id = ?",
        )
        .bind(event)
        .fetch_one(pool.as_sqlite().unwrap())
        .await
        .unwrap()
    }

    async fn registration_count(pool: &DynDatabasePool, event: i64) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT registration_count FROM events WHERE id = ?")
            .bind(event)
            .fetch_one(pool.as_sqlite().unwrap())
            .await
            .unwrap()
    }

    fn registration(email: &str, seats: i64) -> CreateRegistrationInput {
        CreateRegistrationInput {
            full_name: "Jeanne Martin".to_string(),
            email: email.to_string(),
            phone: None,
            seats,
            message: None,
        }
    }

    #[tokio::test]
    async fn test_registration_lookup_is_case_insensitive() {
        let pool = migrated_pool().await;
        let event = insert_event(pool.as_sqlite().unwrap(), "a", Utc::now(), Some(10), true).await;
        let repo = SqlxRegistrationRepository::new(pool.clone());

        let created = confirmed(&repo, event, registration("Jeanne@Example.com", 2)).await;
        assert_eq!(created.email, "jeanne@example.com");
        assert_eq!(created.seats, 2);

        assert!(repo.exists_for_email(event, "JEANNE@example.com").await.unwrap());
        assert!(!repo.exists_for_email(event, "paul@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_counter_matches_booked_seats() {
        let pool = migrated_pool().await;
        let event = insert_event(pool.as_sqlite().unwrap(), "a", Utc::now(), None, true).await;
        let repo = SqlxRegistrationRepository::new(pool.clone());

        assert_eq!(booked_seats(&pool, event).await, 0);
        confirmed(&repo, event, registration("a@example.com", 2)).await;
        confirmed(&repo, event, registration("b@example.com", 3)).await;
        assert_eq!(booked_seats(&pool, event).await, 5);
        assert_eq!(registration_count(&pool, event).await, 5);
    }

    #[tokio::test]
    async fn test_booking_stops_at_capacity() {
        let pool = migrated_pool().await;
        let event = insert_event(pool.as_sqlite().unwrap(), "a", Utc::now(), Some(4), true).await;
        let repo = SqlxRegistrationRepository::new(pool.clone());

        confirmed(&repo, event, registration("a@example.com", 3)).await;
        assert!(matches!(
            repo.create(event, &registration("b@example.com", 2)).await.unwrap(),
            Booking::Full { left: 1 }
        ));
        confirmed(&repo, event, registration("c@example.com", 1)).await;
        assert!(matches!(
            repo.create(event, &registration("d@example.com", 1)).await.unwrap(),
            Booking::Full { left: 0 }
        ));

        assert_eq!(booked_seats(&pool, event).await, 4);
        assert_eq!(registration_count(&pool, event).await, 4);
    }

    #[tokio::test]
    async fn test_duplicate_email_leaves_counter_untouched() {
        let pool = migrated_pool().await;
        let event = insert_event(pool.as_sqlite().unwrap(), "a", Utc::now(), Some(10), true).await;
        let repo = SqlxRegistrationRepository::new(pool.clone());

        confirmed(&repo, event, registration("a@example.com", 2)).await;
        assert!(matches!(
            repo.create(event, &registration("A@example.com", 3)).await.unwrap(),
            Booking::DuplicateEmail
        ));

        assert_eq!(booked_seats(&pool, event).await, 2);
        assert_eq!(registration_count(&pool, event).await, 2);
    }

    #[tokio::test]
    async fn test_failed_insert_releases_seats() {
        let pool = migrated_pool().await;
        let sqlite = pool.as_sqlite().unwrap();
        let event = insert_event(sqlite, "a", Utc::now(), Some(10), true).await;
        sqlx::query(
            "CREATE TRIGGER reject_registration BEFORE INSERT ON registrations BEGIN SELECT RAISE(ABORT, 'registrations locked'); END",
        )
        .execute(sqlite)
        .await
        .unwrap();
        let repo = SqlxRegistrationRepository::new(pool.clone());

        assert!(repo.create(event, &registration("a@example.com", 3)).await.is_err());
        assert_eq!(registration_count(&pool, event).await, 0);
    }

    #[tokio::test]
    async fn test_counter_cannot_overflow() {
        let pool = migrated_pool().await;
        let sqlite = pool.as_sqlite().unwrap();
        let event = insert_event(sqlite, "a", Utc::now(), None, true).await;
        sqlx::query("UPDATE events SET registration_count = ? WHERE id = ?")
            .bind(i64::MAX - 1)
            .bind(event)
            .execute(sqlite)
            .await
            .unwrap();
        let repo = SqlxRegistrationRepository::new(pool.clone());

        assert!(matches!(
            repo.create(event, &registration("a@example.com", 2)).await.unwrap(),
            Booking::Full { .. }
        ));
        assert_eq!(registration_count(&pool, event).await, i64::MAX - 1);
    }

    #[tokio::test]
    async fn test_contact_create() {
        let pool = migrated_pool().await;
        let repo = SqlxContactRepository::new(pool.clone());
        let contact = repo
            .create(&ContactInput {
                name: "Lina".to_string(),
                email: "lina@example.com".to_string(),
                phone: Some("0601020304".to_string()),
                subject: "Bénévolat".to_string(),
                message: "Je souhaite aider lors de la prochaine collecte.".to_string(),
            })
            .await
            .unwrap();
        assert!(contact.id > 0);
        assert_eq!(contact.subject, "Bénévolat");
    }
}
