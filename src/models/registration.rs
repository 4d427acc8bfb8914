//! Event registration and contact form models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Registration of a visitor to an event
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Registration {
    pub id: i64,
    pub event_id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    /// Number of seats booked by this registration
    pub seats: i64,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for registering to an event
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRegistrationInput {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(default = "default_seats")]
    pub seats: i64,
    pub message: Option<String>,
}

fn default_seats() -> i64 {
    1
}

/// Message sent through the contact form
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Input of the contact form
#[derive(Debug, Clone, Deserialize)]
pub struct ContactInput {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
}
