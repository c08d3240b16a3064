use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use rand::{distributions::Alphanumeric, Rng};
use crate::domain::models::guest::AgeGroup;

pub const RSVP_TOKEN_LENGTH: usize = 48;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum RsvpStatus {
    Pending,
    Attending,
    NotAttending,
    Maybe,
}

impl RsvpStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RsvpStatus::Pending => "pending",
            RsvpStatus::Attending => "attending",
            RsvpStatus::NotAttending => "not_attending",
            RsvpStatus::Maybe => "maybe",
        }
    }
}

#[derive(Debug, Serialize, FromRow, Clone)]
pub struct Rsvp {
    pub id: String,
    pub event_id: String,
    pub guest_id: String,
    pub token: String,
    pub status: RsvpStatus,
    pub guests_count: i32,
    pub dietary_requirements: Option<String>,
    pub special_needs: Option<String>,
    pub message: Option<String>,
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Rsvp {
    pub fn new(event_id: String, guest_id: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            event_id,
            guest_id,
            token: generate_token(),
            status: RsvpStatus::Pending,
            guests_count: 1,
            dietary_requirements: None,
            special_needs: None,
            message: None,
            responded_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RSVP_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

#[derive(Debug, Serialize, FromRow, Clone)]
pub struct RsvpPlusOne {
    pub id: String,
    pub rsvp_id: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub dietary_requirements: Option<String>,
    pub age_group: Option<AgeGroup>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PlusOneInput {
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub dietary_requirements: Option<String>,
    pub age_group: Option<AgeGroup>,
}

impl RsvpPlusOne {
    pub fn from_input(rsvp_id: &str, input: PlusOneInput) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            rsvp_id: rsvp_id.to_string(),
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            dietary_requirements: input.dietary_requirements,
            age_group: input.age_group,
            created_at: Utc::now(),
        }
    }
}

/// A guest's answer, as submitted through their token link or by staff.
#[derive(Debug, Deserialize, Clone)]
pub struct RsvpResponse {
    pub status: RsvpStatus,
    pub guests_count: Option<i32>,
    pub dietary_requirements: Option<String>,
    pub special_needs: Option<String>,
    pub message: Option<String>,
    #[serde(default)]
    pub plus_ones: Vec<PlusOneInput>,
}

#[derive(Debug, Serialize, Clone)]
pub struct RsvpWithPlusOnes {
    #[serde(flatten)]
    pub rsvp: Rsvp,
    pub plus_ones: Vec<RsvpPlusOne>,
}
