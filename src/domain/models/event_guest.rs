use serde::Serialize;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;
use crate::domain::models::{guest::AgeGroup, rsvp::RsvpStatus};

#[derive(Debug, Serialize, FromRow, Clone)]
pub struct EventGuest {
    pub id: String,
    pub event_id: String,
    pub guest_id: String,
    pub invitation_sent: bool,
    pub invitation_sent_at: Option<DateTime<Utc>>,
    pub confirmed: bool,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub table_number: Option<String>,
    pub seat_number: Option<String>,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub checked_out_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventGuest {
    pub fn new(event_id: String, guest_id: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            event_id,
            guest_id,
            invitation_sent: false,
            invitation_sent_at: None,
            confirmed: false,
            confirmed_at: None,
            table_number: None,
            seat_number: None,
            checked_in_at: None,
            checked_out_at: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Guest list row: invitation record joined with the guest and their RSVP status.
#[derive(Debug, Serialize, FromRow, Clone)]
pub struct EventGuestView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub event_guest: EventGuest,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_vip: bool,
    pub age_group: Option<AgeGroup>,
    pub rsvp_status: Option<RsvpStatus>,
}
