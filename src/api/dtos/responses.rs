use crate::domain::models::{
    event::{Event, EventStatus, EventType},
    group::GuestGroup,
    guest::Guest,
    rsvp::RsvpWithPlusOnes,
    venue::EventVenue,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[derive(Serialize)]
pub struct EventDetailResponse {
    #[serde(flatten)]
    pub event: Event,
    pub venues: Vec<EventVenue>,
}

#[derive(Serialize)]
pub struct GroupDetailResponse {
    #[serde(flatten)]
    pub group: GuestGroup,
    pub members: Vec<Guest>,
}

/// What a guest sees behind their RSVP link: no organizer-only fields.
#[derive(Serialize)]
pub struct PublicEventView {
    pub name: String,
    pub description: Option<String>,
    pub event_type: EventType,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub timezone: String,
    pub status: EventStatus,
    pub rsvp_deadline: Option<DateTime<Utc>>,
    pub allow_plus_ones: bool,
    pub max_plus_ones: i32,
}

impl From<&Event> for PublicEventView {
    fn from(e: &Event) -> Self {
        Self {
            name: e.name.clone(),
            description: e.description.clone(),
            event_type: e.event_type,
            start_date: e.start_date,
            end_date: e.end_date,
            timezone: e.timezone.clone(),
            status: e.status,
            rsvp_deadline: e.rsvp_deadline,
            allow_plus_ones: e.allow_plus_ones,
            max_plus_ones: e.max_plus_ones,
        }
    }
}

#[derive(Serialize)]
pub struct PublicRsvpResponse {
    pub rsvp: RsvpWithPlusOnes,
    pub guest_first_name: String,
    pub guest_last_name: String,
    pub event: PublicEventView,
    pub venue: Option<EventVenue>,
    pub open: bool,
}
