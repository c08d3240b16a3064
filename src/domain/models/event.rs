use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum EventType {
    Wedding,
    Corporate,
    Birthday,
    Other,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum EventStatus {
    Draft,
    Published,
    Cancelled,
    Completed,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "draft",
            EventStatus::Published => "published",
            EventStatus::Cancelled => "cancelled",
            EventStatus::Completed => "completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, EventStatus::Cancelled | EventStatus::Completed)
    }

    pub fn can_transition_to(&self, next: EventStatus) -> bool {
        use EventStatus::*;
        matches!(
            (self, next),
            (Draft, Published) | (Draft, Cancelled) | (Published, Cancelled) | (Published, Completed)
        )
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceFrequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RecurrenceRule {
    pub frequency: RecurrenceFrequency,
    #[serde(default = "default_interval")]
    pub interval: u32,
    pub until: Option<DateTime<Utc>>,
}

fn default_interval() -> u32 {
    1
}

#[derive(Debug, Serialize, FromRow, Clone)]
pub struct Event {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub event_type: EventType,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub timezone: String,
    pub status: EventStatus,
    pub is_recurring: bool,
    pub recurrence_rule: Option<Json<RecurrenceRule>>,
    pub is_private: bool,
    pub rsvp_deadline: Option<DateTime<Utc>>,
    pub allow_plus_ones: bool,
    pub max_plus_ones: i32,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn rsvp_closed(&self, now: DateTime<Utc>) -> bool {
        self.status.is_terminal() || self.rsvp_deadline.is_some_and(|deadline| now > deadline)
    }
}

/// Which events a caller can see; listings, dashboards and single reads all filter through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventScope<'a> {
    All,
    /// Every event not marked private.
    Shared,
    Owner(&'a str),
}

impl<'a> EventScope<'a> {
    /// Discriminator bound into scoped SQL as `?1`.
    pub fn kind(&self) -> &'static str {
        match self {
            EventScope::All => "all",
            EventScope::Shared => "shared",
            EventScope::Owner(_) => "owner",
        }
    }

    /// Owner id bound into scoped SQL as `?2`.
    pub fn owner(&self) -> Option<&'a str> {
        match self {
            EventScope::Owner(id) => Some(*id),
            _ => None,
        }
    }

    pub fn includes(&self, event: &Event) -> bool {
        match self {
            EventScope::All => true,
            EventScope::Shared => !event.is_private,
            EventScope::Owner(id) => event.created_by == *id,
        }
    }
}
