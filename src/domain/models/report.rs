use serde::Serialize;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use crate::domain::models::event::EventStatus;

#[derive(Debug, Default, Serialize, FromRow, Clone)]
pub struct InvitationCounts {
    pub total_invited: i64,
    pub invitations_sent: i64,
    pub confirmed: i64,
    pub checked_in: i64,
    pub checked_out: i64,
    pub vip_invited: i64,
}

#[derive(Debug, Default, FromRow, Clone)]
pub struct RsvpCounts {
    pub pending: i64,
    pub attending: i64,
    pub not_attending: i64,
    pub maybe: i64,
    pub attending_guests: i64,
    pub attending_plus_ones: i64,
    pub vip_attending: i64,
}

#[derive(Debug, Serialize, FromRow, Clone, PartialEq)]
pub struct BreakdownEntry {
    pub label: String,
    pub count: i64,
}

#[derive(Debug, Serialize, FromRow, Clone)]
pub struct GroupBreakdown {
    pub group_id: String,
    pub name: String,
    pub members: i64,
    pub attending: i64,
}

#[derive(Debug, FromRow, Clone)]
pub struct VenueRow {
    pub venue_id: String,
    pub name: String,
    pub capacity: Option<i32>,
    pub is_primary: bool,
}

/// Raw aggregates for one event, straight from the database.
#[derive(Debug, Default, Clone)]
pub struct EventStats {
    pub invitations: InvitationCounts,
    pub rsvps: RsvpCounts,
    pub age_groups: Vec<BreakdownEntry>,
    pub dietary: Vec<BreakdownEntry>,
    pub groups: Vec<GroupBreakdown>,
    pub venues: Vec<VenueRow>,
}

#[derive(Debug, Default, Serialize, Clone, PartialEq)]
pub struct RsvpSummary {
    pub pending: i64,
    pub attending: i64,
    pub not_attending: i64,
    pub maybe: i64,
    pub total: i64,
    pub responded: i64,
}

#[derive(Debug, Serialize, Clone)]
pub struct VenueCapacity {
    pub venue_id: String,
    pub name: String,
    pub capacity: Option<i32>,
    pub is_primary: bool,
    pub utilization: Option<f64>,
}

#[derive(Debug, Serialize, Clone)]
pub struct EventReport {
    pub event_id: String,
    pub event_name: String,
    pub status: EventStatus,
    pub generated_at: DateTime<Utc>,
    pub invitations: InvitationCounts,
    pub rsvps: RsvpSummary,
    pub response_rate: f64,
    pub attendance_rate: f64,
    pub confirmation_rate: f64,
    pub expected_headcount: i64,
    pub plus_ones: i64,
    pub vip_attending: i64,
    pub age_groups: Vec<BreakdownEntry>,
    pub dietary: Vec<BreakdownEntry>,
    pub groups: Vec<GroupBreakdown>,
    pub venues: Vec<VenueCapacity>,
}

#[derive(Debug, Default, Serialize, FromRow, Clone)]
pub struct EventStatusCounts {
    pub draft: i64,
    pub published: i64,
    pub cancelled: i64,
    pub completed: i64,
    pub total: i64,
}

#[derive(Debug, Serialize, FromRow, Clone)]
pub struct UpcomingEvent {
    pub id: String,
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub status: EventStatus,
    pub attending: i64,
}

/// Raw dashboard aggregates over the events visible to the caller.
#[derive(Debug, Default, Clone)]
pub struct DashboardStats {
    pub events: EventStatusCounts,
    pub upcoming: Vec<UpcomingEvent>,
    pub total_guests: i64,
    pub rsvps: RsvpCounts,
    pub deliveries: Vec<BreakdownEntry>,
}

#[derive(Debug, Serialize, Clone)]
pub struct Dashboard {
    pub events: EventStatusCounts,
    pub upcoming_events: Vec<UpcomingEvent>,
    pub total_guests: i64,
    pub rsvps: RsvpSummary,
    pub response_rate: f64,
    pub deliveries: Vec<BreakdownEntry>,
    pub generated_at: DateTime<Utc>,
}
