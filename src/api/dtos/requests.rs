use crate::domain::models::{
    event::{EventStatus, EventType, RecurrenceRule},
    guest::{AgeGroup, CustomFields},
    notification::{Channel, DeliveryStatus},
    role::{PermissionBag, RoleName},
    rsvp::RsvpStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Tells an absent field (`None`) apart from an explicit `null` (`Some(None)`).
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// Auth

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// `login` accepts either the username or the email address.
#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "username", alias = "email")]
    pub login: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

// Users & roles

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub roles: Option<Vec<RoleName>>,
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Deserialize)]
pub struct SetRolesRequest {
    pub roles: Vec<RoleName>,
}

#[derive(Deserialize)]
pub struct UpdatePermissionsRequest {
    pub permissions: PermissionBag,
}

// Events & venues

#[derive(Deserialize)]
pub struct CreateEventRequest {
    pub name: String,
    pub description: Option<String>,
    pub event_type: Option<EventType>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub timezone: Option<String>,
    pub is_recurring: Option<bool>,
    pub recurrence_rule: Option<RecurrenceRule>,
    pub is_private: Option<bool>,
    pub rsvp_deadline: Option<DateTime<Utc>>,
    pub allow_plus_ones: Option<bool>,
    pub max_plus_ones: Option<i32>,
}

#[derive(Deserialize)]
pub struct UpdateEventRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub event_type: Option<EventType>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub timezone: Option<String>,
    pub is_recurring: Option<bool>,
    pub recurrence_rule: Option<RecurrenceRule>,
    pub is_private: Option<bool>,
    /// `null` clears the deadline.
    #[serde(default, deserialize_with = "nullable")]
    pub rsvp_deadline: Option<Option<DateTime<Utc>>>,
    pub allow_plus_ones: Option<bool>,
    pub max_plus_ones: Option<i32>,
}

#[derive(Deserialize)]
pub struct EventStatusRequest {
    pub status: EventStatus,
}

#[derive(Deserialize)]
pub struct CreateVenueRequest {
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub capacity: Option<i32>,
    pub is_primary: Option<bool>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateVenueRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub capacity: Option<i32>,
    pub is_primary: Option<bool>,
    pub notes: Option<String>,
}

// Guests

#[derive(Deserialize)]
pub struct CreateGuestRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub age_group: Option<AgeGroup>,
    pub is_vip: Option<bool>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
    pub custom_fields: Option<CustomFields>,
}

#[derive(Deserialize)]
pub struct UpdateGuestRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub age_group: Option<AgeGroup>,
    pub is_vip: Option<bool>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
    pub custom_fields: Option<CustomFields>,
}

#[derive(Deserialize)]
pub struct InviteGuestRequest {
    pub guest_id: String,
    pub table_number: Option<String>,
    pub seat_number: Option<String>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct SeatingRequest {
    pub table_number: Option<String>,
    pub seat_number: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateGroupRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct AddMemberRequest {
    pub guest_id: String,
}

// RSVPs

#[derive(Deserialize)]
pub struct CreateRsvpRequest {
    pub guest_id: String,
}

/// Staff edits bypass the deadline; the attendance rules still apply.
#[derive(Deserialize)]
pub struct UpdateRsvpRequest {
    pub status: Option<RsvpStatus>,
    pub guests_count: Option<i32>,
    pub dietary_requirements: Option<String>,
    pub special_needs: Option<String>,
    pub message: Option<String>,
}

// Notifications

#[derive(Deserialize)]
pub struct CreateTemplateRequest {
    pub name: String,
    pub channel: Option<Channel>,
    pub subject: String,
    pub body: String,
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateTemplateRequest {
    pub name: Option<String>,
    pub channel: Option<Channel>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub description: Option<String>,
}

/// Subject, body and channel default to the template's when `template_id` is given.
#[derive(Deserialize)]
pub struct CreateNotificationRequest {
    pub event_id: Option<String>,
    pub template_id: Option<String>,
    pub channel: Option<Channel>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub guest_ids: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct NotificationListQuery {
    pub event_id: Option<String>,
}

#[derive(Deserialize)]
pub struct SendNotificationQuery {
    pub scheduled_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct RecipientStatusRequest {
    pub status: DeliveryStatus,
    pub error_message: Option<String>,
}

// Settings

#[derive(Deserialize)]
pub struct SettingValueRequest {
    pub value: Value,
}
