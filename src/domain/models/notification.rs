use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Sms,
    Whatsapp,
    Push,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Sms => "sms",
            Channel::Whatsapp => "whatsapp",
            Channel::Push => "push",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum NotificationStatus {
    Draft,
    Scheduled,
    Sending,
    Sent,
    Failed,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Draft => "draft",
            NotificationStatus::Scheduled => "scheduled",
            NotificationStatus::Sending => "sending",
            NotificationStatus::Sent => "sent",
            NotificationStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Sending,
    Sent,
    Delivered,
    Read,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Sending => "sending",
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Read => "read",
            DeliveryStatus::Failed => "failed",
        }
    }

    /// Forward-only delivery progress; `failed` may be retried from `pending`.
    pub fn can_transition_to(&self, next: DeliveryStatus) -> bool {
        use DeliveryStatus::*;
        matches!(
            (self, next),
            (Pending, Sending)
                | (Sending, Sent)
                | (Sent, Delivered)
                | (Delivered, Read)
                | (Pending, Failed)
                | (Sending, Failed)
                | (Sent, Failed)
                | (Failed, Pending)
        )
    }
}

#[derive(Debug, Serialize, FromRow, Clone)]
pub struct NotificationTemplate {
    pub id: String,
    pub name: String,
    pub channel: Channel,
    pub subject: String,
    pub body: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NotificationTemplate {
    pub fn new(name: String, channel: Channel, subject: String, body: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            channel,
            subject,
            body,
            description: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Serialize, FromRow, Clone)]
pub struct Notification {
    pub id: String,
    pub event_id: Option<String>,
    pub template_id: Option<String>,
    pub channel: Channel,
    pub subject: String,
    pub body: String,
    pub status: NotificationStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(event_id: Option<String>, channel: Channel, subject: String, body: String, created_by: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            event_id,
            template_id: None,
            channel,
            subject,
            body,
            status: NotificationStatus::Draft,
            scheduled_at: None,
            sent_at: None,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Serialize, FromRow, Clone)]
pub struct NotificationRecipient {
    pub id: String,
    pub notification_id: String,
    pub guest_id: Option<String>,
    pub address: String,
    pub status: DeliveryStatus,
    pub error_message: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NotificationRecipient {
    pub fn new(notification_id: String, guest_id: Option<String>, address: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            notification_id,
            guest_id,
            address,
            status: DeliveryStatus::Pending,
            error_message: None,
            sent_at: None,
            delivered_at: None,
            read_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct NotificationDetail {
    #[serde(flatten)]
    pub notification: Notification,
    pub recipients: Vec<NotificationRecipient>,
}
