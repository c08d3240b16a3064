use serde::Serialize;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, FromRow, Clone)]
pub struct EventVenue {
    pub id: String,
    pub event_id: String,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub capacity: Option<i32>,
    pub is_primary: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventVenue {
    pub fn new(event_id: String, name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            event_id,
            name,
            address: None,
            city: None,
            state: None,
            country: None,
            postal_code: None,
            latitude: None,
            longitude: None,
            capacity: None,
            is_primary: false,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Single-line address for templates and calendar entries.
    pub fn full_address(&self) -> String {
        [&self.address, &self.city, &self.state, &self.postal_code, &self.country]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    }
}
