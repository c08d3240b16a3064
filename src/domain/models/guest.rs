use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow};
use std::collections::BTreeMap;
use uuid::Uuid;

pub type CustomFields = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum AgeGroup {
    Child,
    Teen,
    Adult,
    Senior,
}

impl AgeGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::Child => "child",
            AgeGroup::Teen => "teen",
            AgeGroup::Adult => "adult",
            AgeGroup::Senior => "senior",
        }
    }
}

/// `tags` and `custom_fields` are JSON text columns; `Json` is the only place they are (de)serialized.
#[derive(Debug, Serialize, FromRow, Clone)]
pub struct Guest {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub age_group: Option<AgeGroup>,
    pub is_vip: bool,
    pub notes: Option<String>,
    pub tags: Json<Vec<String>>,
    pub custom_fields: Json<CustomFields>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Guest {
    pub fn new(first_name: String, last_name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            first_name,
            last_name,
            email: None,
            phone: None,
            address: None,
            city: None,
            country: None,
            age_group: None,
            is_vip: false,
            notes: None,
            tags: Json(Vec::new()),
            custom_fields: Json(CustomFields::new()),
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct GuestFilter {
    pub search: Option<String>,
    pub tag: Option<String>,
    pub vip: Option<bool>,
}
