use serde::Serialize;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{types::Json, FromRow};

#[derive(Debug, Serialize, FromRow, Clone)]
pub struct Setting {
    pub key: String,
    pub value: Json<Value>,
    pub updated_by: Option<String>,
    pub updated_at: DateTime<Utc>,
}
