use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Resource name -> allowed actions. `"*"` matches any resource or action.
pub type PermissionBag = BTreeMap<String, Vec<String>>;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum RoleName {
    Admin,
    EventManager,
    EventHost,
    Guest,
    Hospitality,
    Vendor,
}

impl RoleName {
    pub const ALL: [RoleName; 6] = [
        RoleName::Admin,
        RoleName::EventManager,
        RoleName::EventHost,
        RoleName::Guest,
        RoleName::Hospitality,
        RoleName::Vendor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleName::Admin => "admin",
            RoleName::EventManager => "event_manager",
            RoleName::EventHost => "event_host",
            RoleName::Guest => "guest",
            RoleName::Hospitality => "hospitality",
            RoleName::Vendor => "vendor",
        }
    }

    /// Position in the access hierarchy. Vendors sit beside guests.
    pub fn rank(&self) -> u8 {
        match self {
            RoleName::Guest | RoleName::Vendor => 0,
            RoleName::Hospitality => 1,
            RoleName::EventHost => 2,
            RoleName::EventManager => 3,
            RoleName::Admin => 4,
        }
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoleName::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("Unknown role '{}'", s))
    }
}

#[derive(Debug, Serialize, FromRow, Clone)]
pub struct Role {
    pub id: String,
    pub name: RoleName,
    pub description: Option<String>,
    pub permissions: Json<PermissionBag>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Role {
    pub fn allows(&self, resource: &str, action: &str) -> bool {
        if self.name == RoleName::Admin {
            return true;
        }
        self.permissions.0.iter().any(|(res, actions)| {
            (res == "*" || res == resource) && actions.iter().any(|a| a == "*" || a == action)
        })
    }
}
