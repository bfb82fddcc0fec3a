use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct Trainer {
    pub id: String,
    pub name: String,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Trainer {
    pub fn new(name: String, bio: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            bio,
            created_at: Utc::now(),
        }
    }
}
