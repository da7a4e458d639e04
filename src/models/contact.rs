use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

const PREVIEW_CHARS: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContactMessage {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub is_processed: bool,
}

impl ContactMessage {
    pub fn new(name: String, email: String, message: String) -> Self {
        Self {
            id: 0, // Will be set by database
            name,
            email,
            message,
            created_at: Utc::now(),
            is_processed: false,
        }
    }

    /// First characters of the message for list views
    pub fn preview(&self) -> String {
        if self.message.chars().count() > PREVIEW_CHARS {
            let head: String = self.message.chars().take(PREVIEW_CHARS).collect();
            format!("{}...", head)
        } else {
            self.message.clone()
        }
    }
}
