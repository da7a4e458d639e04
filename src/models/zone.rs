use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Zone {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub price_per_hour: i32,
    pub capacity: i32,
}

impl Zone {
    pub fn new(title: String, description: String, price_per_hour: i32, capacity: i32) -> Self {
        Self {
            id: 0, // Will be set by database
            title,
            description,
            price_per_hour,
            capacity,
        }
    }
}

/// Editable zone fields as submitted by staff
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price_per_hour: i32,
    pub capacity: i32,
}

impl ZoneDraft {
    /// Check the draft against the zone invariants, returning the first problem found
    pub fn validate(&self) -> Result<(), String> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err("Zone title is required.".to_string());
        }
        if title.chars().count() > 200 {
            return Err("Zone title must be at most 200 characters.".to_string());
        }
        if self.capacity <= 0 {
            return Err("Capacity must be a positive number of seats.".to_string());
        }
        if self.price_per_hour < 0 {
            return Err("Price per hour cannot be negative.".to_string());
        }
        Ok(())
    }

    pub fn into_zone(self) -> Zone {
        Zone::new(
            self.title.trim().to_string(),
            self.description,
            self.price_per_hour,
            self.capacity,
        )
    }
}
