pub mod account;
pub mod api;
pub mod booking;
pub mod contacts;
pub mod pages;
pub mod staff;

use crate::AppState;
use crate::booking::ZoneSnapshot;
use crate::db::booking::BookingRepository;
use crate::db::zone::ZoneRepository;
use crate::models::Zone;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Error,
}

/// Result of a form submission: the message a page would flash, plus where to go next
#[derive(Debug, Clone, Serialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Flash {
    fn new(level: FlashLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            errors: Vec::new(),
            redirect: None,
            data: None,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Info, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Error, message)
    }

    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = errors;
        self
    }

    pub fn redirect_to(mut self, path: impl Into<String>) -> Self {
        self.redirect = Some(path.into());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn respond(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

/// Every zone with its seat snapshot at `now`
pub async fn load_snapshots(state: &AppState, now: DateTime<Utc>) -> Result<Vec<(Zone, ZoneSnapshot)>, sqlx::Error> {
    let zone_repo = ZoneRepository::new(state.db_pool.clone());
    let booking_repo = BookingRepository::new(state.db_pool.clone());

    let zones = zone_repo.get_all().await?;
    let active = booking_repo.list_active_at(now).await?;

    Ok(zones
        .into_iter()
        .map(|zone| {
            let snapshot = ZoneSnapshot::take(&zone, &active, now);
            (zone, snapshot)
        })
        .collect())
}

/// All zones keyed by id
pub async fn zone_map(state: &AppState) -> Result<HashMap<i32, Zone>, sqlx::Error> {
    let zones = ZoneRepository::new(state.db_pool.clone()).get_all().await?;
    Ok(zones.into_iter().map(|z| (z.id, z)).collect())
}
