use super::load_snapshots;
use crate::AppState;
use crate::auth::MaybeUser;
use crate::booking::datetime::format_input;
use crate::error::AppResult;
use axum::{extract::State, response::Json};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;

pub const VENUE_NAME: &str = "Anti-café \"Chill\"";

fn account_summary(auth: &MaybeUser) -> Value {
    match &auth.0 {
        Some(auth) => json!({
            "username": auth.user.username,
            "is_staff": auth.user.is_staff,
        }),
        None => Value::Null,
    }
}

pub async fn home(auth: MaybeUser) -> Json<Value> {
    Json(json!({
        "title": "Home",
        "venue": VENUE_NAME,
        "user": account_summary(&auth),
    }))
}

/// Zone catalogue with the current seat count of every zone
pub async fn zones(State(state): State<Arc<AppState>>, auth: MaybeUser) -> AppResult<Json<Value>> {
    let now = Utc::now();
    let zones: Vec<Value> = load_snapshots(&state, now)
        .await?
        .into_iter()
        .map(|(zone, snapshot)| {
            json!({
                "id": zone.id,
                "title": zone.title,
                "description": zone.description,
                "price_per_hour": zone.price_per_hour,
                "capacity": zone.capacity,
                "available_seats": snapshot.available_seats,
                "availability_status": snapshot.status,
            })
        })
        .collect();

    Ok(Json(json!({
        "title": "Our zones",
        "zones": zones,
        "user": account_summary(&auth),
    })))
}

/// Booking form context: zones, their free seats and the earliest allowed start
pub async fn booking(State(state): State<Arc<AppState>>, auth: MaybeUser) -> AppResult<Json<Value>> {
    let now = Utc::now();
    let zones: Vec<Value> = load_snapshots(&state, now)
        .await?
        .into_iter()
        .map(|(zone, snapshot)| {
            json!({
                "id": zone.id,
                "title": zone.title,
                "price_per_hour": zone.price_per_hour,
                "capacity": zone.capacity,
                "available_seats": snapshot.available_seats,
            })
        })
        .collect();

    let prefill = auth.0.as_ref().map(|auth| {
        json!({
            "name": auth.user.full_name(),
            "email": auth.user.email,
            "phone": auth.user.phone,
        })
    });

    Ok(Json(json!({
        "title": "Booking",
        "zones": zones,
        "current_time": format_input(now, state.config.venue_offset),
        "prefill": prefill,
    })))
}

pub async fn contacts() -> Json<Value> {
    Json(json!({
        "title": "Contacts",
        "form": {
            "contact_name": "",
            "contact_email": "",
            "message": "",
        },
    }))
}
