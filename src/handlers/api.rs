use super::load_snapshots;
use crate::AppState;
use crate::booking::availability::{self, AvailabilityStatus, ZoneSnapshot};
use crate::booking::datetime::parse_datetime;
use crate::booking::intake::BookingRejection;
use crate::db::booking::BookingRepository;
use crate::db::zone::ZoneRepository;
use crate::error::{AppError, AppResult};
use crate::models::{Booking, Zone};
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct AvailabilityOverview {
    pub zones: Vec<ZoneSnapshot>,
    pub current_time: DateTime<Utc>,
    pub success: bool,
}

/// Seat snapshot of every zone at the current moment
pub async fn availability(State(state): State<Arc<AppState>>) -> AppResult<Json<AvailabilityOverview>> {
    let now = Utc::now();
    let zones = load_snapshots(&state, now)
        .await?
        .into_iter()
        .map(|(_, snapshot)| snapshot)
        .collect();

    Ok(Json(AvailabilityOverview {
        zones,
        current_time: now,
        success: true,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct AvailabilityQuery {
    pub zone_id: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub number_of_people: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NowReport {
    pub zone_id: i32,
    pub zone_name: String,
    pub available_seats: i32,
    pub capacity: i32,
    pub status: AvailabilityStatus,
    pub message: String,
    pub current_time: DateTime<Utc>,
    pub timestamp: DateTime<Utc>,
}

impl NowReport {
    pub fn build(zone: &Zone, active: &[Booking], now: DateTime<Utc>) -> Self {
        let available_seats = availability::available_now(zone, active, now);
        let message = if available_seats == 0 {
            "Fully booked".to_string()
        } else {
            format!("{} of {} seats free", available_seats, zone.capacity)
        };
        Self {
            zone_id: zone.id,
            zone_name: zone.title.clone(),
            available_seats,
            capacity: zone.capacity,
            status: AvailabilityStatus::classify(available_seats, zone.capacity),
            message,
            current_time: now,
            timestamp: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalStatus {
    Available,
    Booked,
}

#[derive(Debug, Serialize)]
pub struct IntervalReport {
    pub zone_id: i32,
    pub zone_name: String,
    pub available: bool,
    pub available_seats: i32,
    pub requested_people: i32,
    pub capacity: i32,
    pub status: IntervalStatus,
    pub message: String,
    pub requested_start: String,
    pub requested_end: String,
    pub timestamp: DateTime<Utc>,
}

/// The window a caller asked about, both as parsed and as sent
pub struct RequestedWindow<'a> {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub raw_start: &'a str,
    pub raw_end: &'a str,
}

impl IntervalReport {
    pub fn build(
        zone: &Zone,
        bookings: &[Booking],
        window: &RequestedWindow<'_>,
        people: i32,
        now: DateTime<Utc>,
    ) -> Self {
        let available_seats = availability::available_for_interval(zone, bookings, window.start, window.end, None);
        let available = available_seats >= people;
        let message = if available {
            format!("{} seats available", available_seats)
        } else {
            format!("Not enough seats. Only {} available", available_seats)
        };
        Self {
            zone_id: zone.id,
            zone_name: zone.title.clone(),
            available,
            available_seats,
            requested_people: people,
            capacity: zone.capacity,
            status: if available { IntervalStatus::Available } else { IntervalStatus::Booked },
            message,
            requested_start: window.raw_start.to_string(),
            requested_end: window.raw_end.to_string(),
            timestamp: now,
        }
    }
}

fn parse_people(raw: Option<&str>) -> AppResult<i32> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(1),
        Some(value) => value
            .parse::<i32>()
            .ok()
            .filter(|n| *n >= 1)
            .ok_or_else(|| AppError::BadRequest("Invalid number of people".to_string())),
    }
}

/// A read-only availability query accepts any non-empty window, however short
fn check_order(start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<()> {
    if end <= start {
        return Err(AppError::BadRequest(BookingRejection::EndNotAfterStart.to_string()));
    }
    Ok(())
}

async fn check_zone(state: &AppState, zone_id: Option<&str>, query: &AvailabilityQuery) -> AppResult<serde_json::Value> {
    let zone_id = zone_id
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest("Zone ID is required".to_string()))?;
    let zone_id: i32 = zone_id
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid zone ID".to_string()))?;
    let people = parse_people(query.number_of_people.as_deref())?;

    let zone = ZoneRepository::new(state.db_pool.clone())
        .get_by_id(zone_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Zone not found".to_string()))?;
    let booking_repo = BookingRepository::new(state.db_pool.clone());
    let now = Utc::now();

    let window = match (query.start_time.as_deref(), query.end_time.as_deref()) {
        (Some(raw_start), Some(raw_end)) if !raw_start.trim().is_empty() && !raw_end.trim().is_empty() => {
            Some((raw_start, raw_end))
        }
        _ => None,
    };

    let Some((raw_start, raw_end)) = window else {
        let active = booking_repo.list_active_at(now).await?;
        return Ok(serde_json::to_value(NowReport::build(&zone, &active, now)).map_err(anyhow::Error::from)?);
    };

    let (Some(start), Some(end)) = (
        parse_datetime(raw_start, state.config.venue_offset),
        parse_datetime(raw_end, state.config.venue_offset),
    ) else {
        return Err(AppError::BadRequest("Invalid time format".to_string()));
    };
    check_order(start, end)?;

    let overlapping = booking_repo.list_overlapping(zone.id, start, end).await?;
    let window = RequestedWindow {
        start,
        end,
        raw_start,
        raw_end,
    };
    let report = IntervalReport::build(&zone, &overlapping, &window, people, now);
    tracing::debug!(
        zone_id = zone.id,
        available_seats = report.available_seats,
        requested = people,
        "Checked zone availability for interval"
    );
    Ok(serde_json::to_value(report).map_err(anyhow::Error::from)?)
}

/// `GET /api/zones/availability?zone_id=…`
pub async fn zone_availability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailabilityQuery>,
) -> AppResult<Json<serde_json::Value>> {
    check_zone(&state, query.zone_id.as_deref(), &query).await.map(Json)
}

/// `GET /api/zones/{id}/availability`
pub async fn zone_availability_by_id(
    State(state): State<Arc<AppState>>,
    Path(zone_id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> AppResult<Json<serde_json::Value>> {
    check_zone(&state, Some(&zone_id), &query).await.map(Json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookingStatus;
    use chrono::{Duration, TimeZone};

    fn zone() -> Zone {
        Zone {
            id: 2,
            title: "Game room".to_string(),
            description: String::new(),
            price_per_hour: 350,
            capacity: 4,
        }
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 21, hour, 0, 0).unwrap()
    }

    fn booking(people: i32, start: u32, end: u32) -> Booking {
        Booking {
            id: 1,
            user_id: None,
            zone_id: 2,
            customer_name: "Guest".to_string(),
            customer_phone: "+70000000000".to_string(),
            customer_email: "guest@example.com".to_string(),
            number_of_people: people,
            start_time: at(start),
            end_time: at(end),
            status: BookingStatus::Confirmed,
            created_at: at(start) - Duration::days(1),
        }
    }

    #[test]
    fn test_now_report_messages() {
        let z = zone();
        let report = NowReport::build(&z, &[booking(4, 10, 12)], at(11));
        assert_eq!(report.message, "Fully booked");
        assert_eq!(report.status, AvailabilityStatus::FullyBooked);

        let report = NowReport::build(&z, &[booking(1, 10, 12)], at(11));
        assert_eq!(report.message, "3 of 4 seats free");
        assert_eq!(report.status, AvailabilityStatus::PartiallyAvailable);
    }

    #[test]
    fn test_interval_report() {
        let z = zone();
        let existing = [booking(2, 10, 12)];
        let window = RequestedWindow {
            start: at(11),
            end: at(13),
            raw_start: "2026-10-21T14:00",
            raw_end: "2026-10-21T16:00",
        };

        let report = IntervalReport::build(&z, &existing, &window, 3, at(8));
        assert!(!report.available);
        assert_eq!(report.status, IntervalStatus::Booked);
        assert_eq!(report.message, "Not enough seats. Only 2 available");

        let report = IntervalReport::build(&z, &existing, &window, 2, at(8));
        assert!(report.available);
        assert_eq!(report.message, "2 seats available");
        assert_eq!(report.requested_start, "2026-10-21T14:00");

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "available");
    }

    #[test]
    fn test_short_window_is_answered() {
        let z = zone();
        let existing = [booking(3, 10, 12)];
        let start = at(10);
        let end = start + Duration::minutes(30);
        assert!(check_order(start, end).is_ok());

        let window = RequestedWindow {
            start,
            end,
            raw_start: "2026-10-21T13:00",
            raw_end: "2026-10-21T13:30",
        };
        let report = IntervalReport::build(&z, &existing, &window, 1, at(8));
        assert!(report.available);
        assert_eq!(report.available_seats, 1);
        assert_eq!(report.message, "1 seats available");
    }

    #[test]
    fn test_reversed_window_is_rejected() {
        assert!(check_order(at(11), at(10)).is_err());
        let err = check_order(at(10), at(10)).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "End time must be later than start time.");
    }

    #[test]
    fn test_parse_people() {
        assert_eq!(parse_people(None).unwrap(), 1);
        assert_eq!(parse_people(Some(" 3 ")).unwrap(), 3);
        assert!(parse_people(Some("0")).is_err());
        assert!(parse_people(Some("many")).is_err());
    }
}
