use super::{load_snapshots, zone_map};
use crate::AppState;
use crate::auth::StaffUser;
use crate::booking::availability;
use crate::booking::datetime::{format_local, parse_datetime};
use crate::booking::intake::{check_window, BookingRejection};
use crate::booking::{BookingView, ZoneSnapshot};
use crate::db::booking::{BookingFilter, BookingRepository};
use crate::db::contact::ContactRepository;
use crate::db::user::UserRepository;
use crate::db::zone::ZoneRepository;
use crate::error::{AppError, AppResult};
use crate::models::{Booking, BookingStatus, Zone, ZoneDraft};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::PgConnection;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct ZoneOverview {
    #[serde(flatten)]
    pub zone: Zone,
    pub current: ZoneSnapshot,
    pub booking_count: i64,
}

pub async fn list_zones(State(state): State<Arc<AppState>>, StaffUser(_): StaffUser) -> AppResult<Json<Vec<ZoneOverview>>> {
    let counts = BookingRepository::new(state.db_pool.clone()).count_by_zone().await?;
    let zones = load_snapshots(&state, Utc::now())
        .await?
        .into_iter()
        .map(|(zone, current)| ZoneOverview {
            booking_count: counts.get(&zone.id).copied().unwrap_or(0),
            zone,
            current,
        })
        .collect();
    Ok(Json(zones))
}

pub async fn create_zone(
    State(state): State<Arc<AppState>>,
    StaffUser(staff): StaffUser,
    Json(draft): Json<ZoneDraft>,
) -> AppResult<(StatusCode, Json<Zone>)> {
    draft.validate().map_err(AppError::Validation)?;
    let zone = ZoneRepository::new(state.db_pool.clone())
        .create(&draft.into_zone())
        .await?;
    tracing::info!(zone_id = zone.id, title = %zone.title, staff = %staff.username, "Zone created");
    Ok((StatusCode::CREATED, Json(zone)))
}

pub async fn update_zone(
    State(state): State<Arc<AppState>>,
    StaffUser(staff): StaffUser,
    Path(zone_id): Path<i32>,
    Json(draft): Json<ZoneDraft>,
) -> AppResult<Json<Zone>> {
    draft.validate().map_err(AppError::Validation)?;
    let mut zone = draft.into_zone();
    zone.id = zone_id;
    let zone = ZoneRepository::new(state.db_pool.clone())
        .update(&zone)
        .await?
        .ok_or_else(|| AppError::NotFound("Zone not found".to_string()))?;
    tracing::info!(zone_id = zone.id, staff = %staff.username, "Zone updated");
    Ok(Json(zone))
}

#[derive(Debug, Default, Deserialize)]
pub struct BookingQuery {
    pub status: Option<BookingStatus>,
    pub zone_id: Option<i32>,
    pub user_id: Option<i32>,
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    StaffUser(_): StaffUser,
    Query(query): Query<BookingQuery>,
) -> AppResult<Json<Vec<BookingView>>> {
    let filter = BookingFilter {
        status: query.status,
        zone_id: query.zone_id,
        user_id: query.user_id,
    };
    let bookings = BookingRepository::new(state.db_pool.clone())
        .list_filtered(filter)
        .await?;
    let zones = zone_map(&state).await?;
    let now = Utc::now();

    Ok(Json(
        bookings
            .iter()
            .map(|b| BookingView::new(b, zones.get(&b.zone_id), now, state.config.venue_offset))
            .collect(),
    ))
}

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub ids: Vec<i32>,
    pub status: BookingStatus,
}

/// Whether a change has to prove the zone still has room.
///
/// Seats are re-checked when the booking ends up holding seats and either
/// moves to a new interval or comes back from cancelled.
fn needs_seat_check(current: BookingStatus, next: BookingStatus, moved: bool) -> bool {
    next != BookingStatus::Cancelled && (moved || current == BookingStatus::Cancelled)
}

/// Refuse with 409 when `people` no longer fit into `[start, end)`, ignoring the booking itself
fn check_seats(
    zone: &Zone,
    overlapping: &[Booking],
    booking_id: i32,
    people: i32,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    venue_offset: FixedOffset,
) -> AppResult<()> {
    if availability::fits(zone, overlapping, start, end, people, Some(booking_id)) {
        return Ok(());
    }
    let rejection = BookingRejection::NotEnoughSeats {
        zone: zone.title.clone(),
        start: format_local(start, venue_offset),
        people,
        available: availability::available_for_interval(zone, overlapping, start, end, Some(booking_id)),
    };
    Err(AppError::Conflict(format!("Booking #{}: {}", booking_id, rejection)))
}

/// Lock the booking's zone and make sure the interval still has room for it
async fn ensure_fits(
    conn: &mut PgConnection,
    booking: &Booking,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    state: &AppState,
) -> AppResult<()> {
    let zone_repo = ZoneRepository::new(state.db_pool.clone());
    let booking_repo = BookingRepository::new(state.db_pool.clone());

    let zone = zone_repo
        .lock_in(&mut *conn, booking.zone_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Zone not found".to_string()))?;
    let overlapping = booking_repo.list_overlapping_in(&mut *conn, zone.id, start, end).await?;

    check_seats(
        &zone,
        &overlapping,
        booking.id,
        booking.number_of_people,
        start,
        end,
        state.config.venue_offset,
    )
}

/// Bulk status change from the staff console.
///
/// Moving a cancelled booking back to a seat-holding status re-checks the
/// zone, since its seats may have been taken in the meantime.
pub async fn change_booking_status(
    State(state): State<Arc<AppState>>,
    StaffUser(staff): StaffUser,
    Json(change): Json<StatusChange>,
) -> AppResult<Json<Value>> {
    if change.ids.is_empty() {
        return Err(AppError::BadRequest("No bookings selected".to_string()));
    }

    let booking_repo = BookingRepository::new(state.db_pool.clone());
    let mut tx = state.db_pool.begin().await?;
    let mut updated = 0;

    for &id in &change.ids {
        let Some(booking) = booking_repo.get_by_id_in(&mut *tx, id).await? else {
            tracing::debug!(booking_id = id, "Skipping unknown booking");
            continue;
        };
        if needs_seat_check(booking.status, change.status, false) {
            ensure_fits(&mut *tx, &booking, booking.start_time, booking.end_time, &state).await?;
        }
        updated += booking_repo.update_status_in(&mut *tx, &[id], change.status).await?;
    }

    tx.commit().await?;
    tracing::info!(updated, status = %change.status, staff = %staff.username, "Booking statuses changed");

    Ok(Json(json!({
        "updated": updated,
        "status": change.status,
        "message": format!("{} bookings marked as {}", updated, change.status),
    })))
}

#[derive(Debug, Deserialize)]
pub struct ScheduleChange {
    pub start_time: String,
    pub end_time: String,
}

/// Move a booking to a new interval, keeping it within the zone's capacity
pub async fn reschedule_booking(
    State(state): State<Arc<AppState>>,
    StaffUser(staff): StaffUser,
    Path(booking_id): Path<i32>,
    Json(change): Json<ScheduleChange>,
) -> AppResult<Json<BookingView>> {
    let offset = state.config.venue_offset;
    let (Some(start), Some(end)) = (
        parse_datetime(&change.start_time, offset),
        parse_datetime(&change.end_time, offset),
    ) else {
        return Err(AppError::BadRequest(BookingRejection::InvalidDateTime.to_string()));
    };
    check_window(start, end).map_err(|rejection| AppError::Validation(rejection.to_string()))?;

    let booking_repo = BookingRepository::new(state.db_pool.clone());
    let mut tx = state.db_pool.begin().await?;

    let booking = booking_repo
        .get_by_id_in(&mut *tx, booking_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;
    if needs_seat_check(booking.status, booking.status, true) {
        ensure_fits(&mut *tx, &booking, start, end, &state).await?;
    }
    let booking = booking_repo.update_schedule_in(&mut *tx, booking.id, start, end).await?;
    tx.commit().await?;

    tracing::info!(booking_id = booking.id, staff = %staff.username, "Booking rescheduled");
    let zone = ZoneRepository::new(state.db_pool.clone()).get_by_id(booking.zone_id).await?;
    Ok(Json(BookingView::new(&booking, zone.as_ref(), Utc::now(), offset)))
}

#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    pub processed: Option<bool>,
}

pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    StaffUser(_): StaffUser,
    Query(query): Query<MessageQuery>,
) -> AppResult<Json<Vec<Value>>> {
    let messages = ContactRepository::new(state.db_pool.clone())
        .list(query.processed)
        .await?;
    Ok(Json(
        messages
            .iter()
            .map(|m| {
                json!({
                    "id": m.id,
                    "name": m.name,
                    "email": m.email,
                    "message": m.message,
                    "preview": m.preview(),
                    "created_at": m.created_at,
                    "is_processed": m.is_processed,
                })
            })
            .collect(),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ProcessedChange {
    pub ids: Vec<i32>,
    pub is_processed: bool,
}

pub async fn mark_messages(
    State(state): State<Arc<AppState>>,
    StaffUser(staff): StaffUser,
    Json(change): Json<ProcessedChange>,
) -> AppResult<Json<Value>> {
    if change.ids.is_empty() {
        return Err(AppError::BadRequest("No messages selected".to_string()));
    }
    let updated = ContactRepository::new(state.db_pool.clone())
        .set_processed(&change.ids, change.is_processed)
        .await?;
    tracing::info!(updated, is_processed = change.is_processed, staff = %staff.username, "Contact messages updated");

    let label = if change.is_processed { "processed" } else { "unprocessed" };
    Ok(Json(json!({
        "updated": updated,
        "message": format!("{} messages marked as {}", updated, label),
    })))
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub phone: String,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
    pub booking_count: i64,
}

pub async fn list_users(State(state): State<Arc<AppState>>, StaffUser(_): StaffUser) -> AppResult<Json<Vec<UserSummary>>> {
    let users = UserRepository::new(state.db_pool.clone()).get_all().await?;
    let counts = BookingRepository::new(state.db_pool.clone()).count_by_user().await?;

    Ok(Json(
        users
            .into_iter()
            .map(|user| UserSummary {
                id: user.id,
                full_name: user.full_name(),
                booking_count: counts.get(&user.id).copied().unwrap_or(0),
                username: user.username,
                email: user.email,
                phone: user.phone,
                is_staff: user.is_staff,
                created_at: user.created_at,
            })
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn zone() -> Zone {
        Zone {
            id: 3,
            title: "Quiet room".to_string(),
            description: String::new(),
            price_per_hour: 350,
            capacity: 4,
        }
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 22, hour, 0, 0).unwrap()
    }

    fn booking(id: i32, people: i32, start: u32, end: u32, status: BookingStatus) -> Booking {
        Booking {
            id,
            user_id: None,
            zone_id: 3,
            customer_name: "Guest".to_string(),
            customer_phone: "+70000000000".to_string(),
            customer_email: "guest@example.com".to_string(),
            number_of_people: people,
            start_time: at(start),
            end_time: at(end),
            status,
            created_at: at(start) - Duration::days(1),
        }
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_needs_seat_check_for_status_changes() {
        use BookingStatus::*;
        assert!(needs_seat_check(Cancelled, Confirmed, false));
        assert!(needs_seat_check(Cancelled, Pending, false));
        assert!(needs_seat_check(Cancelled, Completed, false));
        assert!(!needs_seat_check(Cancelled, Cancelled, false));
        assert!(!needs_seat_check(Confirmed, Cancelled, false));
        assert!(!needs_seat_check(Pending, Confirmed, false));
        assert!(!needs_seat_check(Confirmed, Completed, false));
    }

    #[test]
    fn test_needs_seat_check_for_reschedule() {
        assert!(needs_seat_check(BookingStatus::Confirmed, BookingStatus::Confirmed, true));
        assert!(needs_seat_check(BookingStatus::Pending, BookingStatus::Pending, true));
        assert!(!needs_seat_check(BookingStatus::Cancelled, BookingStatus::Cancelled, true));
    }

    #[test]
    fn test_reactivation_refused_when_seats_are_gone() {
        let z = zone();
        let cancelled = booking(1, 2, 10, 12, BookingStatus::Cancelled);
        let taken = booking(2, 3, 11, 13, BookingStatus::Confirmed);
        let overlapping = [taken];

        let err = check_seats(&z, &overlapping, cancelled.id, 2, at(10), at(12), utc()).unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert!(err.public_message().starts_with("Booking #1: Not enough free seats"));

        assert!(check_seats(&z, &overlapping, cancelled.id, 1, at(10), at(12), utc()).is_ok());
    }

    #[test]
    fn test_reschedule_does_not_count_the_booking_itself() {
        let z = zone();
        let own = booking(5, 4, 10, 12, BookingStatus::Confirmed);
        let overlapping = [own.clone()];

        // Shifting a full-zone booking by an hour only overlaps its own old slot
        assert!(check_seats(&z, &overlapping, own.id, 4, at(11), at(13), utc()).is_ok());

        let other = booking(6, 1, 12, 13, BookingStatus::Pending);
        let overlapping = [own.clone(), other];
        let err = check_seats(&z, &overlapping, own.id, 4, at(11), at(13), utc()).unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }
}
