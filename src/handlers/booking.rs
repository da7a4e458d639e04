use super::Flash;
use crate::AppState;
use crate::auth::MaybeUser;
use crate::booking::datetime::{format_local, format_local_time};
use crate::booking::intake;
use crate::booking::{BookingForm, BookingRejection, BookingView, IntakeContext};
use crate::db::booking::BookingRepository;
use crate::db::zone::ZoneRepository;
use crate::models::{Booking, Zone};
use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::Response,
    Form,
};
use chrono::Utc;
use std::sync::Arc;

/// Handle a reservation form submission.
///
/// Rejections come back as 422 with the reason; anything unexpected is
/// logged and reported with a generic message.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    MaybeUser(auth): MaybeUser,
    Form(form): Form<BookingForm>,
) -> Response {
    tracing::info!(
        zone = ?form.zone,
        people = ?form.number_of_people,
        user = ?auth.as_ref().map(|a| &a.user.username),
        "Received booking request"
    );

    let user_id = auth.as_ref().map(|a| a.user.id);
    match create_booking(&state, user_id, &form).await {
        Ok(Ok((booking, zone))) => {
            tracing::info!(
                booking_id = booking.id,
                zone_id = zone.id,
                people = booking.number_of_people,
                user_id = ?booking.user_id,
                "Booking created"
            );
            let offset = state.config.venue_offset;
            let view = BookingView::new(&booking, Some(&zone), Utc::now(), offset);
            let message = format!(
                "Booking created! Zone: {}. People: {}. Time: {} - {}. Price: {}. The booking was confirmed automatically.",
                zone.title,
                booking.number_of_people,
                format_local(booking.start_time, offset),
                format_local_time(booking.end_time, offset),
                booking.total_price(zone.price_per_hour),
            );
            match serde_json::to_value(view) {
                Ok(data) => Flash::success(message)
                    .redirect_to("/booking")
                    .with_data(data)
                    .respond(StatusCode::CREATED),
                Err(e) => {
                    tracing::error!("Failed to serialize booking {}: {}", booking.id, e);
                    Flash::success(message).redirect_to("/booking").respond(StatusCode::CREATED)
                }
            }
        }
        Ok(Err(rejection)) => {
            tracing::info!(reason = %rejection, "Booking rejected");
            Flash::error(rejection.to_string()).respond(StatusCode::UNPROCESSABLE_ENTITY)
        }
        Err(e) => {
            tracing::error!("Booking failed: {:#}", e);
            Flash::error("An error occurred while booking. Please try again later.")
                .respond(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Validate and insert in one transaction.
///
/// The zone row stays locked from the availability check until commit, so two
/// requests for the same zone cannot both claim the last seats.
async fn create_booking(
    state: &AppState,
    user_id: Option<i32>,
    form: &BookingForm,
) -> anyhow::Result<Result<(Booking, Zone), BookingRejection>> {
    let zone_repo = ZoneRepository::new(state.db_pool.clone());
    let booking_repo = BookingRepository::new(state.db_pool.clone());

    let mut tx = state.db_pool.begin().await.context("Failed to open transaction")?;
    let now = Utc::now();

    let zone = match form.zone_id() {
        Some(id) => zone_repo.lock_in(&mut *tx, id).await?,
        None => None,
    };
    let existing = match &zone {
        Some(zone) => booking_repo.list_upcoming_in(&mut *tx, zone.id, now).await?,
        None => Vec::new(),
    };

    let ctx = IntakeContext {
        zone: zone.as_ref(),
        existing: &existing,
        user_id,
        now,
        venue_offset: state.config.venue_offset,
    };
    let new_booking = match intake::validate(form, &ctx) {
        Ok(new_booking) => new_booking,
        Err(rejection) => {
            tx.rollback().await?;
            return Ok(Err(rejection));
        }
    };

    let booking = booking_repo.create_in(&mut *tx, &new_booking).await?;
    tx.commit().await.context("Failed to commit booking")?;

    let zone = zone.context("accepted booking without a zone")?;
    Ok(Ok((booking, zone)))
}
