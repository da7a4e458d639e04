use super::{zone_map, Flash};
use crate::AppState;
use crate::auth::{self, cookie, password, CurrentUser, MaybeUser};
use crate::booking::BookingView;
use crate::db::booking::BookingRepository;
use crate::db::session::SessionRepository;
use crate::db::user::UserRepository;
use crate::error::{AppError, AppResult};
use crate::forms::{LoginForm, ProfileForm, RegistrationForm};
use crate::models::{Booking, User};
use anyhow::Context;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    Form,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

const RECENT_BOOKINGS: i64 = 5;
const INVALID_LOGIN: &str = "Invalid username or password";

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Only local paths are accepted as post-login targets
fn safe_redirect(next: Option<&str>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => path.to_string(),
        _ => "/profile".to_string(),
    }
}

async fn hash_off_thread(password: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .context("password hashing task failed")?
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))
}

async fn verify_off_thread(password: String, hash: String) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
        .await
        .context("password verification task failed")
}

fn signed_in(status: StatusCode, cookie: String, flash: Flash) -> Response {
    (status, [(header::SET_COOKIE, cookie)], Json(flash)).into_response()
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    MaybeUser(auth): MaybeUser,
    Form(form): Form<RegistrationForm>,
) -> AppResult<Response> {
    if auth.is_some() {
        return Ok(Flash::info("You are already signed in.").redirect_to("/profile").respond(StatusCode::OK));
    }

    if let Err(errors) = form.validate() {
        let errors = errors.iter().map(ToString::to_string).collect();
        return Ok(Flash::error("Please correct the errors below.")
            .with_errors(errors)
            .respond(StatusCode::UNPROCESSABLE_ENTITY));
    }

    let user_repo = UserRepository::new(state.db_pool.clone());
    let username = form.username.trim().to_string();
    if user_repo.exists(&username).await? {
        return Ok(Flash::error("Please correct the errors below.")
            .with_errors(vec![
                "Error in field \"username\": A user with that username already exists.".to_string(),
            ])
            .respond(StatusCode::UNPROCESSABLE_ENTITY));
    }

    let password_hash = hash_off_thread(form.password1.clone()).await?;
    let mut user = User::new(
        username,
        form.email.trim().to_string(),
        form.first_name.trim().to_string(),
        form.last_name.trim().to_string(),
        form.phone.trim().to_string(),
        password_hash,
    );
    user.is_staff = state.staff_usernames.iter().any(|name| *name == user.username);

    let user = match user_repo.create(&user).await {
        Ok(user) => user,
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Ok(Flash::error("Please correct the errors below.")
                .with_errors(vec![
                    "Error in field \"username\": A user with that username already exists.".to_string(),
                ])
                .respond(StatusCode::UNPROCESSABLE_ENTITY));
        }
        Err(e) => return Err(e.into()),
    };
    tracing::info!(user_id = user.id, username = %user.username, is_staff = user.is_staff, "Registered new user");

    let (_, cookie) = auth::start_session(&state, &user).await?;
    let flash = Flash::success(format!("Welcome, {}! Registration was successful.", user.username))
        .redirect_to("/profile");
    Ok(signed_in(StatusCode::CREATED, cookie, flash))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    MaybeUser(auth): MaybeUser,
    Query(query): Query<NextQuery>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    if auth.is_some() {
        return Ok(Flash::info("You are already signed in.").redirect_to("/profile").respond(StatusCode::OK));
    }

    let login = form.username.trim();
    if login.is_empty() || form.password.is_empty() {
        return Ok(Flash::error(INVALID_LOGIN).respond(StatusCode::UNAUTHORIZED));
    }

    let user_repo = UserRepository::new(state.db_pool.clone());
    let Some(user) = user_repo.get_by_login(login).await? else {
        tracing::info!(login = %login, "Login attempt for unknown user");
        return Ok(Flash::error(INVALID_LOGIN).respond(StatusCode::UNAUTHORIZED));
    };

    if !verify_off_thread(form.password.clone(), user.password_hash.clone()).await? {
        tracing::info!(user_id = user.id, "Login attempt with wrong password");
        return Ok(Flash::error(INVALID_LOGIN).respond(StatusCode::UNAUTHORIZED));
    }

    let (_, cookie) = auth::start_session(&state, &user).await?;
    tracing::info!(user_id = user.id, username = %user.username, "User signed in");
    let flash = Flash::success(format!("Welcome, {}!", user.username))
        .redirect_to(safe_redirect(query.next.as_deref()));
    Ok(signed_in(StatusCode::OK, cookie, flash))
}

pub async fn logout(State(state): State<Arc<AppState>>, MaybeUser(auth): MaybeUser) -> AppResult<Response> {
    if let Some(auth) = auth {
        SessionRepository::new(state.db_pool.clone()).delete(&auth.session_id).await?;
        tracing::info!(user_id = auth.user.id, "User signed out");
    }
    let flash = Flash::info("You have been signed out.").redirect_to("/");
    Ok(signed_in(StatusCode::OK, cookie::clear_session_cookie(), flash))
}

async fn booking_views(state: &AppState, bookings: &[Booking]) -> AppResult<Vec<BookingView>> {
    let zones = zone_map(state).await?;
    let now = Utc::now();
    Ok(bookings
        .iter()
        .map(|b| BookingView::new(b, zones.get(&b.zone_id), now, state.config.venue_offset))
        .collect())
}

/// Personal account page: details, recent bookings and their total count
pub async fn profile(State(state): State<Arc<AppState>>, CurrentUser(auth): CurrentUser) -> AppResult<Json<Value>> {
    let booking_repo = BookingRepository::new(state.db_pool.clone());
    let recent = booking_repo.list_for_user(auth.user.id, Some(RECENT_BOOKINGS)).await?;
    let total = booking_repo.count_for_user(auth.user.id).await?;
    let bookings = booking_views(&state, &recent).await?;

    Ok(Json(json!({
        "title": "Personal account",
        "user": auth.user,
        "bookings": bookings,
        "total_bookings": total,
    })))
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    CurrentUser(auth): CurrentUser,
    Form(form): Form<ProfileForm>,
) -> AppResult<Response> {
    let Some(phone) = form.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) else {
        return Ok(Flash::info("Nothing to update.").redirect_to("/profile").respond(StatusCode::OK));
    };
    if phone.chars().count() > 20 {
        return Err(AppError::Validation("Phone number must be at most 20 characters.".to_string()));
    }

    UserRepository::new(state.db_pool.clone())
        .update_phone(auth.user.id, phone)
        .await?;
    tracing::info!(user_id = auth.user.id, "Profile updated");
    Ok(Flash::success("Profile updated successfully.").redirect_to("/profile").respond(StatusCode::OK))
}

pub async fn booking_history(
    State(state): State<Arc<AppState>>,
    CurrentUser(auth): CurrentUser,
) -> AppResult<Json<Value>> {
    let bookings = BookingRepository::new(state.db_pool.clone())
        .list_for_user(auth.user.id, None)
        .await?;
    let bookings = booking_views(&state, &bookings).await?;

    Ok(Json(json!({
        "title": "Booking history",
        "user": auth.user,
        "bookings": bookings,
    })))
}
