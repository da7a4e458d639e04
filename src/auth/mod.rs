pub mod cookie;
pub mod password;

use crate::AppState;
use crate::db::session::SessionRepository;
use crate::db::user::UserRepository;
use crate::error::AppError;
use crate::models::{Session, User};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;

/// A logged-in user together with the session that authenticated the request
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub user: User,
    pub session_id: String,
}

/// The caller's account, if any
pub struct MaybeUser(pub Option<Authenticated>);

/// Rejects anonymous callers with 401
pub struct CurrentUser(pub Authenticated);

/// Rejects callers without staff rights with 403
pub struct StaffUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let Some(token) = cookie::session_token(&parts.headers) else {
            return Ok(MaybeUser(None));
        };

        let session_repo = SessionRepository::new(state.db_pool.clone());
        let Some(session) = session_repo.get_valid(&token, chrono::Utc::now()).await? else {
            tracing::debug!("Ignoring unknown or expired session token");
            return Ok(MaybeUser(None));
        };

        let user_repo = UserRepository::new(state.db_pool.clone());
        let user = user_repo.get_by_id(session.user_id).await?;
        Ok(MaybeUser(user.map(|user| Authenticated {
            user,
            session_id: session.id,
        })))
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let MaybeUser(auth) = MaybeUser::from_request_parts(parts, state).await?;
        auth.map(CurrentUser).ok_or(AppError::Unauthorized)
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for StaffUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let CurrentUser(auth) = CurrentUser::from_request_parts(parts, state).await?;
        if !auth.user.is_staff {
            tracing::warn!(user = %auth.user.username, "Non-staff user tried to reach the staff console");
            return Err(AppError::Forbidden);
        }
        Ok(StaffUser(auth.user))
    }
}

/// Open a session for `user` and return the `Set-Cookie` value carrying it
pub async fn start_session(state: &AppState, user: &User) -> Result<(Session, String), sqlx::Error> {
    let session = Session::new(user.id, state.config.session_ttl);
    SessionRepository::new(state.db_pool.clone()).create(&session).await?;
    let cookie = cookie::session_cookie(&session.id, state.config.session_ttl);
    Ok((session, cookie))
}
