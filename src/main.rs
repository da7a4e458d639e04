mod auth;
mod booking;
mod config;
mod db;
mod error;
mod forms;
mod handlers;
mod models;

use anyhow::{Context, Result};
use axum::{
    Router,
    routing::{get, post, put},
};
use config::{parse_name_list, Config};
use models::ZoneDraft;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub struct AppState {
    pub db_pool: PgPool,
    pub config: Config,
    /// Usernames that get staff rights at registration
    pub staff_usernames: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "anticafe=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenv::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!("Connecting to database");
    let db_pool = db::create_pool(&config.database_url, config.database_max_connections)
        .await
        .context("Failed to create database pool")?;

    tracing::info!("Running database migrations");
    db::run_migrations(&db_pool)
        .await
        .context("Failed to run migrations")?;

    tracing::info!("Loading staff");
    let staff_usernames = load_staff(&db_pool, config.staff.clone()).await?;

    if config.seed_default_zones {
        tracing::info!("Loading default zones");
        load_default_zones(&db_pool).await?;
    }

    let expired = db::session::SessionRepository::new(db_pool.clone())
        .delete_expired(chrono::Utc::now())
        .await?;
    if expired > 0 {
        tracing::info!("Removed {} expired session(s)", expired);
    }

    let addr = config.bind_addr();
    let state = Arc::new(AppState {
        db_pool,
        config,
        staff_usernames,
    });

    let app = router(state);

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    use handlers::{account, api, booking, contacts, pages, staff};

    Router::new()
        .route("/health", get(health_check))
        // Pages and forms
        .route("/", get(pages::home))
        .route("/zones", get(pages::zones))
        .route("/booking", get(pages::booking).post(booking::submit))
        .route("/contacts", get(pages::contacts).post(contacts::submit))
        .route("/register", post(account::register))
        .route("/login", post(account::login))
        .route("/logout", post(account::logout))
        .route("/profile", get(account::profile).post(account::update_profile))
        .route("/profile/history", get(account::booking_history))
        // JSON API
        .route("/api/availability", get(api::availability))
        .route("/api/zones/availability", get(api::zone_availability))
        .route("/api/zones/:zone_id/availability", get(api::zone_availability_by_id))
        // Staff console
        .route("/staff/zones", get(staff::list_zones).post(staff::create_zone))
        .route("/staff/zones/:zone_id", put(staff::update_zone))
        .route("/staff/bookings", get(staff::list_bookings))
        .route("/staff/bookings/status", post(staff::change_booking_status))
        .route("/staff/bookings/:booking_id/schedule", put(staff::reschedule_booking))
        .route("/staff/messages", get(staff::list_messages))
        .route("/staff/messages/processed", post(staff::mark_messages))
        .route("/staff/users", get(staff::list_users))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

/// Load staff usernames from the STAFF variable or staff.txt and promote the ones already registered
async fn load_staff(pool: &PgPool, from_env: Option<Vec<String>>) -> Result<Vec<String>> {
    use db::user::UserRepository;

    let usernames = if let Some(names) = from_env {
        tracing::info!("Loading staff from STAFF environment variable");
        names
    } else if let Ok(contents) = tokio::fs::read_to_string("staff.txt").await {
        tracing::info!("Loading staff from staff.txt file");
        parse_name_list(&contents, '\n')
    } else {
        tracing::warn!("No staff configured (no STAFF env var or staff.txt file)");
        return Ok(Vec::new());
    };

    if usernames.is_empty() {
        tracing::warn!("Staff list is empty");
        return Ok(usernames);
    }

    let user_repo = UserRepository::new(pool.clone());
    for username in &usernames {
        match user_repo.promote_to_staff(username).await {
            Ok(true) => tracing::info!("Granted staff rights to {}", username),
            Ok(false) => {
                tracing::info!("Staff user {} not registered yet (will be promoted on registration)", username)
            }
            Err(e) => tracing::error!("Failed to promote {} to staff: {}", username, e),
        }
    }

    tracing::info!("Loaded {} staff user(s)", usernames.len());
    Ok(usernames)
}

/// Seed the zone catalogue from the embedded zones.json, skipping titles that already exist
async fn load_default_zones(pool: &PgPool) -> Result<()> {
    use db::zone::ZoneRepository;

    const DEFAULT_ZONES: &str = include_str!("../data/zones.json");

    let drafts: Vec<ZoneDraft> = serde_json::from_str(DEFAULT_ZONES)
        .context("Failed to parse zones.json")?;

    let zone_repo = ZoneRepository::new(pool.clone());
    let mut created = 0;
    for draft in drafts {
        if let Err(reason) = draft.validate() {
            tracing::warn!("Skipping default zone '{}': {}", draft.title, reason);
            continue;
        }
        if zone_repo.exists_with_title(&draft.title).await? {
            tracing::debug!("Zone '{}' already exists, skipping", draft.title);
            continue;
        }
        let zone = zone_repo.create(&draft.into_zone()).await?;
        tracing::info!("Created zone '{}' ({} seats)", zone.title, zone.capacity);
        created += 1;
    }

    tracing::info!("Default zones loaded: {} created", created);
    Ok(())
}
