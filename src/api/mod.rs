use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use time;

use crate::config::Config;
use crate::state::SharedState;

pub mod auth;
mod calendar;
mod episodes;
mod error;
mod observability;
mod profiles;
mod shows;
mod system;
mod transfer;
mod types;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn shows(&self) -> &crate::services::ShowService {
        &self.shared.shows
    }

    #[must_use]
    pub fn watching(&self) -> &crate::services::WatchService {
        &self.shared.watching
    }

    #[must_use]
    pub fn transfer(&self) -> &crate::services::TransferService {
        &self.shared.transfer
    }
}

pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

/// Resolve the reference date for a request: the explicit `as_of` override
/// when given, otherwise today, read once and threaded through.
pub(crate) fn parse_as_of(as_of: Option<&str>) -> Result<chrono::NaiveDate, ApiError> {
    match as_of {
        None => Ok(chrono::Utc::now().date_naive()),
        Some(raw) => chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
            ApiError::validation(format!("Invalid as_of date '{raw}', expected YYYY-MM-DD"))
        }),
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config().server.cors_allowed_origins.clone();

    let protected_routes = create_protected_router(state.clone());

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(60)));

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .merge(protected_routes)
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .layer(session_layer)
        .with_state(state)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/shows", get(shows::list_shows))
        .route("/shows", post(shows::add_show))
        .route("/shows/search", get(shows::search_shows))
        .route("/shows/{id}", get(shows::show_detail))
        .route("/shows/{id}", delete(shows::remove_show))
        .route("/shows/{id}/status", post(shows::set_status_override))
        .route(
            "/shows/{id}/seasons/{season}/watch",
            post(episodes::toggle_season),
        )
        .route("/episodes/{id}/watch", post(episodes::toggle_episode))
        .route("/calendar", get(calendar::get_calendar))
        .route("/profiles", get(profiles::list_profiles))
        .route("/profiles", post(profiles::create_profile))
        .route("/profiles/{id}/activate", post(profiles::activate_profile))
        .route("/export", get(transfer::export_profile))
        .route("/import", post(transfer::import_profile))
        .route("/auth/api-key/regenerate", post(auth::regenerate_api_key))
        .route("/system/status", get(system::get_status))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
