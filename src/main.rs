//! Waterlog Backend
//!
//! REST backend for ward-level waterlogging incident reporting, with SQLite
//! persistence and a server-sent update stream.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod events;
mod geo;
mod lifecycle;
mod models;
mod stats;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use events::ReportEvents;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Arc<Config>,
    pub events: ReportEvents,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Waterlog Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!(
        "Sensitive area radius: {} m",
        config.sensitive_radius_m
    );

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    // Make sure the administrative accounts exist
    let created = auth::bootstrap_admin_accounts(&repo, &config).await?;
    if created > 0 {
        tracing::info!("Bootstrapped {} administrative accounts", created);
    }

    // Create application state
    let state = AppState {
        repo,
        events: ReportEvents::new(config.event_capacity),
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let repo = state.repo.clone();

    // Routes that require the current session
    let session_routes = Router::new()
        // Session
        .route("/auth/logout", post(api::logout))
        .route("/auth/me", get(api::current_user))
        .route("/auth/profile", put(api::update_profile))
        .route("/workers", get(api::list_workers))
        // Reports
        .route("/reports", get(api::list_reports).post(api::create_report))
        .route(
            "/reports/{id}",
            get(api::get_report).delete(api::delete_report),
        )
        .route("/reports/{id}/proximity", get(api::get_report_proximity))
        .route("/reports/{id}/assign", post(api::assign_report))
        .route("/reports/{id}/reject", post(api::reject_report))
        .route("/reports/{id}/start", post(api::start_report))
        .route("/reports/{id}/proof", post(api::attach_proof))
        .route("/reports/{id}/complete", post(api::complete_report))
        .route("/reports/{id}/resolve", post(api::resolve_report))
        .route("/reports/{id}/feedback", post(api::submit_feedback))
        // Dashboards
        .route("/stats/ward", get(api::get_ward_stats))
        .route("/stats/city", get(api::get_city_stats))
        .route("/stats/worker", get(api::get_worker_stats))
        .route("/datastore", get(api::get_datastore))
        // Apply session auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::session_auth_layer(repo.clone(), req, next)
        }));

    // Routes open to anonymous visitors
    let public_routes = Router::new()
        .route("/auth/signup", post(api::signup))
        .route("/auth/login", post(api::login))
        .route("/wards", get(api::list_wards))
        .route("/hotspots", get(api::list_hotspots))
        .route("/sensitive-areas", get(api::list_sensitive_areas))
        .route("/alerts", get(api::list_alerts))
        .route("/datastore/revision", get(api::get_revision))
        .route("/events", get(api::report_events));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", session_routes.merge(public_routes))
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
