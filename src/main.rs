//! Agency Desk Backend
//!
//! REST backend for client service requests, comments, users and passwords,
//! persisted as whole JSON files in a data directory.

mod api;
mod auth;
mod config;
mod errors;
mod models;
mod store;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue},
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use store::{JsonStore, Repository};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.log_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting Agency Desk Backend");
    tracing::info!("Data directory: {:?}", config.data_dir);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.api_key.is_none() {
        tracing::warn!("No API key configured (AGENCY_API_KEY). The /api routes are open!");
    }

    // Create missing data files up front
    let repo = Arc::new(Repository::new(JsonStore::new(config.data_dir.clone())));
    repo.init().await?;

    let state = AppState {
        repo,
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_key = state.config.api_key.clone();

    let api_routes = Router::new()
        // Requests
        .route("/requests", get(api::list_requests))
        .route("/requests", post(api::create_request))
        .route("/requests/stats", get(api::request_stats))
        .route(
            "/requests/client/{client_id}",
            delete(api::delete_client_requests),
        )
        .route("/requests/{id}", get(api::get_request))
        .route("/requests/{id}", put(api::update_request_status))
        .route("/requests/{id}", delete(api::delete_request))
        .route("/requests/{id}/comments", post(api::add_comment))
        // Users
        .route("/users", get(api::list_users))
        .route("/users", post(api::create_user))
        .route("/users/passwords", get(api::get_passwords))
        .route("/users/passwords", put(api::replace_passwords))
        .route("/users/change-password", post(api::change_password))
        .route("/users/{id}", get(api::get_user))
        .route("/users/{id}", put(api::update_user))
        .route("/users/{id}", delete(api::delete_user))
        // Credentials
        .route("/update-password", post(api::change_password))
        .route("/force-password", post(api::force_password))
        .route("/login", post(api::login))
        .layer(middleware::from_fn(move |req, next| {
            auth::api_key_layer(api_key.clone(), req, next)
        }));

    // Health check (never gated)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, no-cache, must-revalidate, private"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::EXPIRES,
            HeaderValue::from_static("0"),
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
