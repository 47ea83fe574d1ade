//! Documentation of a school registry and rating portal.
//!
//!
//!
//! # General Infrastructure
//! - One HTTP server exposing a JSON API under `/api/schools`
//! - One MySQL database holding `schools` and `schools_ratings`
//! - Clients (the browse page, [`registry::SchoolsClient`], the `seed` and `tester` binaries) only talk JSON
//!
//!
//!
//! # API
//!
//! Every body is an envelope: `{ "success": bool, "data"?, "message"?, "error"? }`.
//!
//! | Route                      | Purpose                                                  |
//! |----------------------------|----------------------------------------------------------|
//! | `GET /api/schools`         | all schools with `avg_rating` and `rating_count`, newest first, `?search=` filters |
//! | `POST /api/schools`        | register a school, answers `201` with its `id`           |
//! | `GET /api/schools/{id}`    | one school                                               |
//! | `PUT /api/schools/{id}`    | edit a school (the image stays as it was)                |
//! | `DELETE /api/schools/{id}` | remove a school and its ratings                          |
//! | `POST /api/schools/{id}`   | rate a school 1 to 5, answers `201` with the new aggregate |
//! | `GET /health`              | liveness, including the store                            |
//!
//! Anything else on those paths is a `405`.
//!
//!
//!
//! # Ratings
//!
//! See [`registry::rating`] for the arithmetic and [`registry::board`] for the
//! optimistic client flow. The server never trusts a client average, it always
//! answers with a fresh `AVG()`.
//!
//!
//!
//! # Setup
//!
//! View current docs.
//! ```sh
//! cargo doc --open
//! ```
//!
//! Run against a local MySQL.
//! ```sh
//! MYSQL_PASSWORD=secret MYSQL_DATABASE=schools RUST_LOG=info cargo run
//! ```
//!
//! Run without a database.
//! ```sh
//! SCHOOLS_STORE=memory RUST_LOG=debug cargo run
//! ```
//!
//!
//!
//! # Configuration
//!
//! | Variable                  | Default     |
//! |---------------------------|-------------|
//! | `RUST_PORT`               | `1111`      |
//! | `SCHOOLS_STORE`           | `mysql`     |
//! | `MYSQL_HOST`              | `localhost` |
//! | `MYSQL_PORT`              | `3306`      |
//! | `MYSQL_USER`              | `root`      |
//! | `MYSQL_PASSWORD`          | `/run/secrets/MYSQL_PASSWORD`, then the environment |
//! | `MYSQL_DATABASE`          | `test`      |
//! | `MYSQL_POOL_SIZE`         | `10`        |
//! | `MYSQL_IDLE_TIMEOUT_SECS` | `60`        |
use std::{sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::get,
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod database;
pub mod error;
pub mod routes;
pub mod state;
pub mod store;
pub mod utils;

use config::Config;
use routes::{
    create_school, delete_school, get_school, health_handler, list_schools, method_not_allowed,
    rate_school, update_school,
};
use state::State;

pub fn app(state: Arc<State>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route(
            "/api/schools",
            get(list_schools)
                .post(create_school)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/schools/{id}",
            get(get_school)
                .put(update_school)
                .delete(delete_school)
                .post(rate_school)
                .fallback(method_not_allowed),
        )
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn start_server() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading config...");
    let config = Config::load()?;

    info!("Initializing state...");
    let state = State::new(config)
        .await
        .context("Failed to initialize the school store")?;

    info!("Starting server...");
    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
