//! Documentation of a recipe sharing platform.
//!
//! Users publish recipes, follow authors, keep favorites and a shopping cart, download an
//! aggregated shopping list and share recipes through short links.
//!
//!
//!
//! # General Infrastructure
//! - Reverse proxy in front serves the frontend and forwards `/api/` and `/s/` here
//! - One backend process, stateless apart from the database pool
//! - SQLite for local runs, Postgres in deployment, same schema from the `entity` crate
//! - Tokens are issued by the auth provider and stored in `auth_tokens`, we only read them
//!
//!
//!
//! # Shopping List
//!
//! **Goal**: one text file with everything to buy for the recipes in the cart.
//!
//! - Every ingredient line of every recipe in the cart is collected
//! - Lines sharing (name, unit) are summed, different units stay separate
//! - Sorted by name then unit so the file is stable between downloads
//! - Empty cart still yields the header line
//!
//!
//!
//! # Short Links
//!
//! **Goal**: shareable `/s/<token>` URLs that never point at the wrong recipe.
//!
//! - Token drawn from `[A-Za-z0-9]`, length from `SHORT_LINK_LENGTH`
//! - Exists check before insert keeps retries rare
//! - Unique constraint on the column is the real guarantee, a violation rolls back the
//!   savepoint and a new token is drawn
//! - Token is assigned in the same transaction as the recipe insert and never changes
//!
//!
//!
//! # Notes
//!
//! ## Identity
//! No global "current user". Each handler receives the user from the [`auth::CurrentUser`]
//! or [`auth::MaybeUser`] extractor and passes it down explicitly.
//!
//! ## Pagination
//! Lists are returned whole. The catalogue is small enough for now.
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
//! Run locally against SQLite.
//! ```sh
//! RUST_LOG=info cargo run -p foodgram
//! ```
//!
//! Load fixtures.
//! ```sh
//! cargo run -p loader -- ingredients data/ingredients.json
//! cargo run -p loader -- tags data/tags.json
//! ```
//!
//!
//!
//! # Environment
//!
//! | variable            | default                             |
//! |---------------------|-------------------------------------|
//! | `RUST_PORT`         | `8000`                              |
//! | `DATABASE_URL`      | `sqlite://foodgram.sqlite?mode=rwc` |
//! | `PUBLIC_URL`        | `http://localhost`                  |
//! | `SHORT_LINK_LENGTH` | `6`                                 |
//!
//! `DATABASE_URL` is read from `/run/secrets/DATABASE_URL` first when mounted.
use std::{sync::Arc, time::Duration};

use anyhow::Result;
use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
};
use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod payloads;
pub mod routes;
pub mod shopping;
pub mod short_link;
pub mod state;
pub mod store;
pub mod utils;

use config::Config;
use state::AppState;

pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    routes::router().layer(cors).with_state(state)
}

pub async fn start_server() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading config...");
    let config = Config::load()?;

    info!("Initializing state...");
    let state = AppState::new(config).await?;

    info!("Starting server...");

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
