//! # Kasir Server
//!
//! HTTP API for the Kasir point-of-sale backend.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Kasir Server                                    │
//! │                                                                         │
//! │  Browser / POS client                                                   │
//! │       │  JSON + kasir_session cookie                                    │
//! │       ▼                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────────────────┐    │
//! │  │ TraceLayer   │──►│ routes::*    │──►│ kasir-db repositories    │    │
//! │  │ CorsLayer    │   │ AuthUser     │   │ (SQLite, unit of work)   │    │
//! │  └──────────────┘   └──────┬───────┘   └──────────────────────────┘    │
//! │                            │                                            │
//! │                     ┌──────▼───────┐                                    │
//! │                     │ ReportCache  │◄── sweep task (every N seconds)    │
//! │                     └──────────────┘                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config`]. Everything can be set through `KASIR_*` environment
//! variables or a toml file named by `KASIR_CONFIG`.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::Method;
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

// Re-exports
pub use crate::config::ServerConfig;
pub use crate::error::{ApiError, ApiResult, ErrorCode};
pub use crate::state::AppState;

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,kasir=debug,sqlx=warn";

/// Installs the global tracing subscriber. Safe to call more than once.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

/// The full application: routes, state and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    routes::router()
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
