//! # Tally API
//!
//! JSON-over-HTTP adapter for the Tally POS sales ledger.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Tally API Routes                               │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  /api/sales    │  │ /api/products  │  │  /api/insights             ││
//! │  │                │  │                │  │                            ││
//! │  │ • create (201) │  │ • CRUD         │  │ • report ?period=          ││
//! │  │ • list / get   │  │ • stock delta  │  │ • purge recent sales       ││
//! │  │ • refund       │  │                │  │                            ││
//! │  └───────┬────────┘  └───────┬────────┘  └─────────────┬──────────────┘│
//! │          │                   │                         │               │
//! │          ▼                   ▼                         ▼               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  AppState: Database + SalesLedger + Insights + Retention         │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config`] for the environment variables.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

#[cfg(test)]
pub(crate) mod test_support;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, ApiResult};

use tally_db::{Database, EngineConfig, InsightsService, RetentionService, SalesLedger};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub ledger: SalesLedger,
    pub insights: InsightsService,
    pub retention: RetentionService,
}

impl AppState {
    pub fn new(db: Database, engine: EngineConfig) -> Self {
        AppState {
            ledger: db.ledger(engine),
            insights: db.insights(&engine),
            retention: db.retention(),
            db,
        }
    }
}

/// Builds the full router with request tracing and permissive CORS for the
/// browser UI.
pub fn build_router(state: AppState) -> Router {
    routes::router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
