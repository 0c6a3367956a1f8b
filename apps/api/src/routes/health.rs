//! Liveness plus a database round trip.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` or `degraded`
    status: &'static str,
    version: &'static str,
    database: bool,
}

/// GET /api/health
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = state.db.health_check().await;
    let (status, label) = if database {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(HealthResponse {
            status: label,
            version: env!("CARGO_PKG_VERSION"),
            database,
        }),
    )
}

#[cfg(test)]
mod tests {
    use crate::test_support::{As, TestApp};
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_health_ok() {
        let app = TestApp::new().await;
        let (status, body) = app.send(Method::GET, "/api/health", As::Anonymous, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], true);
    }

    #[tokio::test]
    async fn test_health_degraded_after_close() {
        let app = TestApp::new().await;
        app.db.close().await;

        let (status, body) = app.send(Method::GET, "/api/health", As::Anonymous, None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "degraded");
    }
}
