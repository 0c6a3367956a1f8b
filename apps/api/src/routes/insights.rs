//! Insights report and ledger retention.

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::auth::Identity;
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use tally_core::insights::{InsightsPeriod, InsightsReport};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/insights", get(report))
        .route("/api/insights/sales", delete(purge_sales))
}

#[derive(Debug, Default, Deserialize)]
pub struct InsightsParams {
    /// `daily`, `weekly` or `monthly`; anything else reads as daily.
    pub period: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PurgeRequest {
    #[serde(default = "default_purge_days")]
    pub days: i64,
}

fn default_purge_days() -> i64 {
    1
}

#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    pub message: String,
    pub days: i64,
    pub deleted_count: u64,
}

/// GET /api/insights?period=
async fn report(
    State(state): State<AppState>,
    _identity: Identity,
    params: Result<Query<InsightsParams>, QueryRejection>,
) -> ApiResult<Json<InsightsReport>> {
    let Query(params) = params?;
    let period = InsightsPeriod::parse_or_daily(params.period.as_deref());

    Ok(Json(state.insights.compute(period).await?))
}

/// DELETE /api/insights/sales `{ "days": n }` - admin only; an empty body
/// purges the last day
async fn purge_sales(
    State(state): State<AppState>,
    identity: Identity,
    body: Bytes,
) -> ApiResult<Json<PurgeResponse>> {
    identity.require_admin("purge sales")?;

    let request = if body.iter().all(u8::is_ascii_whitespace) {
        PurgeRequest {
            days: default_purge_days(),
        }
    } else {
        serde_json::from_slice::<PurgeRequest>(&body)
            .map_err(|e| ApiError::BadRequest(e.to_string()))?
    };

    let deleted_count = state.retention.purge_recent_sales(request.days).await?;

    Ok(Json(PurgeResponse {
        message: format!(
            "Deleted {} sales from the last {} day(s)",
            deleted_count, request.days
        ),
        days: request.days,
        deleted_count,
    }))
}
