//! Sales ledger routes: record, read and refund.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::debug;

use crate::auth::Identity;
use crate::error::ApiResult;
use crate::AppState;
use tally_core::{NewSale, Sale};

pub const DEFAULT_PAGE_SIZE: i64 = 50;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/sales", get(list).post(create))
        .route("/api/sales/{id}", get(get_by_id))
        .route("/api/sales/{id}/refund", post(refund))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// POST /api/sales - records the sale against the requesting cashier
async fn create(
    State(state): State<AppState>,
    identity: Identity,
    payload: Result<Json<NewSale>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Sale>)> {
    let Json(request) = payload?;
    let sale = state.ledger.create_sale(request, &identity.cashier).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

/// GET /api/sales?limit=&offset= - newest first
async fn list(
    State(state): State<AppState>,
    _identity: Identity,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<Vec<Sale>>> {
    let Query(params) = params?;
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let offset = params.offset.unwrap_or(0);

    Ok(Json(state.ledger.list_sales(limit, offset).await?))
}

/// GET /api/sales/{id}
async fn get_by_id(
    State(state): State<AppState>,
    _identity: Identity,
    Path(id): Path<String>,
) -> ApiResult<Json<Sale>> {
    Ok(Json(state.ledger.get_sale(&id).await?))
}

/// POST /api/sales/{id}/refund - responds with the refunded sale itself
async fn refund(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> ApiResult<Json<Sale>> {
    debug!(sale_id = %id, by = %identity.cashier.id, "Refund requested");
    Ok(Json(state.ledger.refund_sale(&id).await?))
}
