//! Product catalog routes.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::debug;

use crate::auth::Identity;
use crate::error::ApiResult;
use crate::routes::MessageResponse;
use crate::AppState;
use tally_core::{CoreError, NewProduct, Product, ProductUpdate};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list).post(create))
        .route("/api/products/{id}", get(get_by_id).put(update).delete(delete))
        .route("/api/products/{id}/stock", post(adjust_stock))
}

#[derive(Debug, Deserialize)]
pub struct StockAdjustment {
    /// Signed change; negative removes stock.
    pub delta: i64,
}

/// GET /api/products - active catalog ordered by name
async fn list(
    State(state): State<AppState>,
    _identity: Identity,
) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.db.products().list_active().await?))
}

/// GET /api/products/{id}
async fn get_by_id(
    State(state): State<AppState>,
    _identity: Identity,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    let product = state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or(CoreError::ProductNotFound(id))?;
    Ok(Json(product))
}

/// POST /api/products
async fn create(
    State(state): State<AppState>,
    identity: Identity,
    payload: Result<Json<NewProduct>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    identity.require_admin("create products")?;
    let Json(input) = payload?;

    let product = state.db.products().create(input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /api/products/{id} - catalog fields only; stock is untouched
async fn update(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
    payload: Result<Json<ProductUpdate>, JsonRejection>,
) -> ApiResult<Json<Product>> {
    identity.require_admin("update products")?;
    let Json(input) = payload?;

    Ok(Json(state.db.products().update(&id, input).await?))
}

/// DELETE /api/products/{id} - soft delete; past sales keep their snapshot
async fn delete(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    identity.require_admin("delete products")?;

    state.db.products().soft_delete(&id).await?;
    Ok(Json(MessageResponse::new("Product deleted successfully")))
}

/// POST /api/products/{id}/stock
async fn adjust_stock(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
    payload: Result<Json<StockAdjustment>, JsonRejection>,
) -> ApiResult<Json<Product>> {
    identity.require_admin("adjust stock")?;
    let Json(StockAdjustment { delta }) = payload?;

    debug!(product_id = %id, delta, by = %identity.cashier.id, "Stock adjustment requested");
    Ok(Json(state.ledger.adjust_stock(&id, delta).await?))
}
