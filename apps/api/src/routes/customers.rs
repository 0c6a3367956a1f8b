//! Customer directory routes.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::auth::Identity;
use crate::error::ApiResult;
use crate::routes::MessageResponse;
use crate::AppState;
use tally_core::{CoreError, Customer, CustomerUpdate, NewCustomer};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/customers", get(list).post(create))
        .route("/api/customers/{id}", get(get_by_id).put(update).delete(delete))
}

/// GET /api/customers
async fn list(
    State(state): State<AppState>,
    _identity: Identity,
) -> ApiResult<Json<Vec<Customer>>> {
    Ok(Json(state.db.customers().list().await?))
}

/// GET /api/customers/{id}
async fn get_by_id(
    State(state): State<AppState>,
    _identity: Identity,
    Path(id): Path<String>,
) -> ApiResult<Json<Customer>> {
    let customer = state
        .db
        .customers()
        .get_by_id(&id)
        .await?
        .ok_or(CoreError::CustomerNotFound(id))?;
    Ok(Json(customer))
}

/// POST /api/customers - any signed-in cashier may register a customer
async fn create(
    State(state): State<AppState>,
    _identity: Identity,
    payload: Result<Json<NewCustomer>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    let Json(input) = payload?;
    let customer = state.db.customers().create(input).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// PUT /api/customers/{id}
async fn update(
    State(state): State<AppState>,
    _identity: Identity,
    Path(id): Path<String>,
    payload: Result<Json<CustomerUpdate>, JsonRejection>,
) -> ApiResult<Json<Customer>> {
    let Json(input) = payload?;
    Ok(Json(state.db.customers().update(&id, input).await?))
}

/// DELETE /api/customers/{id} - past sales keep the frozen customer name
async fn delete(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    identity.require_admin("delete customers")?;

    state.db.customers().delete(&id).await?;
    Ok(Json(MessageResponse::new("Customer deleted successfully")))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{As, TestApp};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_customer_lifecycle() {
        let app = TestApp::new().await;

        let (status, created) = app
            .send(
                Method::POST,
                "/api/customers",
                As::Cashier,
                Some(json!({ "name": "Jane Doe", "email": "jane@example.com" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["total_purchases_cents"], 0);
        let uri = format!("/api/customers/{}", created["id"].as_str().unwrap());

        let (status, updated) = app
            .send(
                Method::PUT,
                &uri,
                As::Cashier,
                Some(json!({ "name": "Jane Smith", "loyalty_points": 12 })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["name"], "Jane Smith");
        assert_eq!(updated["loyalty_points"], 12);

        let (status, _) = app.send(Method::DELETE, &uri, As::Cashier, None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app.send(Method::DELETE, &uri, As::Admin, None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app.send(Method::GET, &uri, As::Cashier, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_reads_require_identity() {
        let app = TestApp::new().await;
        let (status, created) = app
            .send(
                Method::POST,
                "/api/customers",
                As::Cashier,
                Some(json!({ "name": "Ana Ruiz", "phone": "555-0101" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let uri = format!("/api/customers/{}", created["id"].as_str().unwrap());

        let (status, body) = app.send(Method::GET, "/api/customers", As::Anonymous, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.get("phone").is_none());

        let (status, _) = app.send(Method::GET, &uri, As::Anonymous, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = app.send(Method::GET, "/api/customers", As::Cashier, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["phone"], "555-0101");
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let app = TestApp::new().await;
        let (status, body) = app
            .send(Method::POST, "/api/customers", As::Cashier, Some(json!({ "name": " " })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_FAILURE");
    }
}
