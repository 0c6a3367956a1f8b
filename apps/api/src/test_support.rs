//! Router test helpers: an in-memory app and one-shot JSON requests.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use crate::auth::{CASHIER_ID_HEADER, CASHIER_NAME_HEADER, CASHIER_ROLE_HEADER};
use crate::{build_router, AppState};
use tally_core::{NewProduct, Product};
use tally_db::{Database, DbConfig, EngineConfig};

pub struct TestApp {
    pub router: Router,
    pub db: Database,
}

/// Who sends a request.
#[derive(Debug, Clone, Copy)]
pub enum As {
    Anonymous,
    Cashier,
    Admin,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_engine(EngineConfig::default()).await
    }

    pub async fn with_engine(engine: EngineConfig) -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let router = build_router(AppState::new(db.clone(), engine));
        TestApp { router, db }
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        who: As,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        match who {
            As::Anonymous => {}
            As::Cashier => {
                builder = builder
                    .header(CASHIER_ID_HEADER, "u-cashier")
                    .header(CASHIER_NAME_HEADER, "Cashier User");
            }
            As::Admin => {
                builder = builder
                    .header(CASHIER_ID_HEADER, "u-admin")
                    .header(CASHIER_NAME_HEADER, "Admin User")
                    .header(CASHIER_ROLE_HEADER, "admin");
            }
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn product(&self, name: &str, price: i64, cost: i64, stock: i64) -> Product {
        self.db
            .products()
            .create(NewProduct {
                name: name.to_string(),
                description: None,
                price_cents: price,
                cost_cents: cost,
                stock,
                category: None,
                barcode: None,
                image: None,
            })
            .await
            .unwrap()
    }
}
