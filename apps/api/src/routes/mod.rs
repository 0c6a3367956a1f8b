//! Route table. "cashier" means any caller carrying `x-cashier-id`.
//!
//! | Path | Methods | Identity |
//! |------|---------|----------|
//! | `/api/health` | GET | none |
//! | `/api/products` | GET, POST | GET: cashier, POST: admin |
//! | `/api/products/{id}` | GET, PUT, DELETE | GET: cashier, writes: admin |
//! | `/api/products/{id}/stock` | POST | admin |
//! | `/api/customers` | GET, POST | cashier |
//! | `/api/customers/{id}` | GET, PUT, DELETE | GET, PUT: cashier, DELETE: admin |
//! | `/api/sales` | GET, POST | cashier |
//! | `/api/sales/{id}` | GET | cashier |
//! | `/api/sales/{id}/refund` | POST | cashier |
//! | `/api/insights` | GET | cashier |
//! | `/api/insights/sales` | DELETE | admin |

pub mod customers;
pub mod health;
pub mod insights;
pub mod products;
pub mod sales;

use axum::Router;
use serde::Serialize;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(products::router())
        .merge(customers::router())
        .merge(sales::router())
        .merge(insights::router())
}

/// Body for operations that only report what happened.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        MessageResponse {
            message: message.into(),
        }
    }
}
