//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── ErrorKind        - What a caller needs to branch on               │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── LedgerError      - CoreError | DbError                            │
//! │                                                                         │
//! │  apps/api errors                                                       │
//! │  └── ApiError         - What HTTP clients see (serialized)             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → LedgerError → ApiError            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

// =============================================================================
// Error Kind
// =============================================================================

/// Caller-facing classification of every failure the ledger can produce.
///
/// Transport layers map these to status codes; nothing else should need to
/// match on individual error variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Product, sale or customer missing.
    NotFound,
    /// Malformed input (e.g. non-positive quantity).
    ValidationFailure,
    /// Sale would drive stock negative.
    InsufficientStock,
    /// Refund attempted on a sale that is not `completed`.
    AlreadyRefunded,
    /// Retention window larger than allowed.
    RangeExceeded,
    /// Persistence unavailable or inconsistent.
    StorageFailure,
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These are expected, recoverable-by-caller conditions. Each variant carries
/// enough context (which product, how much is left) for the caller to correct
/// the request and retry.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product id does not resolve to any product row.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Product exists but is soft-deleted and the engine is configured to
    /// refuse selling inactive products.
    #[error("Product {product_id} ({product_name}) is inactive")]
    ProductInactive {
        product_id: String,
        product_name: String,
    },

    /// Sale not found.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Customer not found.
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Insufficient stock to complete a sale or stock adjustment.
    ///
    /// ## User Workflow
    /// ```text
    /// POST /sales { items: [{ product: "laptop", quantity: 5 }] }
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { product_name: "Laptop", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Insufficient stock for Laptop. Available: 3"
    /// ```
    #[error("Insufficient stock for {product_name}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        product_name: String,
        requested: i64,
        available: i64,
    },

    /// Refund requested for a sale that has already been refunded.
    #[error("Sale {invoice_number} is already refunded")]
    AlreadyRefunded {
        sale_id: String,
        invoice_number: String,
    },

    /// Retention request reaches further back than allowed.
    #[error("Cannot delete more than {max} days of sales data (requested {requested})")]
    RangeExceeded { requested: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Classifies this error for callers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::ProductNotFound(_)
            | CoreError::SaleNotFound(_)
            | CoreError::CustomerNotFound(_) => ErrorKind::NotFound,
            CoreError::ProductInactive { .. } | CoreError::Validation(_) => {
                ErrorKind::ValidationFailure
            }
            CoreError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            CoreError::AlreadyRefunded { .. } => ErrorKind::AlreadyRefunded,
            CoreError::RangeExceeded { .. } => ErrorKind::RangeExceeded,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for early validation before any lock is taken or any row is touched.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, unknown enum value).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    pub(crate) fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }

    /// An amount derived from valid inputs no longer fits in cents.
    pub fn overflow(field: &str) -> Self {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "amount is too large".to_string(),
        }
    }

    pub(crate) fn must_not_be_negative(field: &str) -> Self {
        ValidationError::MustNotBeNegative {
            field: field.to_string(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
