//! # tally-core: Pure Business Logic for Tally POS
//!
//! Everything the inventory ledger decides without touching a database:
//! money arithmetic, entity types, validation, the error taxonomy, invoice
//! formatting and the insights aggregation math.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/api (axum HTTP adapter)                    │   │
//! │  │   /products  /customers  /sales  /sales/{id}/refund /insights   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-db (Database Layer)                    │   │
//! │  │   Repositories • SalesLedger • InsightsService • Retention      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌───────────┐ ┌──────────┐ ┌───────┐ │   │
//! │  │   │  types  │ │  money  │ │ validation│ │ insights │ │invoice│ │   │
//! │  │   └─────────┘ └─────────┘ └───────────┘ └──────────┘ └───────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Customer, Sale, line items)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types and the caller-facing [`ErrorKind`]
//! - [`validation`] - Business rule validation
//! - [`invoice`] - Invoice number formatting
//! - [`insights`] - Reporting windows and sales aggregation
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::money::Money;
//!
//! let price = Money::from_cents(1099); // $10.99
//! let line_total = price.multiply_quantity(3);
//! assert_eq!(line_total.cents(), 3297);
//! ```

pub mod error;
pub mod insights;
pub mod invoice;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed in a single sale.
pub const MAX_SALE_ITEMS: usize = 100;

/// Maximum quantity of a single line item.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Ledger Retention may only purge this many days back.
pub const MAX_RETENTION_DAYS: i64 = 30;

/// Largest single money amount (price, cost, discount) accepted, in cents.
///
/// A full sale at this price still fits comfortably in an `i64` of cents.
pub const MAX_AMOUNT_CENTS: i64 = 100_000_000_000;

/// Largest stock level a product may hold.
pub const MAX_STOCK: i64 = 1_000_000_000;
