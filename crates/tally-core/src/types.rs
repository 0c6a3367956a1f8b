//! # Domain Types
//!
//! Core domain types used throughout Tally POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    Customer     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  price_cents    │◄──│  invoice_number │──►│  name           │       │
//! │  │  cost_cents     │   │  items[]        │   │  loyalty_points │       │
//! │  │  stock          │   │  status         │   │  total_purchases│       │
//! │  │  is_active      │   │  total_cents    │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                              │
//! │  │   SaleStatus    │   │ PaymentMethod   │                              │
//! │  │  Completed      │   │  Cash           │                              │
//! │  │  Refunded       │   │  Card           │                              │
//! │  └─────────────────┘   │  Transfer       │                              │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Sales never look up live catalog or customer data for display. Product
//! name, unit price and unit cost are frozen into each line item, and the
//! customer and cashier names are frozen into the sale, at the moment the
//! sale is recorded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A sellable catalog item and its stock counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to the cashier and on receipts.
    pub name: String,

    pub description: Option<String>,

    /// Catalog price in cents. Sales may override it per line.
    pub price_cents: i64,

    /// Unit cost in cents (for cost of goods and margin).
    pub cost_cents: i64,

    /// Units on hand. Never negative.
    pub stock: i64,

    pub category: Option<String>,

    pub barcode: Option<String>,

    /// Reference to an uploaded image (storage is handled elsewhere).
    pub image: Option<String>,

    /// Soft-delete flag. Inactive products are hidden from listings but stay
    /// resolvable for historical sales.
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }
}

/// Input for creating a catalog product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
    pub cost_cents: i64,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Catalog fields an update may change.
///
/// Stock is deliberately absent: it only moves through the sales ledger.
/// Image is only replaced when a new one is supplied.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductUpdate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
    pub cost_cents: i64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

// =============================================================================
// Customer
// =============================================================================

/// An optional customer record referenced by sales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub loyalty_points: i64,
    /// Lifetime value of completed (non-refunded) sales, in cents.
    pub total_purchases_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a customer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCustomer {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Customer fields an update may change.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerUpdate {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub loyalty_points: i64,
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a ledger entry.
///
/// The only legal transition is `Completed → Refunded`, exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    #[default]
    Completed,
    Refunded,
}

impl SaleStatus {
    pub fn can_refund(&self) -> bool {
        matches!(self, SaleStatus::Completed)
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaleStatus::Completed => write!(f, "completed"),
            SaleStatus::Refunded => write!(f, "refunded"),
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Transfer,
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "transfer" => Ok(PaymentMethod::Transfer),
            other => Err(ValidationError::InvalidFormat {
                field: "payment_method".to_string(),
                reason: format!("unknown payment method '{}'", other),
            }),
        }
    }
}

// =============================================================================
// Cashier
// =============================================================================

/// The operator recording a sale, as identified by the auth layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cashier {
    pub id: String,
    pub name: String,
}

impl Cashier {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Cashier {
            id: id.into(),
            name: name.into(),
        }
    }
}

// =============================================================================
// Sale Line Item
// =============================================================================

/// A line item in a recorded sale. Every price-like field is a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleLineItem {
    pub id: String,
    pub sale_id: String,
    /// Live reference, used for stock restoration and reporting.
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub product_name: String,
    pub quantity: i64,
    /// Price charged per unit (frozen, may differ from catalog price).
    pub unit_price_cents: i64,
    /// Catalog cost per unit at time of sale (frozen).
    pub unit_cost_cents: i64,
    /// Per-line discount. Recorded, not deducted from the subtotal.
    pub discount_cents: i64,
    /// unit_price × quantity.
    pub line_total_cents: i64,
}

impl SaleLineItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }

    /// Cost of goods for this line using the frozen unit cost.
    #[inline]
    pub fn snapshot_cost(&self) -> Money {
        Money::from_cents(self.unit_cost_cents).multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A transaction ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Sale {
    pub id: String,
    /// Human-readable, unique, assigned once at creation.
    pub invoice_number: String,
    pub items: Vec<SaleLineItem>,
    pub customer_id: Option<String>,
    /// Customer name at time of sale (frozen).
    pub customer_name: Option<String>,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub cashier_id: String,
    pub cashier_name: String,
    pub status: SaleStatus,
    /// The ledger's time axis. Never modified.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Total units across all lines.
    pub fn unit_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

// =============================================================================
// Sale Request
// =============================================================================

/// One requested line of a new sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSaleItem {
    pub product_id: String,
    pub quantity: i64,
    /// Register price for this line; not re-read from the catalog.
    pub unit_price_cents: i64,
    #[serde(default)]
    pub discount_cents: i64,
}

/// A request to record a sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSale {
    pub items: Vec<NewSaleItem>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub discount_cents: i64,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

/// Header amounts derived from a sale request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub tax: Money,
    pub total: Money,
}

impl NewSale {
    /// Computes `subtotal = Σ unit_price × quantity` and
    /// `total = subtotal − discount + tax`.
    ///
    /// The total is not floored at zero; clamping is a register concern.
    /// Tax is reserved and currently always zero.
    ///
    /// Fails if any figure overflows `i64` cents.
    pub fn totals(&self) -> Result<SaleTotals, ValidationError> {
        let mut subtotal = Money::zero();
        for item in &self.items {
            subtotal = Money::from_cents(item.unit_price_cents)
                .checked_multiply_quantity(item.quantity)
                .and_then(|line| subtotal.checked_add(line))
                .ok_or_else(|| ValidationError::overflow("subtotal"))?;
        }
        let discount = Money::from_cents(self.discount_cents);
        let tax = Money::zero();
        let total = subtotal
            .checked_sub(discount)
            .and_then(|t| t.checked_add(tax))
            .ok_or_else(|| ValidationError::overflow("total"))?;

        Ok(SaleTotals {
            subtotal,
            discount,
            tax,
            total,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
