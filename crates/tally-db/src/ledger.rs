//! # Sales Ledger (Transaction Engine)
//!
//! Every stock movement in Tally POS happens here.
//!
//! ## Create Sale
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate request (no lock, no row touched)                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  lock products (sorted, deduplicated)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │  ├── reserve invoice seq   UPDATE ledger_counters ... RETURNING        │
//! │  ├── per line              UPDATE products SET stock = stock - q       │
//! │  │                         WHERE id = ? AND stock >= q RETURNING ...   │
//! │  │                         (no row → ProductNotFound / Insufficient)   │
//! │  ├── customer snapshot     + total_purchases                           │
//! │  └── INSERT sale, INSERT items                                         │
//! │  COMMIT  (any error before this drops the transaction: rollback)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The first statement of every transaction is a write, so SQLite hands the
//! write lock over at `BEGIN` time and a competing process waits on the busy
//! timeout instead of failing mid-transaction.
//!
//! Nothing inside a transaction touches the pool directly. An in-memory
//! database has a single connection, and the transaction already holds it.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbResult, LedgerResult};
use crate::locks::StockLocks;
use crate::repository::customer::{add_purchases, fetch_customer};
use crate::repository::product::{fetch_product, PRODUCT_COLUMNS};
use crate::repository::sale::{fetch_sale, insert_sale, mark_refunded, SaleRepository};
use tally_core::insights::CostBasis;
use tally_core::invoice::format_invoice_number;
use tally_core::validation::{validate_new_sale, validate_stock_delta};
use tally_core::{
    Cashier, CoreError, Money, NewSale, NewSaleItem, Product, Sale, SaleLineItem, SaleStatus,
    ValidationError, MAX_STOCK,
};

/// Largest page `list_sales` returns.
pub const MAX_PAGE_SIZE: i64 = 200;

// =============================================================================
// Configuration
// =============================================================================

/// What a refund does when a sold product row no longer exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundStockPolicy {
    /// Restore what can be restored and log the rest.
    #[default]
    Skip,
    /// Abort the whole refund with `ProductNotFound`.
    Fail,
}

impl FromStr for RefundStockPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "skip" => Ok(RefundStockPolicy::Skip),
            "fail" => Ok(RefundStockPolicy::Fail),
            other => Err(ValidationError::InvalidFormat {
                field: "missing_product_on_refund".to_string(),
                reason: format!("expected 'skip' or 'fail', got '{}'", other),
            }),
        }
    }
}

impl fmt::Display for RefundStockPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefundStockPolicy::Skip => write!(f, "skip"),
            RefundStockPolicy::Fail => write!(f, "fail"),
        }
    }
}

/// Ledger policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Unit cost used by insights reports.
    pub cost_basis: CostBasis,

    pub missing_product_on_refund: RefundStockPolicy,

    /// Whether soft-deleted products may still be sold.
    pub allow_inactive_products: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            cost_basis: CostBasis::Current,
            missing_product_on_refund: RefundStockPolicy::Skip,
            allow_inactive_products: true,
        }
    }
}

// =============================================================================
// Sales Ledger
// =============================================================================

/// The Transaction Engine.
///
/// Build one with [`Database::ledger`](crate::pool::Database::ledger) so that
/// every ledger shares the same [`StockLocks`].
#[derive(Debug, Clone)]
pub struct SalesLedger {
    pool: SqlitePool,
    locks: StockLocks,
    config: EngineConfig,
}

impl SalesLedger {
    pub fn new(pool: SqlitePool, locks: StockLocks, config: EngineConfig) -> Self {
        SalesLedger {
            pool,
            locks,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Records a sale: decrements stock for every line and writes the sale,
    /// all or nothing.
    ///
    /// ## Errors
    /// - `Validation` - malformed request (nothing touched)
    /// - `ProductNotFound` / `InsufficientStock` / `ProductInactive`
    /// - `CustomerNotFound`
    /// - `Storage` - database failure
    ///
    /// On any error no stock changes and no sale row exists.
    pub async fn create_sale(&self, request: NewSale, cashier: &Cashier) -> LedgerResult<Sale> {
        validate_new_sale(&request, cashier)?;
        let totals = request.totals()?;

        let _guard = self
            .locks
            .acquire(request.items.iter().map(|i| i.product_id.as_str()))
            .await;

        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let seq = next_invoice_seq(&mut tx).await?;
        let sale_id = Uuid::new_v4().to_string();

        let mut items = Vec::with_capacity(request.items.len());
        for line in &request.items {
            let taken = take_stock(&mut tx, line, now).await?;
            let Some((product_name, unit_cost_cents, is_active)) = taken else {
                return Err(explain_shortfall(&mut tx, line).await?.into());
            };

            if !is_active && !self.config.allow_inactive_products {
                return Err(CoreError::ProductInactive {
                    product_id: line.product_id.clone(),
                    product_name,
                }
                .into());
            }

            let line_total = Money::from_cents(line.unit_price_cents)
                .checked_multiply_quantity(line.quantity)
                .ok_or_else(|| ValidationError::overflow("line_total"))?;

            items.push(SaleLineItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.clone(),
                product_id: line.product_id.clone(),
                product_name,
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                unit_cost_cents,
                discount_cents: line.discount_cents,
                line_total_cents: line_total.cents(),
            });
        }

        let customer_name = match &request.customer_id {
            Some(customer_id) => {
                let customer = fetch_customer(&mut tx, customer_id)
                    .await?
                    .ok_or_else(|| CoreError::CustomerNotFound(customer_id.clone()))?;
                add_purchases(&mut tx, customer_id, totals.total.cents()).await?;
                Some(customer.name)
            }
            None => None,
        };

        let sale = Sale {
            id: sale_id,
            invoice_number: format_invoice_number(now, seq),
            items,
            customer_id: request.customer_id,
            customer_name,
            subtotal_cents: totals.subtotal.cents(),
            discount_cents: totals.discount.cents(),
            tax_cents: totals.tax.cents(),
            total_cents: totals.total.cents(),
            payment_method: request.payment_method,
            cashier_id: cashier.id.clone(),
            cashier_name: cashier.name.clone(),
            status: SaleStatus::Completed,
            created_at: now,
            updated_at: now,
        };

        insert_sale(&mut tx, &sale).await?;
        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            invoice_number = %sale.invoice_number,
            total = %sale.total(),
            lines = sale.items.len(),
            units = sale.unit_count(),
            "Sale recorded"
        );

        Ok(sale)
    }

    /// Refunds a completed sale: restores stock for every line and flips the
    /// status, all or nothing. Refunds are whole-sale only.
    ///
    /// ## Errors
    /// - `SaleNotFound`
    /// - `AlreadyRefunded` - the sale is not `completed` (stock untouched)
    /// - `ProductNotFound` - only with [`RefundStockPolicy::Fail`]
    pub async fn refund_sale(&self, sale_id: &str) -> LedgerResult<Sale> {
        let sale = SaleRepository::new(self.pool.clone())
            .get_by_id(sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        if !sale.status.can_refund() {
            return Err(already_refunded(&sale).into());
        }

        let _guard = self
            .locks
            .acquire(sale.items.iter().map(|i| i.product_id.as_str()))
            .await;

        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        if !mark_refunded(&mut tx, sale_id, now).await? {
            // Lost the race: refunded or purged since it was read.
            return Err(match fetch_sale(&mut tx, sale_id).await? {
                Some(current) => already_refunded(&current),
                None => CoreError::SaleNotFound(sale_id.to_string()),
            }
            .into());
        }

        for item in &sale.items {
            if restore_stock(&mut tx, &item.product_id, item.quantity, now).await? {
                continue;
            }
            match self.config.missing_product_on_refund {
                RefundStockPolicy::Skip => warn!(
                    sale_id = %sale.id,
                    product_id = %item.product_id,
                    quantity = item.quantity,
                    "Product no longer exists, stock not restored"
                ),
                RefundStockPolicy::Fail => {
                    return Err(CoreError::ProductNotFound(item.product_id.clone()).into());
                }
            }
        }

        if let Some(customer_id) = &sale.customer_id {
            if !add_purchases(&mut tx, customer_id, -sale.total_cents).await? {
                debug!(customer_id = %customer_id, "Customer gone, purchases not adjusted");
            }
        }

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            invoice_number = %sale.invoice_number,
            total = %sale.total(),
            "Sale refunded"
        );

        Ok(Sale {
            status: SaleStatus::Refunded,
            updated_at: now,
            ..sale
        })
    }

    /// Receives (`delta > 0`) or writes off (`delta < 0`) stock outside of a
    /// sale, under the same product lock. The result must land in
    /// `0..=MAX_STOCK`.
    pub async fn adjust_stock(&self, product_id: &str, delta: i64) -> LedgerResult<Product> {
        validate_stock_delta(delta)?;

        let _guard = self.locks.acquire([product_id]).await;
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            UPDATE products SET stock = stock + ?2, updated_at = ?3
            WHERE id = ?1 AND stock + ?2 >= 0 AND (?2 < 0 OR stock + ?2 <= ?4)
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        );
        let updated = sqlx::query_as::<_, Product>(&sql)
            .bind(product_id)
            .bind(delta)
            .bind(Utc::now())
            .bind(MAX_STOCK)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(product) = updated else {
            return Err(match fetch_product(&mut tx, product_id).await? {
                None => CoreError::ProductNotFound(product_id.to_string()),
                Some(_) if delta > 0 => ValidationError::OutOfRange {
                    field: "stock".to_string(),
                    min: 0,
                    max: MAX_STOCK,
                }
                .into(),
                Some(p) => CoreError::InsufficientStock {
                    product_id: p.id,
                    product_name: p.name,
                    requested: -delta,
                    available: p.stock,
                },
            }
            .into());
        };

        tx.commit().await?;

        info!(product_id = %product_id, delta, stock = product.stock, "Stock adjusted");
        Ok(product)
    }

    /// Gets a sale with its items.
    pub async fn get_sale(&self, sale_id: &str) -> LedgerResult<Sale> {
        SaleRepository::new(self.pool.clone())
            .get_by_id(sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()).into())
    }

    /// Lists sales newest first. `limit` is clamped to 1..=[`MAX_PAGE_SIZE`].
    pub async fn list_sales(&self, limit: i64, offset: i64) -> LedgerResult<Vec<Sale>> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let offset = offset.max(0);

        Ok(SaleRepository::new(self.pool.clone())
            .list(limit, offset)
            .await?)
    }
}

// =============================================================================
// Transaction steps
// =============================================================================

/// Reserves the next invoice sequence value. Also the transaction's first
/// write.
async fn next_invoice_seq(conn: &mut SqliteConnection) -> DbResult<i64> {
    let seq: i64 = sqlx::query_scalar(
        "UPDATE ledger_counters SET value = value + 1 WHERE name = 'invoice' RETURNING value",
    )
    .fetch_one(conn)
    .await?;

    Ok(seq)
}

/// Conditionally decrements stock for one line. Returns the product's name,
/// cost and active flag, or `None` when the product is missing or short.
async fn take_stock(
    conn: &mut SqliteConnection,
    line: &NewSaleItem,
    at: DateTime<Utc>,
) -> DbResult<Option<(String, i64, bool)>> {
    let row: Option<(String, i64, bool)> = sqlx::query_as(
        r#"
        UPDATE products SET stock = stock - ?2, updated_at = ?3
        WHERE id = ?1 AND stock >= ?2
        RETURNING name, cost_cents, is_active
        "#,
    )
    .bind(&line.product_id)
    .bind(line.quantity)
    .bind(at)
    .fetch_optional(conn)
    .await?;

    Ok(row)
}

/// Explains why [`take_stock`] matched no row.
async fn explain_shortfall(conn: &mut SqliteConnection, line: &NewSaleItem) -> DbResult<CoreError> {
    Ok(match fetch_product(conn, &line.product_id).await? {
        None => CoreError::ProductNotFound(line.product_id.clone()),
        Some(product) => CoreError::InsufficientStock {
            product_id: product.id,
            product_name: product.name,
            requested: line.quantity,
            available: product.stock,
        },
    })
}

/// Adds units back. Returns `false` when the product row is gone.
async fn restore_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
    quantity: i64,
    at: DateTime<Utc>,
) -> DbResult<bool> {
    let result = sqlx::query("UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1")
        .bind(product_id)
        .bind(quantity)
        .bind(at)
        .execute(conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

fn already_refunded(sale: &Sale) -> CoreError {
    CoreError::AlreadyRefunded {
        sale_id: sale.id.clone(),
        invoice_number: sale.invoice_number.clone(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use crate::pool::{Database, DbConfig};
    use std::collections::HashSet;
    use tally_core::{ErrorKind, NewCustomer, NewProduct, PaymentMethod};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn product(db: &Database, name: &str, price: i64, cost: i64, stock: i64) -> Product {
        db.products()
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

    async fn stock_of(db: &Database, id: &str) -> i64 {
        db.products().get_by_id(id).await.unwrap().unwrap().stock
    }

    fn line(p: &Product, quantity: i64) -> NewSaleItem {
        NewSaleItem {
            product_id: p.id.clone(),
            quantity,
            unit_price_cents: p.price_cents,
            discount_cents: 0,
        }
    }

    fn request(items: Vec<NewSaleItem>) -> NewSale {
        NewSale {
            items,
            customer_id: None,
            discount_cents: 0,
            payment_method: PaymentMethod::Cash,
        }
    }

    fn cashier() -> Cashier {
        Cashier::new("u-1", "Cashier User")
    }

    #[tokio::test]
    async fn test_create_sale_decrements_and_snapshots() {
        let db = setup().await;
        let laptop = product(&db, "Laptop", 99_999, 70_000, 15).await;
        let mouse = product(&db, "Wireless Mouse", 2_999, 1_500, 50).await;
        let ledger = db.ledger(EngineConfig::default());

        let mut req = request(vec![line(&laptop, 1), line(&mouse, 2)]);
        req.discount_cents = 1_000;
        req.payment_method = PaymentMethod::Card;
        let sale = ledger.create_sale(req, &cashier()).await.unwrap();

        assert_eq!(sale.status, SaleStatus::Completed);
        assert_eq!(sale.subtotal_cents, 99_999 + 2 * 2_999);
        assert_eq!(sale.total_cents, 99_999 + 2 * 2_999 - 1_000);
        assert_eq!(sale.cashier_name, "Cashier User");
        assert_eq!(sale.items[1].product_name, "Wireless Mouse");
        assert_eq!(sale.items[1].unit_cost_cents, 1_500);
        assert!(sale.invoice_number.starts_with("INV-"));
        assert!(sale.invoice_number.ends_with("-000001"));

        assert_eq!(stock_of(&db, &laptop.id).await, 14);
        assert_eq!(stock_of(&db, &mouse.id).await, 48);

        let stored = ledger.get_sale(&sale.id).await.unwrap();
        assert_eq!(stored, sale);
    }

    #[tokio::test]
    async fn test_register_price_is_kept() {
        let db = setup().await;
        let mouse = product(&db, "Wireless Mouse", 2_999, 1_500, 5).await;
        let ledger = db.ledger(EngineConfig::default());

        let mut item = line(&mouse, 1);
        item.unit_price_cents = 2_500;
        let sale = ledger
            .create_sale(request(vec![item]), &cashier())
            .await
            .unwrap();

        assert_eq!(sale.items[0].unit_price_cents, 2_500);
        assert_eq!(sale.total_cents, 2_500);
    }

    #[tokio::test]
    async fn test_insufficient_stock_changes_nothing() {
        let db = setup().await;
        let laptop = product(&db, "Laptop", 99_999, 70_000, 3).await;
        let ledger = db.ledger(EngineConfig::default());

        let err = ledger
            .create_sale(request(vec![line(&laptop, 5)]), &cashier())
            .await
            .unwrap_err();

        match err {
            LedgerError::Core(CoreError::InsufficientStock {
                product_name,
                requested,
                available,
                ..
            }) => {
                assert_eq!(product_name, "Laptop");
                assert_eq!(requested, 5);
                assert_eq!(available, 3);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(stock_of(&db, &laptop.id).await, 3);
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_multi_item_sale_is_atomic() {
        let db = setup().await;
        let a = product(&db, "Keyboard", 7_999, 4_000, 10).await;
        let b = product(&db, "Monitor", 29_999, 20_000, 1).await;
        let ledger = db.ledger(EngineConfig::default());

        let err = ledger
            .create_sale(request(vec![line(&a, 2), line(&b, 2)]), &cashier())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);

        // first line was decremented inside the transaction, then rolled back
        assert_eq!(stock_of(&db, &a.id).await, 10);
        assert_eq!(stock_of(&db, &b.id).await, 1);
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_repeated_product_lines_share_stock() {
        let db = setup().await;
        let cable = product(&db, "USB Cable", 999, 300, 3).await;
        let ledger = db.ledger(EngineConfig::default());

        let err = ledger
            .create_sale(request(vec![line(&cable, 2), line(&cable, 2)]), &cashier())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientStock);
        assert_eq!(stock_of(&db, &cable.id).await, 3);

        ledger
            .create_sale(request(vec![line(&cable, 2), line(&cable, 1)]), &cashier())
            .await
            .unwrap();
        assert_eq!(stock_of(&db, &cable.id).await, 0);
    }

    #[tokio::test]
    async fn test_unknown_product() {
        let db = setup().await;
        let ledger = db.ledger(EngineConfig::default());

        let err = ledger
            .create_sale(
                request(vec![NewSaleItem {
                    product_id: "nope".to_string(),
                    quantity: 1,
                    unit_price_cents: 100,
                    discount_cents: 0,
                }]),
                &cashier(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Core(CoreError::ProductNotFound(ref id)) if id == "nope"
        ));
    }

    #[tokio::test]
    async fn test_invalid_request_is_rejected_before_any_write() {
        let db = setup().await;
        let laptop = product(&db, "Laptop", 99_999, 70_000, 3).await;
        let ledger = db.ledger(EngineConfig::default());

        let err = ledger
            .create_sale(request(vec![line(&laptop, 0)]), &cashier())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailure);

        let err = ledger.create_sale(request(vec![]), &cashier()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailure);

        // a rejected request does not consume an invoice number
        let sale = ledger
            .create_sale(request(vec![line(&laptop, 1)]), &cashier())
            .await
            .unwrap();
        assert!(sale.invoice_number.ends_with("-000001"));
    }

    #[tokio::test]
    async fn test_customer_snapshot_and_lifetime_value() {
        let db = setup().await;
        let mouse = product(&db, "Wireless Mouse", 2_999, 1_500, 10).await;
        let customer = db
            .customers()
            .create(NewCustomer {
                name: "Jane Doe".to_string(),
                email: None,
                phone: None,
                address: None,
            })
            .await
            .unwrap();
        let ledger = db.ledger(EngineConfig::default());

        let mut req = request(vec![line(&mouse, 2)]);
        req.customer_id = Some(customer.id.clone());
        let sale = ledger.create_sale(req, &cashier()).await.unwrap();
        assert_eq!(sale.customer_name.as_deref(), Some("Jane Doe"));

        let after_sale = db.customers().get_by_id(&customer.id).await.unwrap().unwrap();
        assert_eq!(after_sale.total_purchases_cents, 5_998);

        ledger.refund_sale(&sale.id).await.unwrap();
        let after_refund = db.customers().get_by_id(&customer.id).await.unwrap().unwrap();
        assert_eq!(after_refund.total_purchases_cents, 0);
    }

    #[tokio::test]
    async fn test_unknown_customer_rolls_back() {
        let db = setup().await;
        let mouse = product(&db, "Wireless Mouse", 2_999, 1_500, 10).await;
        let ledger = db.ledger(EngineConfig::default());

        let mut req = request(vec![line(&mouse, 1)]);
        req.customer_id = Some("ghost".to_string());
        let err = ledger.create_sale(req, &cashier()).await.unwrap_err();

        assert!(matches!(err, LedgerError::Core(CoreError::CustomerNotFound(_))));
        assert_eq!(stock_of(&db, &mouse.id).await, 10);
    }

    #[tokio::test]
    async fn test_refund_restores_stock_once() {
        let db = setup().await;
        let laptop = product(&db, "Laptop", 99_999, 70_000, 5).await;
        let ledger = db.ledger(EngineConfig::default());

        let sale = ledger
            .create_sale(request(vec![line(&laptop, 2)]), &cashier())
            .await
            .unwrap();
        assert_eq!(stock_of(&db, &laptop.id).await, 3);

        let refunded = ledger.refund_sale(&sale.id).await.unwrap();
        assert_eq!(refunded.status, SaleStatus::Refunded);
        assert_eq!(refunded.invoice_number, sale.invoice_number);
        assert_eq!(stock_of(&db, &laptop.id).await, 5);

        let err = ledger.refund_sale(&sale.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyRefunded);
        assert_eq!(stock_of(&db, &laptop.id).await, 5);

        let stored = ledger.get_sale(&sale.id).await.unwrap();
        assert_eq!(stored.status, SaleStatus::Refunded);
    }

    #[tokio::test]
    async fn test_refund_unknown_sale() {
        let db = setup().await;
        let err = db
            .ledger(EngineConfig::default())
            .refund_sale("missing")
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Core(CoreError::SaleNotFound(_))));
    }

    #[tokio::test]
    async fn test_refund_skips_deleted_product_by_default() {
        let db = setup().await;
        let keep = product(&db, "Keyboard", 7_999, 4_000, 10).await;
        let gone = product(&db, "Webcam", 4_999, 2_500, 10).await;
        let ledger = db.ledger(EngineConfig::default());

        let sale = ledger
            .create_sale(request(vec![line(&keep, 1), line(&gone, 1)]), &cashier())
            .await
            .unwrap();

        sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(&gone.id)
            .execute(db.pool())
            .await
            .unwrap();

        let refunded = ledger.refund_sale(&sale.id).await.unwrap();
        assert_eq!(refunded.status, SaleStatus::Refunded);
        assert_eq!(stock_of(&db, &keep.id).await, 10);
    }

    #[tokio::test]
    async fn test_refund_fail_policy_rolls_back() {
        let db = setup().await;
        let keep = product(&db, "Keyboard", 7_999, 4_000, 10).await;
        let gone = product(&db, "Webcam", 4_999, 2_500, 10).await;
        let ledger = db.ledger(EngineConfig {
            missing_product_on_refund: RefundStockPolicy::Fail,
            ..EngineConfig::default()
        });

        let sale = ledger
            .create_sale(request(vec![line(&keep, 1), line(&gone, 1)]), &cashier())
            .await
            .unwrap();

        sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(&gone.id)
            .execute(db.pool())
            .await
            .unwrap();

        let err = ledger.refund_sale(&sale.id).await.unwrap_err();
        assert!(matches!(err, LedgerError::Core(CoreError::ProductNotFound(_))));
        assert_eq!(stock_of(&db, &keep.id).await, 9);
        assert_eq!(
            ledger.get_sale(&sale.id).await.unwrap().status,
            SaleStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_inactive_product_policy() {
        let db = setup().await;
        let old = product(&db, "Old Model", 1_000, 500, 5).await;
        db.products().soft_delete(&old.id).await.unwrap();

        let permissive = db.ledger(EngineConfig::default());
        permissive
            .create_sale(request(vec![line(&old, 1)]), &cashier())
            .await
            .unwrap();
        assert_eq!(stock_of(&db, &old.id).await, 4);

        let strict = db.ledger(EngineConfig {
            allow_inactive_products: false,
            ..EngineConfig::default()
        });
        let err = strict
            .create_sale(request(vec![line(&old, 1)]), &cashier())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Core(CoreError::ProductInactive { .. })));
        assert_eq!(stock_of(&db, &old.id).await, 4);
    }

    #[tokio::test]
    async fn test_adjust_stock() {
        let db = setup().await;
        let desk = product(&db, "Desk", 19_999, 12_000, 2).await;
        let ledger = db.ledger(EngineConfig::default());

        let received = ledger.adjust_stock(&desk.id, 5).await.unwrap();
        assert_eq!(received.stock, 7);

        let err = ledger.adjust_stock(&desk.id, -8).await.unwrap_err();
        match err {
            LedgerError::Core(CoreError::InsufficientStock {
                requested,
                available,
                ..
            }) => {
                assert_eq!(requested, 8);
                assert_eq!(available, 7);
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let err = ledger.adjust_stock(&desk.id, 0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailure);

        let err = ledger.adjust_stock("missing", 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        assert_eq!(ledger.adjust_stock(&desk.id, -7).await.unwrap().stock, 0);
    }

    #[tokio::test]
    async fn test_huge_unit_price_is_rejected_untouched() {
        let db = setup().await;
        let ring = product(&db, "Ring", 100, 50, 10).await;
        let ledger = db.ledger(EngineConfig::default());

        let mut huge = line(&ring, 3);
        huge.unit_price_cents = i64::MAX / 2;

        let err = ledger
            .create_sale(request(vec![huge]), &cashier())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailure);
        assert_eq!(stock_of(&db, &ring.id).await, 10);
        assert_eq!(db.sales().count().await.unwrap(), 0);

        // the largest accepted line still totals exactly
        let mut top = line(&ring, 3);
        top.unit_price_cents = tally_core::MAX_AMOUNT_CENTS;
        let sale = ledger
            .create_sale(request(vec![top]), &cashier())
            .await
            .unwrap();
        assert_eq!(sale.total_cents, 3 * tally_core::MAX_AMOUNT_CENTS);
        assert_eq!(sale.items[0].line_total_cents, sale.total_cents);
    }

    #[tokio::test]
    async fn test_adjust_stock_is_bounded() {
        let db = setup().await;
        let pallet = product(&db, "Pallet", 1_000, 400, 5).await;
        let ledger = db.ledger(EngineConfig::default());

        let err = ledger.adjust_stock(&pallet.id, i64::MAX).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailure);

        let err = ledger.adjust_stock(&pallet.id, MAX_STOCK).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailure);
        assert_eq!(stock_of(&db, &pallet.id).await, 5);

        let full = ledger.adjust_stock(&pallet.id, MAX_STOCK - 5).await.unwrap();
        assert_eq!(full.stock, MAX_STOCK);
    }

    #[tokio::test]
    async fn test_list_sales_pages_newest_first() {
        let db = setup().await;
        let cable = product(&db, "USB Cable", 999, 300, 10).await;
        let ledger = db.ledger(EngineConfig::default());

        let mut invoices = Vec::new();
        for _ in 0..3 {
            let sale = ledger
                .create_sale(request(vec![line(&cable, 1)]), &cashier())
                .await
                .unwrap();
            invoices.push(sale.invoice_number);
        }

        let page = ledger.list_sales(2, 0).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].invoice_number, invoices[2]);

        let rest = ledger.list_sales(2, 2).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].invoice_number, invoices[0]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_last_unit_race() {
        let db = setup().await;
        let last = product(&db, "Last Laptop", 99_999, 70_000, 1).await;
        let ledger = db.ledger(EngineConfig::default());

        let mut handles = Vec::new();
        for _ in 0..2 {
            let ledger = ledger.clone();
            let req = request(vec![line(&last, 1)]);
            handles.push(tokio::spawn(async move {
                ledger.create_sale(req, &cashier()).await
            }));
        }

        let mut ok = 0;
        let mut short = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(e) if e.kind() == ErrorKind::InsufficientStock => short += 1,
                Err(e) => panic!("unexpected error: {:?}", e),
            }
        }

        assert_eq!((ok, short), (1, 1));
        assert_eq!(stock_of(&db, &last.id).await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_invoices_are_unique() {
        let db = setup().await;
        let a = product(&db, "Keyboard", 7_999, 4_000, 100).await;
        let b = product(&db, "Mouse", 2_999, 1_500, 100).await;
        let ledger = db.ledger(EngineConfig::default());

        let mut handles = Vec::new();
        for i in 0..20 {
            let ledger = ledger.clone();
            let items = if i % 2 == 0 {
                vec![line(&a, 1), line(&b, 1)]
            } else {
                vec![line(&b, 2)]
            };
            handles.push(tokio::spawn(async move {
                ledger.create_sale(request(items), &cashier()).await
            }));
        }

        let mut invoices = HashSet::new();
        for handle in handles {
            let sale = handle.await.unwrap().unwrap();
            assert!(invoices.insert(sale.invoice_number));
        }

        assert_eq!(invoices.len(), 20);
        assert_eq!(stock_of(&db, &a.id).await, 90);
        assert_eq!(stock_of(&db, &b.id).await, 100 - 10 - 20);
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("FAIL".parse::<RefundStockPolicy>().unwrap(), RefundStockPolicy::Fail);
        assert_eq!("skip".parse::<RefundStockPolicy>().unwrap(), RefundStockPolicy::Skip);
        assert!("ignore".parse::<RefundStockPolicy>().is_err());
        assert!(EngineConfig::default().allow_inactive_products);
    }
}
