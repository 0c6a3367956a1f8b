//! # Sale Repository
//!
//! Database reads for the sales ledger, plus the row-level helpers the
//! Transaction Engine uses inside its transactions.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. CREATE (SalesLedger::create_sale)                                  │
//! │     └── insert_sale() + insert items → Sale { status: Completed }      │
//! │                                                                         │
//! │  2. (OPTIONAL) REFUND (SalesLedger::refund_sale)                       │
//! │     └── mark_refunded() → Sale { status: Refunded }   (exactly once)   │
//! │                                                                         │
//! │  3. (OPTIONAL) PURGE (RetentionService, completed sales only)          │
//! │     └── DELETE sales → sale_items cascade                              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use tally_core::{PaymentMethod, Sale, SaleLineItem, SaleStatus};

const SALE_COLUMNS: &str = "id, invoice_number, customer_id, customer_name, subtotal_cents, \
     discount_cents, tax_cents, total_cents, payment_method, cashier_id, cashier_name, status, \
     created_at, updated_at";

const ITEM_COLUMNS: &str = "id, sale_id, product_id, product_name, quantity, unit_price_cents, \
     unit_cost_cents, discount_cents, line_total_cents";

/// Sale ids bound per `IN (...)` item lookup; SQLite caps bound variables.
pub(crate) const ITEM_BATCH_SIZE: usize = 500;

/// A `sales` row without its line items.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct SaleRow {
    id: String,
    invoice_number: String,
    customer_id: Option<String>,
    customer_name: Option<String>,
    subtotal_cents: i64,
    discount_cents: i64,
    tax_cents: i64,
    total_cents: i64,
    payment_method: PaymentMethod,
    cashier_id: String,
    cashier_name: String,
    status: SaleStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SaleRow {
    fn with_items(self, items: Vec<SaleLineItem>) -> Sale {
        Sale {
            id: self.id,
            invoice_number: self.invoice_number,
            items,
            customer_id: self.customer_id,
            customer_name: self.customer_name,
            subtotal_cents: self.subtotal_cents,
            discount_cents: self.discount_cents,
            tax_cents: self.tax_cents,
            total_cents: self.total_cents,
            payment_method: self.payment_method,
            cashier_id: self.cashier_id,
            cashier_name: self.cashier_name,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Repository for sale reads.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale with its items.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;
        fetch_sale(&mut conn, id).await
    }

    /// Lists sales newest first, paginated.
    pub async fn list(&self, limit: i64, offset: i64) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {} FROM sales ORDER BY created_at DESC, invoice_number DESC LIMIT ?1 OFFSET ?2",
            SALE_COLUMNS
        );
        let rows = sqlx::query_as::<_, SaleRow>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        self.attach_items(rows).await
    }

    /// Completed sales with `start <= created_at <= end`, newest first.
    pub async fn list_completed_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<Sale>> {
        debug!(%start, %end, "Scanning completed sales");

        let sql = format!(
            r#"
            SELECT {} FROM sales
            WHERE status = 'completed' AND created_at >= ?1 AND created_at <= ?2
            ORDER BY created_at DESC, invoice_number DESC
            "#,
            SALE_COLUMNS
        );
        let rows = sqlx::query_as::<_, SaleRow>(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;

        self.attach_items(rows).await
    }

    /// Counts sales in the ledger (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Loads the items of every row, [`ITEM_BATCH_SIZE`] sales per query,
    /// and stitches them on.
    async fn attach_items(&self, rows: Vec<SaleRow>) -> DbResult<Vec<Sale>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut items = Vec::new();
        for chunk in rows.chunks(ITEM_BATCH_SIZE) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "SELECT {} FROM sale_items WHERE sale_id IN ({}) ORDER BY sale_id, line_no",
                ITEM_COLUMNS, placeholders
            );

            let mut query = sqlx::query_as::<_, SaleLineItem>(&sql);
            for row in chunk {
                query = query.bind(&row.id);
            }
            items.extend(query.fetch_all(&self.pool).await?);
        }

        let mut by_sale: HashMap<String, Vec<SaleLineItem>> = HashMap::new();
        for item in items {
            by_sale.entry(item.sale_id.clone()).or_default().push(item);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let items = by_sale.remove(&row.id).unwrap_or_default();
                row.with_items(items)
            })
            .collect())
    }
}

// =============================================================================
// Connection-level helpers (shared with the Transaction Engine)
// =============================================================================

/// Reads one sale and its items on an existing connection or transaction.
pub(crate) async fn fetch_sale(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Sale>> {
    let sql = format!("SELECT {} FROM sales WHERE id = ?1", SALE_COLUMNS);
    let row = sqlx::query_as::<_, SaleRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let sql = format!(
        "SELECT {} FROM sale_items WHERE sale_id = ?1 ORDER BY line_no",
        ITEM_COLUMNS
    );
    let items = sqlx::query_as::<_, SaleLineItem>(&sql)
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(Some(row.with_items(items)))
}

/// Inserts a sale header and its items, preserving item order.
pub(crate) async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    debug!(id = %sale.id, invoice_number = %sale.invoice_number, "Inserting sale");

    sqlx::query(
        r#"
        INSERT INTO sales (
            id, invoice_number, customer_id, customer_name,
            subtotal_cents, discount_cents, tax_cents, total_cents,
            payment_method, cashier_id, cashier_name, status,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.invoice_number)
    .bind(&sale.customer_id)
    .bind(&sale.customer_name)
    .bind(sale.subtotal_cents)
    .bind(sale.discount_cents)
    .bind(sale.tax_cents)
    .bind(sale.total_cents)
    .bind(sale.payment_method)
    .bind(&sale.cashier_id)
    .bind(&sale.cashier_name)
    .bind(sale.status)
    .bind(sale.created_at)
    .bind(sale.updated_at)
    .execute(&mut *conn)
    .await?;

    for (line_no, item) in sale.items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO sale_items (
                id, sale_id, line_no, product_id, product_name, quantity,
                unit_price_cents, unit_cost_cents, discount_cents, line_total_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&item.id)
        .bind(&item.sale_id)
        .bind(line_no as i64)
        .bind(&item.product_id)
        .bind(&item.product_name)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(item.unit_cost_cents)
        .bind(item.discount_cents)
        .bind(item.line_total_cents)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Flips a completed sale to refunded. Returns `false` when the sale is not
/// (or no longer) completed.
pub(crate) async fn mark_refunded(
    conn: &mut SqliteConnection,
    id: &str,
    at: DateTime<Utc>,
) -> DbResult<bool> {
    let result = sqlx::query(
        "UPDATE sales SET status = 'refunded', updated_at = ?2 WHERE id = ?1 AND status = 'completed'",
    )
    .bind(id)
    .bind(at)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Duration;

    fn sale_at(id: &str, invoice: &str, at: DateTime<Utc>, status: SaleStatus) -> Sale {
        Sale {
            id: id.to_string(),
            invoice_number: invoice.to_string(),
            items: vec![
                SaleLineItem {
                    id: format!("{}-1", id),
                    sale_id: id.to_string(),
                    product_id: "p-2".to_string(),
                    product_name: "Mouse".to_string(),
                    quantity: 2,
                    unit_price_cents: 2_999,
                    unit_cost_cents: 1_500,
                    discount_cents: 0,
                    line_total_cents: 5_998,
                },
                SaleLineItem {
                    id: format!("{}-2", id),
                    sale_id: id.to_string(),
                    product_id: "p-1".to_string(),
                    product_name: "Laptop".to_string(),
                    quantity: 1,
                    unit_price_cents: 99_999,
                    unit_cost_cents: 70_000,
                    discount_cents: 0,
                    line_total_cents: 99_999,
                },
            ],
            customer_id: None,
            customer_name: None,
            subtotal_cents: 105_997,
            discount_cents: 0,
            tax_cents: 0,
            total_cents: 105_997,
            payment_method: PaymentMethod::Card,
            cashier_id: "u-1".to_string(),
            cashier_name: "Cashier".to_string(),
            status,
            created_at: at,
            updated_at: at,
        }
    }

    async fn insert(db: &Database, sale: &Sale) {
        let mut conn = db.pool().acquire().await.unwrap();
        insert_sale(&mut conn, sale).await.unwrap();
    }

    #[tokio::test]
    async fn test_insert_and_fetch_preserves_item_order() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let sale = sale_at("s-1", "INV-1", Utc::now(), SaleStatus::Completed);
        insert(&db, &sale).await;

        let fetched = db.sales().get_by_id("s-1").await.unwrap().unwrap();
        assert_eq!(fetched, sale);
        assert_eq!(fetched.items[0].product_name, "Mouse");
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();
        insert(&db, &sale_at("old", "INV-1", now - Duration::hours(2), SaleStatus::Completed)).await;
        insert(&db, &sale_at("new", "INV-2", now, SaleStatus::Completed)).await;

        let page = db.sales().list(10, 0).await.unwrap();
        let ids: Vec<&str> = page.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
        assert_eq!(page[1].items.len(), 2);

        let second = db.sales().list(1, 1).await.unwrap();
        assert_eq!(second[0].id, "old");
    }

    #[tokio::test]
    async fn test_window_scan_skips_refunded_and_out_of_range() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();
        insert(&db, &sale_at("in", "INV-1", now - Duration::hours(1), SaleStatus::Completed)).await;
        insert(&db, &sale_at("refunded", "INV-2", now, SaleStatus::Refunded)).await;
        insert(&db, &sale_at("old", "INV-3", now - Duration::days(3), SaleStatus::Completed)).await;

        let found = db
            .sales()
            .list_completed_between(now - Duration::days(1), now)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "in");
    }

    #[tokio::test]
    async fn test_window_scan_spans_item_batches() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();
        let total = ITEM_BATCH_SIZE * 2 + 1;

        let mut tx = db.pool().begin().await.unwrap();
        for n in 0..total {
            let at = now - Duration::seconds(n as i64 + 1);
            let sale = sale_at(&format!("s-{}", n), &format!("INV-{}", n), at, SaleStatus::Completed);
            insert_sale(&mut tx, &sale).await.unwrap();
        }
        tx.commit().await.unwrap();

        let found = db
            .sales()
            .list_completed_between(now - Duration::days(7), now)
            .await
            .unwrap();
        assert_eq!(found.len(), total);
        assert!(found.iter().all(|s| s.items.len() == 2));
        assert_eq!(found[0].id, "s-0");
        assert_eq!(found[total - 1].items[1].product_name, "Laptop");
    }

    #[tokio::test]
    async fn test_mark_refunded_once() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        insert(&db, &sale_at("s-1", "INV-1", Utc::now(), SaleStatus::Completed)).await;

        let mut conn = db.pool().acquire().await.unwrap();
        assert!(mark_refunded(&mut conn, "s-1", Utc::now()).await.unwrap());
        assert!(!mark_refunded(&mut conn, "s-1", Utc::now()).await.unwrap());
    }
}
