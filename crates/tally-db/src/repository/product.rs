//! # Product Repository
//!
//! Catalog operations for products.
//!
//! ## Key Operations
//! - Listing active products, lookup by id (active or not)
//! - Create / update / soft delete
//!
//! Stock is never written here. Every stock movement goes through the
//! [`SalesLedger`](crate::ledger::SalesLedger) under a product lock.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbResult, LedgerResult};
use tally_core::validation::{validate_new_product, validate_product_update};
use tally_core::{CoreError, NewProduct, Product, ProductUpdate};

pub(crate) const PRODUCT_COLUMNS: &str = "id, name, description, price_cents, cost_cents, stock, \
     category, barcode, image, is_active, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let catalog = repo.list_active().await?;
/// let product = repo.get_by_id("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists active products sorted by name. Soft-deleted products are
    /// hidden.
    pub async fn list_active(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products WHERE is_active = 1 ORDER BY name",
            PRODUCT_COLUMNS
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Listed active products");
        Ok(products)
    }

    /// Gets a product by its ID, including soft-deleted ones.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_product(&mut conn, id).await
    }

    /// Creates a product after validating it.
    pub async fn create(&self, input: NewProduct) -> LedgerResult<Product> {
        validate_new_product(&input)?;

        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            name: input.name.trim().to_string(),
            description: input.description,
            price_cents: input.price_cents,
            cost_cents: input.cost_cents,
            stock: input.stock,
            category: input.category,
            barcode: input.barcode,
            image: input.image,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, name = %product.name, "Inserting product");
        self.insert(&product).await?;
        Ok(product)
    }

    /// Inserts a fully-formed product row (seeding, fixtures).
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, description, price_cents, cost_cents, stock,
                category, barcode, image, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.stock)
        .bind(&product.category)
        .bind(&product.barcode)
        .bind(&product.image)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates catalog fields. Stock is untouched; the image is only
    /// replaced when the update carries one.
    pub async fn update(&self, id: &str, update: ProductUpdate) -> LedgerResult<Product> {
        validate_product_update(&update)?;

        debug!(id = %id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                description = ?3,
                price_cents = ?4,
                cost_cents = ?5,
                category = ?6,
                barcode = ?7,
                image = COALESCE(?8, image),
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(update.name.trim())
        .bind(&update.description)
        .bind(update.price_cents)
        .bind(update.cost_cents)
        .bind(&update.category)
        .bind(&update.barcode)
        .bind(&update.image)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ProductNotFound(id.to_string()).into());
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()).into())
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// Historical sales keep resolving the row for stock restoration and
    /// current-cost reporting.
    pub async fn soft_delete(&self, id: &str) -> LedgerResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ProductNotFound(id.to_string()).into());
        }

        Ok(())
    }

    /// Current catalog cost of every product, keyed by id.
    pub async fn cost_map(&self) -> DbResult<HashMap<String, i64>> {
        let rows: Vec<(String, i64)> = sqlx::query_as("SELECT id, cost_cents FROM products")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().collect())
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Reads one product on an existing connection or transaction.
pub(crate) async fn fetch_product(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Product>> {
    let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;

    Ok(product)
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::LedgerError;
    use tally_core::ErrorKind;

    fn laptop() -> NewProduct {
        NewProduct {
            name: "Laptop".to_string(),
            description: Some("High-performance laptop".to_string()),
            price_cents: 99_999,
            cost_cents: 70_000,
            stock: 15,
            category: Some("Electronics".to_string()),
            barcode: None,
            image: Some("laptop.png".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let created = repo.create(laptop()).await.unwrap();
        assert!(created.is_active);

        let fetched = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Laptop");
        assert_eq!(fetched.stock, 15);
        assert_eq!(fetched.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let err = db
            .products()
            .create(NewProduct {
                price_cents: -1,
                ..laptop()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailure);
    }

    #[tokio::test]
    async fn test_update_never_touches_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        let created = repo.create(laptop()).await.unwrap();

        let updated = repo
            .update(
                &created.id,
                ProductUpdate {
                    name: "Laptop Pro".to_string(),
                    description: None,
                    price_cents: 129_999,
                    cost_cents: 90_000,
                    category: Some("Electronics".to_string()),
                    barcode: Some("123".to_string()),
                    image: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Laptop Pro");
        assert_eq!(updated.stock, 15);
        // kept when the update carries no image
        assert_eq!(updated.image.as_deref(), Some("laptop.png"));
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_listing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        let created = repo.create(laptop()).await.unwrap();

        repo.soft_delete(&created.id).await.unwrap();

        assert!(repo.list_active().await.unwrap().is_empty());
        assert_eq!(repo.count().await.unwrap(), 0);
        let still_there = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert!(!still_there.is_active);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let err = db.products().soft_delete("missing").await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Core(CoreError::ProductNotFound(_))
        ));
    }
}
