//! # Customer Repository
//!
//! Customer directory CRUD. Deletion is a hard delete: sales keep the
//! customer's id and a snapshot of the name, so history stays readable.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbResult, LedgerResult};
use tally_core::validation::{validate_customer_update, validate_new_customer};
use tally_core::{CoreError, Customer, CustomerUpdate, NewCustomer};

const CUSTOMER_COLUMNS: &str = "id, name, email, phone, address, loyalty_points, \
     total_purchases_cents, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Lists every customer sorted by name.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let sql = format!("SELECT {} FROM customers ORDER BY name", CUSTOMER_COLUMNS);
        let customers = sqlx::query_as::<_, Customer>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(customers)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let mut conn = self.pool.acquire().await?;
        fetch_customer(&mut conn, id).await
    }

    pub async fn create(&self, input: NewCustomer) -> LedgerResult<Customer> {
        validate_new_customer(&input)?;

        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            email: input.email,
            phone: input.phone,
            address: input.address,
            loyalty_points: 0,
            total_purchases_cents: 0,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %customer.id, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, name, email, phone, address,
                loyalty_points, total_purchases_cents, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(customer.loyalty_points)
        .bind(customer.total_purchases_cents)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Updates contact details and loyalty points. Lifetime purchases are
    /// owned by the ledger and cannot be set here.
    pub async fn update(&self, id: &str, update: CustomerUpdate) -> LedgerResult<Customer> {
        validate_customer_update(&update)?;

        debug!(id = %id, "Updating customer");

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                name = ?2,
                email = ?3,
                phone = ?4,
                address = ?5,
                loyalty_points = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(update.name.trim())
        .bind(&update.email)
        .bind(&update.phone)
        .bind(&update.address)
        .bind(update.loyalty_points)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::CustomerNotFound(id.to_string()).into());
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::CustomerNotFound(id.to_string()).into())
    }

    pub async fn delete(&self, id: &str) -> LedgerResult<()> {
        debug!(id = %id, "Deleting customer");

        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::CustomerNotFound(id.to_string()).into());
        }

        Ok(())
    }
}

pub(crate) async fn fetch_customer(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Customer>> {
    let sql = format!("SELECT {} FROM customers WHERE id = ?1", CUSTOMER_COLUMNS);
    let customer = sqlx::query_as::<_, Customer>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;

    Ok(customer)
}

/// Adds `delta_cents` to a customer's lifetime purchases. Returns whether
/// the customer still exists.
pub(crate) async fn add_purchases(
    conn: &mut SqliteConnection,
    id: &str,
    delta_cents: i64,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE customers
        SET total_purchases_cents = total_purchases_cents + ?2, updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(delta_cents)
    .bind(Utc::now())
    .execute(conn)
    .await?;

    Ok(result.rows_affected() > 0)
}
