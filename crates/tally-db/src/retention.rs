//! # Ledger Retention
//!
//! Bulk removal of recent completed sales, bounded to the last
//! [`MAX_RETENTION_DAYS`](tally_core::MAX_RETENTION_DAYS) days.
//!
//! Deleted sales do not give their stock back, and refunded sales are never
//! touched. Invoice numbers of deleted sales are not reused: the counter
//! lives in `ledger_counters` and only ever increases.

use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use tracing::warn;

use crate::error::LedgerResult;
use tally_core::validation::validate_retention_days;

#[derive(Debug, Clone)]
pub struct RetentionService {
    pool: SqlitePool,
}

impl RetentionService {
    pub fn new(pool: SqlitePool) -> Self {
        RetentionService { pool }
    }

    /// Deletes completed sales created in the last `days` days. Returns how
    /// many sales were deleted; their line items go with them.
    pub async fn purge_recent_sales(&self, days: i64) -> LedgerResult<u64> {
        self.purge_recent_sales_at(days, Utc::now()).await
    }

    pub async fn purge_recent_sales_at(&self, days: i64, now: DateTime<Utc>) -> LedgerResult<u64> {
        validate_retention_days(days)?;

        let cutoff = now - Duration::days(days);

        let result = sqlx::query("DELETE FROM sales WHERE status = 'completed' AND created_at >= ?1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected();
        warn!(days, %cutoff, deleted, "Purged recent sales from the ledger");

        Ok(deleted)
    }
}
