//! # Insights Service
//!
//! Reads one reporting window out of the ledger and hands it to the pure
//! aggregation in [`tally_core::insights`]. Read-only; takes no stock locks.

use std::collections::HashMap;

use chrono::{DateTime, Local, TimeZone, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::LedgerResult;
use crate::repository::product::ProductRepository;
use crate::repository::sale::SaleRepository;
use tally_core::insights::{compute_report, CostBasis, InsightsPeriod, InsightsReport};

#[derive(Debug, Clone)]
pub struct InsightsService {
    pool: SqlitePool,
    cost_basis: CostBasis,
}

impl InsightsService {
    pub fn new(pool: SqlitePool, cost_basis: CostBasis) -> Self {
        InsightsService { pool, cost_basis }
    }

    /// Computes the report for `period` in the server's local time zone.
    pub async fn compute(&self, period: InsightsPeriod) -> LedgerResult<InsightsReport> {
        self.compute_at(period, Local::now()).await
    }

    /// Computes the report for the window around `now`, bucketing hours in
    /// `now`'s time zone.
    pub async fn compute_at<Tz: TimeZone>(
        &self,
        period: InsightsPeriod,
        now: DateTime<Tz>,
    ) -> LedgerResult<InsightsReport> {
        let tz = now.timezone();
        let range = period.window(now);

        let sales = SaleRepository::new(self.pool.clone())
            .list_completed_between(range.start, range.end)
            .await?;

        let current_costs = match self.cost_basis {
            CostBasis::Current => ProductRepository::new(self.pool.clone()).cost_map().await?,
            CostBasis::AtSale => HashMap::new(),
        };

        debug!(
            period = %period,
            start = %range.start,
            end = %range.end,
            sales = sales.len(),
            "Computing insights"
        );

        Ok(compute_report(
            period,
            range,
            sales,
            &current_costs,
            self.cost_basis,
            &tz,
        ))
    }

    /// Same as [`compute_at`](Self::compute_at) in UTC.
    pub async fn compute_utc(
        &self,
        period: InsightsPeriod,
        now: DateTime<Utc>,
    ) -> LedgerResult<InsightsReport> {
        self.compute_at(period, now).await
    }
}
