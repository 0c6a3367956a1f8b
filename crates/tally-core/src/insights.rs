//! # Insights Module
//!
//! Reporting windows and the aggregation math behind the insights report.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  "weekly" ──► InsightsPeriod ──► DateRange { now − 7d .. now }         │
//! │                                        │                                │
//! │                                        ▼                                │
//! │                         tally-db scans completed sales                 │
//! │                         in [start, end], newest first                  │
//! │                                        │                                │
//! │                                        ▼                                │
//! │                   compute_report(sales, current costs, basis)           │
//! │                                        │                                │
//! │                                        ▼                                │
//! │     summary • top_products • hourly_sales • recent_sales               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Windows are computed in a caller-supplied time zone (the server's local
//! zone in production) and converted to UTC for querying.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Months, NaiveDateTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Sale, SaleStatus};

/// How many entries `top_products` holds.
pub const TOP_PRODUCTS_LIMIT: usize = 5;

/// How many entries `recent_sales` holds.
pub const RECENT_SALES_LIMIT: usize = 10;

// =============================================================================
// Period & Window
// =============================================================================

/// Reporting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum InsightsPeriod {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl InsightsPeriod {
    /// Parses a period name, treating anything unrecognised (or absent) as
    /// daily.
    ///
    /// ```rust
    /// use tally_core::insights::InsightsPeriod;
    ///
    /// assert_eq!(InsightsPeriod::parse_or_daily(Some("weekly")), InsightsPeriod::Weekly);
    /// assert_eq!(InsightsPeriod::parse_or_daily(Some("yearly")), InsightsPeriod::Daily);
    /// assert_eq!(InsightsPeriod::parse_or_daily(None), InsightsPeriod::Daily);
    /// ```
    pub fn parse_or_daily(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("weekly") => InsightsPeriod::Weekly,
            Some("monthly") => InsightsPeriod::Monthly,
            _ => InsightsPeriod::Daily,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InsightsPeriod::Daily => "daily",
            InsightsPeriod::Weekly => "weekly",
            InsightsPeriod::Monthly => "monthly",
        }
    }

    /// Computes the inclusive reporting window around `now`.
    ///
    /// | Period  | Start                          | End                        |
    /// |---------|--------------------------------|----------------------------|
    /// | daily   | today 00:00:00.000 (local)     | today 23:59:59.999 (local) |
    /// | weekly  | now − 7 days                   | now                        |
    /// | monthly | now − 1 calendar month         | now                        |
    ///
    /// A monthly window starting on a day the previous month lacks is
    /// clamped to that month's last day (31 March → 29 February).
    pub fn window<Tz: TimeZone>(&self, now: DateTime<Tz>) -> DateRange {
        let tz = now.timezone();
        match self {
            InsightsPeriod::Daily => {
                let day = now.date_naive();
                let start = day.and_hms_milli_opt(0, 0, 0, 0).unwrap_or_default();
                let end = day.and_hms_milli_opt(23, 59, 59, 999).unwrap_or_default();
                DateRange {
                    start: resolve_local(&tz, start, true),
                    end: resolve_local(&tz, end, false),
                }
            }
            InsightsPeriod::Weekly => DateRange {
                start: (now.clone() - Duration::days(7)).with_timezone(&Utc),
                end: now.with_timezone(&Utc),
            },
            InsightsPeriod::Monthly => {
                let start = now
                    .clone()
                    .checked_sub_months(Months::new(1))
                    .unwrap_or_else(|| now.clone() - Duration::days(30));
                DateRange {
                    start: start.with_timezone(&Utc),
                    end: now.with_timezone(&Utc),
                }
            }
        }
    }
}

impl fmt::Display for InsightsPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a local wall-clock time to UTC. Times skipped by a DST jump are read
/// as UTC; ambiguous times take the earliest (start) or latest (end) mapping.
fn resolve_local<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime, earliest: bool) -> DateTime<Utc> {
    let mapped = tz.from_local_datetime(&local);
    let picked = if earliest {
        mapped.earliest()
    } else {
        mapped.latest()
    };
    match picked {
        Some(dt) => dt.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&local),
    }
}

/// Inclusive time window of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "String")]
    pub start: DateTime<Utc>,
    #[ts(as = "String")]
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

// =============================================================================
// Cost Basis
// =============================================================================

/// Which unit cost the report multiplies quantities by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CostBasis {
    /// The product's catalog cost today. Falls back to the line's frozen cost
    /// when the product row no longer exists.
    #[default]
    Current,
    /// The cost frozen into the line item when the sale was recorded.
    AtSale,
}

impl FromStr for CostBasis {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "current" => Ok(CostBasis::Current),
            "at_sale" | "at-sale" | "snapshot" => Ok(CostBasis::AtSale),
            other => Err(ValidationError::InvalidFormat {
                field: "cost_basis".to_string(),
                reason: format!("unknown cost basis '{}'", other),
            }),
        }
    }
}

// =============================================================================
// Report
// =============================================================================

/// Headline figures. All money in cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InsightsSummary {
    pub total_sales: i64,
    pub total_revenue_cents: i64,
    pub total_cost_cents: i64,
    pub total_profit_cents: i64,
    /// Percent, two decimals. Zero when there is no revenue.
    pub profit_margin: f64,
    pub average_order_value_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TopProduct {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub revenue_cents: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HourlyBucket {
    pub hour: u32,
    pub sales: i64,
    pub revenue_cents: i64,
}

/// The full insights report for one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InsightsReport {
    pub period: InsightsPeriod,
    pub date_range: DateRange,
    pub summary: InsightsSummary,
    pub top_products: Vec<TopProduct>,
    /// Present for the daily period only.
    pub hourly_sales: Option<Vec<HourlyBucket>>,
    pub recent_sales: Vec<Sale>,
}

/// Aggregates a window's sales into a report.
///
/// `sales` must already be restricted to the window and ordered newest
/// first; anything not `completed` is ignored. `current_costs` maps product
/// id to today's catalog cost and is only consulted for
/// [`CostBasis::Current`]. Hourly buckets use the hour of `created_at` in
/// `tz`.
pub fn compute_report<Tz: TimeZone>(
    period: InsightsPeriod,
    date_range: DateRange,
    sales: Vec<Sale>,
    current_costs: &HashMap<String, i64>,
    cost_basis: CostBasis,
    tz: &Tz,
) -> InsightsReport {
    let sales: Vec<Sale> = sales
        .into_iter()
        .filter(|s| s.status == SaleStatus::Completed)
        .collect();

    let total_sales = sales.len() as i64;
    let revenue: Money = sales.iter().map(Sale::total).sum();

    let mut cost = Money::zero();
    for item in sales.iter().flat_map(|s| s.items.iter()) {
        cost += match cost_basis {
            CostBasis::Current => current_costs
                .get(&item.product_id)
                .map(|c| Money::from_cents(*c).multiply_quantity(item.quantity))
                .unwrap_or_else(|| item.snapshot_cost()),
            CostBasis::AtSale => item.snapshot_cost(),
        };
    }

    let profit = revenue - cost;

    let summary = InsightsSummary {
        total_sales,
        total_revenue_cents: revenue.cents(),
        total_cost_cents: cost.cents(),
        total_profit_cents: profit.cents(),
        profit_margin: profit.percentage_of(revenue),
        average_order_value_cents: revenue.split_average(total_sales as u64).cents(),
    };

    let hourly_sales = match period {
        InsightsPeriod::Daily => Some(hourly_buckets(&sales, tz)),
        _ => None,
    };

    InsightsReport {
        period,
        date_range,
        summary,
        top_products: top_products(&sales),
        hourly_sales,
        recent_sales: sales.into_iter().take(RECENT_SALES_LIMIT).collect(),
    }
}

/// Per-product quantity and revenue, highest quantity first.
///
/// Ties keep the order in which products were first seen while scanning.
fn top_products(sales: &[Sale]) -> Vec<TopProduct> {
    let mut ranked: Vec<TopProduct> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for item in sales.iter().flat_map(|s| s.items.iter()) {
        let slot = *index.entry(item.product_id.as_str()).or_insert_with(|| {
            ranked.push(TopProduct {
                product_id: item.product_id.clone(),
                product_name: item.product_name.clone(),
                quantity: 0,
                revenue_cents: 0,
            });
            ranked.len() - 1
        });
        let entry = &mut ranked[slot];
        entry.quantity += item.quantity;
        entry.revenue_cents += item.line_total_cents;
    }

    // stable
    ranked.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    ranked.truncate(TOP_PRODUCTS_LIMIT);
    ranked
}

fn hourly_buckets<Tz: TimeZone>(sales: &[Sale], tz: &Tz) -> Vec<HourlyBucket> {
    let mut buckets: Vec<HourlyBucket> = (0..24)
        .map(|hour| HourlyBucket {
            hour,
            sales: 0,
            revenue_cents: 0,
        })
        .collect();

    for sale in sales {
        let hour = sale.created_at.with_timezone(tz).hour() as usize;
        let bucket = &mut buckets[hour];
        bucket.sales += 1;
        bucket.revenue_cents += sale.total_cents;
    }

    buckets
}

// =============================================================================
// Unit Tests
// =============================================================================
