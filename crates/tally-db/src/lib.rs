//! # tally-db: Database Layer for Tally POS
//!
//! This crate provides database access and the ledger services for Tally
//! POS. It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Data Flow                              │
//! │                                                                         │
//! │  POST /api/sales                                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tally-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────────┐   ┌──────────────┐   ┌───────────────────┐  │   │
//! │  │   │ SalesLedger  │──►│  StockLocks  │   │  InsightsService  │  │   │
//! │  │   │ create/refund│   │ product→mutex│   │  RetentionService │  │   │
//! │  │   │ adjust stock │   └──────────────┘   └─────────┬─────────┘  │   │
//! │  │   └──────┬───────┘                                │            │   │
//! │  │          ▼                                        ▼            │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│ product/sale/ │    │  (embedded)  │  │   │
//! │  │   │  SqlitePool   │    │   customer    │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (tally.db, WAL)                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and ledger error types
//! - [`repository`] - Product, customer and sale repositories
//! - [`locks`] - Per-product stock locks
//! - [`ledger`] - The Transaction Engine (sale, refund, stock adjustment)
//! - [`insights`] - Windowed sales reports
//! - [`retention`] - Bounded purge of recent sales
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_db::{Database, DbConfig, EngineConfig};
//!
//! let db = Database::new(DbConfig::new("tally.db")).await?;
//! let ledger = db.ledger(EngineConfig::default());
//! let sale = ledger.create_sale(request, &cashier).await?;
//! let refunded = ledger.refund_sale(&sale.id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod insights;
pub mod ledger;
pub mod locks;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod retention;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, LedgerError, LedgerResult};
pub use insights::InsightsService;
pub use ledger::{EngineConfig, RefundStockPolicy, SalesLedger};
pub use locks::StockLocks;
pub use pool::{Database, DbConfig};
pub use retention::RetentionService;

// Repository re-exports for convenience
pub use repository::customer::CustomerRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
