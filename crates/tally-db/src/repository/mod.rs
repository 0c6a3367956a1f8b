//! # Repository Module
//!
//! Database repository implementations for Tally POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.products().list_active()                                   │
//! │       ▼                                                                 │
//! │  ProductRepository / CustomerRepository / SaleRepository              │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Writes that move stock or create sales are NOT here: they belong to   │
//! │  the SalesLedger, which reuses the connection-level helpers below      │
//! │  inside its own transactions.                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog CRUD
//! - [`CustomerRepository`](customer::CustomerRepository) - Customer directory
//! - [`SaleRepository`](sale::SaleRepository) - Sale reads and window scans

pub mod customer;
pub mod product;
pub mod sale;
