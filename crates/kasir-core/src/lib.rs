//! # kasir-core: Pure Business Logic for Kasir POS
//!
//! Domain types and rules with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kasir POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web client (browser)                         │   │
//! │  │    Kasir ──► Inventaris ──► Pelanggan ──► Laporan ──► Dashboard │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP / JSON                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 kasir-server (axum handlers)                    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ kasir-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   types  money  input  validation  sale  stock                 │   │
//! │  │   report  dashboard  cache  export                              │   │
//! │  │                                                                 │   │
//! │  │   NO DATABASE • NO NETWORK • PURE FUNCTIONS                     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    kasir-db (Database Layer)                    │   │
//! │  │        SQLite queries, migrations, unit of work, repositories  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities and enums (Product, Transaction, StockMovement, ...)
//! - [`money`] - Integer money
//! - [`input`] - Request payloads, filters, pagination
//! - [`validation`] - Field rules
//! - [`sale`] - Totals check and receipt numbers
//! - [`stock`] - Adjustment arithmetic and the movement ledger's net delta
//! - [`report`] - Sales report aggregation
//! - [`dashboard`] - Day-over-day percentage change
//! - [`cache`] - Bounded TTL report cache
//! - [`export`] - Export table shaping and CSV
//! - [`error`] - Domain error types
//!
//! The one exception to "no I/O" is [`cache::ReportCache`], which reads the
//! monotonic clock.
//!
//! ## Example Usage
//!
//! ```rust
//! use kasir_core::money::Money;
//! use kasir_core::dashboard::percentage_change;
//!
//! let line = Money::from_minor(25_000).multiply_quantity(2);
//! assert_eq!(line.minor(), 50_000);
//! assert_eq!(percentage_change(80.0, 100.0), -20.0);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cache;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod input;
pub mod money;
pub mod report;
pub mod sale;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines in a single sale.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity on a single line.
///
/// Catches typos such as 10000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 9_999;

/// Largest accepted amount in any money field (Rp 1 trillion).
///
/// With [`MAX_ITEM_QUANTITY`] and [`MAX_CART_ITEMS`] this keeps every sale
/// total far inside `i64`.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// Largest stock level a product may hold, and the largest quantity a single
/// stock movement may carry.
pub const MAX_STOCK: i64 = 1_000_000;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Default and maximum for the dashboard's recent-transactions list.
pub const DEFAULT_RECENT_TRANSACTIONS: i64 = 5;
pub const MAX_RECENT_TRANSACTIONS: i64 = 50;

/// Result limit for point-of-sale product and customer search.
pub const POS_SEARCH_LIMIT: i64 = 20;

/// Report range when no dates are given, ending today.
pub const DEFAULT_REPORT_DAYS: i64 = 30;

pub const TOP_PRODUCTS_LIMIT: usize = 10;

pub const DEFAULT_CACHE_CAPACITY: usize = 100;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
