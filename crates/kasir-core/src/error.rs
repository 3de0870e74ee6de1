//! # Error Types
//!
//! Domain-specific error types for kasir-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kasir-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  kasir-db errors                                                       │
//! │  └── DbError          - Persistence failures (wraps CoreError so a     │
//! │                         rejected sale aborts its unit of work)         │
//! │                                                                         │
//! │  kasir-server errors                                                   │
//! │  └── ApiError         - HTTP status + { "error": "..." } body           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Messages here are developer-facing English; the server translates each
//! variant into the Indonesian message shown to cashiers.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Referenced product does not exist or is inactive.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// One or more cart lines reference a missing or inactive product.
    ///
    /// Raised before any write, by comparing the number of distinct product
    /// ids requested with the number of active products found.
    #[error("Invalid items: requested {requested} products, found {found}")]
    InvalidItems { requested: usize, found: usize },

    /// Selling more than is on hand.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout (Indomie Goreng × 5)
    ///      │
    ///      ▼
    /// Check stock: available = 3
    ///      │
    ///      ▼
    /// InsufficientStock { name: "Indomie Goreng", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Cart left untouched, cashier sees "Stok Indomie Goreng tidak cukup"
    /// ```
    #[error("Insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        name: String,
        available: i64,
        requested: i64,
    },

    /// A stock adjustment would leave the product below zero.
    #[error("Adjustment would make stock negative: current {current}, result {result}")]
    NegativeStock { current: i64, result: i64 },

    /// Client-supplied totals disagree with the cart lines.
    #[error("Totals do not match items: expected {field} {expected}, got {actual}")]
    InvalidTotals {
        field: String,
        expected: i64,
        actual: i64,
    },

    /// Input validation failed.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

impl ValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::Duplicate { field, .. } => field,
        }
    }
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
