//! # Validation Module
//!
//! Field-level input validation for Kasir POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Client                                                       │
//! │  └── Basic format checks, immediate feedback for the cashier           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: HTTP handler (Rust)                                          │
//! │  ├── Type validation (serde deserialization)                           │
//! │  └── THIS MODULE: field rules via Input::validate()                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK (stock >= 0)                                     │
//! │  ├── UNIQUE (sku, barcode, email, username)                            │
//! │  └── Foreign keys                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kasir_core::validation::{validate_sku, validate_quantity};
//!
//! validate_sku("IDM-GRG-001").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_AMOUNT, MAX_CART_ITEMS, MAX_ITEM_QUANTITY, MAX_STOCK};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only letters, digits, hyphens and underscores
///
/// ## Example
/// ```rust
/// use kasir_core::validation::validate_sku;
///
/// assert!(validate_sku("IDM-GRG-001").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("A".repeat(100).as_str()).is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a barcode (EAN-8, EAN-13, UPC-A or an internal code).
///
/// ## Rules
/// - 4 to 50 characters
/// - Only letters and digits
pub fn validate_barcode(barcode: &str) -> ValidationResult<()> {
    let barcode = barcode.trim();

    if barcode.len() < 4 || barcode.len() > 50 {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must be between 4 and 50 characters".to_string(),
        });
    }

    if !barcode.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must contain only letters and numbers".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name: required, at most 200 characters.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_required("name", name, 200)
}

/// Validates a required free-text field.
///
/// ## Example
/// ```rust
/// use kasir_core::validation::validate_required;
///
/// assert!(validate_required("reason", "Barang rusak", 200).is_ok());
/// assert!(validate_required("reason", "   ", 200).is_err());
/// ```
pub fn validate_required(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    validate_max_len(field, value, max)
}

/// Validates the length of an optional free-text field.
pub fn validate_max_len(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.trim().chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

/// Validates a reference id: non-empty, at most 64 characters.
///
/// Unknown ids are reported by the repositories as not found, so no format
/// beyond that is enforced here.
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    validate_required(field, id, 64)
}

/// Validates a search query.
///
/// ## Returns
/// The trimmed query string (empty means "no filter").
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "q".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Validates an email address loosely: one `@`, a dot in the domain.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    validate_max_len("email", email, 254)?;

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };

    if !valid || email.contains(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must be a valid email address".to_string(),
        });
    }

    Ok(())
}

/// Validates a phone number: digits with optional `+`, spaces and hyphens,
/// 6 to 20 characters.
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();

    let charset_ok = phone
        .chars()
        .enumerate()
        .all(|(i, c)| c.is_ascii_digit() || c == ' ' || c == '-' || (c == '+' && i == 0));

    if !charset_ok || digits < 6 || phone.len() > 20 {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must be 6-20 digits, optionally starting with +".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Checkout: cart line "Aqua 600ml × 0"                                  │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(0) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0?     → INVALID_INPUT, nothing written               │
/// │       ├── qty too big?  → INVALID_INPUT                                │
/// │       └── OK → stock check inside the unit of work                     │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a monetary amount: `0..=MAX_AMOUNT`.
///
/// ## Example
/// ```rust
/// use kasir_core::money::Money;
/// use kasir_core::validation::validate_amount;
///
/// assert!(validate_amount("price", Money::from_minor(3_500)).is_ok());
/// assert!(validate_amount("price", Money::zero()).is_ok());
/// assert!(validate_amount("price", Money::from_minor(-100)).is_err());
/// ```
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    validate_range(field, amount.minor(), 0, MAX_AMOUNT)
}

/// Quantity of a hand-recorded stock movement: `1..=MAX_STOCK`.
pub fn validate_stock_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    validate_range("quantity", qty, 1, MAX_STOCK)
}

/// Stock level: `0..=MAX_STOCK`.
pub fn validate_stock_level(field: &str, stock: i64) -> ValidationResult<()> {
    validate_range(field, stock, 0, MAX_STOCK)
}

fn validate_range(field: &str, value: i64, min: i64, max: i64) -> ValidationResult<()> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max,
        });
    }
    Ok(())
}

/// Validates the reorder bounds of a product: `0 ≤ min_stock ≤ max_stock`.
pub fn validate_stock_bounds(min_stock: i64, max_stock: Option<i64>) -> ValidationResult<()> {
    validate_stock_level("minStock", min_stock)?;

    if let Some(max_stock) = max_stock {
        validate_range("maxStock", max_stock, min_stock, MAX_STOCK)?;
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates cart size (number of lines): at most MAX_CART_ITEMS.
pub fn validate_cart_size(lines: usize) -> ValidationResult<()> {
    if lines > MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("IDM-GRG-001").is_ok());
        assert!(validate_sku("AQUA600").is_ok());
        assert!(validate_sku("teh_botol").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_barcode() {
        assert!(validate_barcode("8998866200301").is_ok());
        assert!(validate_barcode("123").is_err());
        assert!(validate_barcode("8998-866").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(MAX_ITEM_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount("price", Money::zero()).is_ok());
        assert!(validate_amount("price", Money::from_minor(-1)).is_err());
        assert!(validate_amount("price", Money::from_minor(MAX_AMOUNT)).is_ok());
        assert!(matches!(
            validate_amount("unitPrice", Money::from_minor(i64::MAX / 2 + 1)),
            Err(ValidationError::OutOfRange { max: MAX_AMOUNT, .. })
        ));
    }

    #[test]
    fn test_validate_stock_quantity() {
        assert!(validate_stock_quantity(1).is_ok());
        assert!(validate_stock_quantity(MAX_STOCK).is_ok());
        assert!(matches!(
            validate_stock_quantity(0),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(matches!(
            validate_stock_quantity(i64::MAX),
            Err(ValidationError::OutOfRange { max: MAX_STOCK, .. })
        ));
        assert!(validate_stock_level("stock", MAX_STOCK + 1).is_err());
    }

    #[test]
    fn test_validate_stock_bounds() {
        assert!(validate_stock_bounds(10, None).is_ok());
        assert!(validate_stock_bounds(10, Some(100)).is_ok());
        assert!(validate_stock_bounds(10, Some(5)).is_err());
        assert!(validate_stock_bounds(-1, None).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("budi@example.co.id").is_ok());
        assert!(validate_email("budi").is_err());
        assert!(validate_email("budi@localhost").is_err());
        assert!(validate_email("bu di@example.com").is_err());
        assert!(validate_email("@example.com").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+62 812-3456-7890").is_ok());
        assert!(validate_phone("081234567890").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("0812+345678").is_err());
        assert!(validate_phone("phone").is_err());
    }

    #[test]
    fn test_validate_cart_size() {
        assert!(validate_cart_size(MAX_CART_ITEMS).is_ok());
        assert!(validate_cart_size(MAX_CART_ITEMS + 1).is_err());
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query("  indomie ").unwrap(), "indomie");
        assert!(validate_search_query(&"x".repeat(101)).is_err());
    }
}
