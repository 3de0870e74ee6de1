//! # Sale Rules
//!
//! Pure checks and formatting for checkout. The atomic write itself lives in
//! `kasir-db::repository::sale`.
//!
//! ## Totals Check
//! ```text
//! subtotal  = Σ (quantity × unitPrice − discount)     per line
//! total     = subtotal + taxAmount − discountAmount
//! ```
//! The client sends all four figures; a sale whose `subtotal` or `total`
//! disagree with its lines is rejected with `InvalidTotals` before any write.
//! `taxAmount` is trusted as sent (the tax rate is a client setting).

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult};
use crate::input::{out_of_range, SaleInput};
use crate::money::Money;

/// Verifies the client-computed totals against the cart lines.
///
/// ## Example
/// ```rust
/// use kasir_core::input::{SaleInput, SaleLineInput};
/// use kasir_core::money::Money;
/// use kasir_core::sale::verify_totals;
/// use kasir_core::types::PaymentMethod;
///
/// let input = SaleInput {
///     items: vec![SaleLineInput {
///         product_id: "p-1".into(),
///         quantity: 2,
///         unit_price: Money::from_minor(25_000),
///         discount: Money::zero(),
///     }],
///     customer_id: None,
///     payment_method: PaymentMethod::Cash,
///     subtotal: Money::from_minor(50_000),
///     tax_amount: Money::from_minor(5_500),
///     discount_amount: Money::zero(),
///     total: Money::from_minor(55_500),
///     notes: None,
/// };
/// assert!(verify_totals(&input).is_ok());
/// ```
pub fn verify_totals(input: &SaleInput) -> CoreResult<()> {
    let mut subtotal = Money::zero();
    for line in &input.items {
        subtotal = subtotal
            .checked_add(line.net_total()?)
            .ok_or_else(|| out_of_range("subtotal"))?;
    }
    if subtotal != input.subtotal {
        return Err(CoreError::InvalidTotals {
            field: "subtotal".to_string(),
            expected: subtotal.minor(),
            actual: input.subtotal.minor(),
        });
    }

    let total = subtotal
        .checked_add(input.tax_amount)
        .and_then(|total| total.checked_sub(input.discount_amount))
        .ok_or_else(|| out_of_range("total"))?;
    if total != input.total {
        return Err(CoreError::InvalidTotals {
            field: "total".to_string(),
            expected: total.minor(),
            actual: input.total.minor(),
        });
    }

    Ok(())
}

/// Receipt number: `TRX` + `yyyymmddHHMMSS` (UTC) + 4 digits.
///
/// `suffix` is reduced modulo 10 000; callers pass a random number.
/// Collisions within the same second are possible but unlikely.
///
/// ## Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use kasir_core::sale::transaction_number;
///
/// let at = Utc.with_ymd_and_hms(2026, 10, 16, 14, 30, 5).unwrap();
/// assert_eq!(transaction_number(at, 427), "TRX202610161430050427");
/// ```
pub fn transaction_number(at: DateTime<Utc>, suffix: u32) -> String {
    format!("TRX{}{:04}", at.format("%Y%m%d%H%M%S"), suffix % 10_000)
}

/// Reason recorded on the SALE movement of each line.
pub fn sale_movement_reason(transaction_number: &str) -> String {
    format!("Penjualan {}", transaction_number)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::SaleLineInput;
    use crate::types::PaymentMethod;
    use chrono::TimeZone;

    fn input(subtotal: i64, tax: i64, discount: i64, total: i64) -> SaleInput {
        SaleInput {
            items: vec![
                SaleLineInput {
                    product_id: "p-1".to_string(),
                    quantity: 2,
                    unit_price: Money::from_minor(25_000),
                    discount: Money::from_minor(1_000),
                },
                SaleLineInput {
                    product_id: "p-2".to_string(),
                    quantity: 1,
                    unit_price: Money::from_minor(3_500),
                    discount: Money::zero(),
                },
            ],
            customer_id: None,
            payment_method: PaymentMethod::Qris,
            subtotal: Money::from_minor(subtotal),
            tax_amount: Money::from_minor(tax),
            discount_amount: Money::from_minor(discount),
            total: Money::from_minor(total),
            notes: None,
        }
    }

    #[test]
    fn test_matching_totals_accepted() {
        // 50_000 - 1_000 + 3_500 = 52_500
        assert!(verify_totals(&input(52_500, 5_250, 2_500, 55_250)).is_ok());
    }

    #[test]
    fn test_tampered_subtotal_rejected() {
        let err = verify_totals(&input(10_000, 0, 0, 10_000)).unwrap_err();
        match err {
            CoreError::InvalidTotals {
                field,
                expected,
                actual,
            } => {
                assert_eq!(field, "subtotal");
                assert_eq!(expected, 52_500);
                assert_eq!(actual, 10_000);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_tampered_total_rejected() {
        let err = verify_totals(&input(52_500, 5_250, 0, 1)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTotals { ref field, .. } if field == "total"));
    }

    #[test]
    fn test_overflowing_cart_is_rejected() {
        use crate::error::ValidationError;

        let mut sale = input(0, 0, 0, 0);
        sale.items[0].unit_price = Money::from_minor(i64::MAX / 2 + 1);
        assert!(matches!(
            verify_totals(&sale),
            Err(CoreError::Validation(ValidationError::OutOfRange { ref field, .. })) if field == "unitPrice"
        ));

        let mut sale = input(0, 0, 0, 0);
        sale.items[1].unit_price = Money::from_minor(i64::MAX);
        assert!(matches!(
            verify_totals(&sale),
            Err(CoreError::Validation(ValidationError::OutOfRange { ref field, .. })) if field == "subtotal"
        ));

        assert!(matches!(
            verify_totals(&input(52_500, i64::MAX, 0, 0)),
            Err(CoreError::Validation(ValidationError::OutOfRange { ref field, .. })) if field == "total"
        ));
    }

    #[test]
    fn test_transaction_number_format() {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(transaction_number(at, 7), "TRX202601020304050007");
        assert_eq!(transaction_number(at, 123_456), "TRX202601020304053456");
        assert_eq!(transaction_number(at, 7).len(), 21);
    }

    #[test]
    fn test_sale_movement_reason() {
        assert_eq!(
            sale_movement_reason("TRX202601020304050007"),
            "Penjualan TRX202601020304050007"
        );
    }
}
