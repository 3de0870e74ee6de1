//! # Stock Rules
//!
//! Pure stock arithmetic shared by the adjustment service and the dashboard.
//!
//! ## Adjustment Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  current stock = 50                                                     │
//! │                                                                         │
//! │  IN          quantity 10  →  60                                        │
//! │  OUT         quantity 10  →  40                                        │
//! │  OUT         quantity 60  →  -10  ✗ NegativeStock, nothing written      │
//! │  ADJUSTMENT  quantity 12  →  12   (absolute level after a stock count) │
//! │                                                                         │
//! │  The movement row always records the quantity as provided.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::MovementType;
use crate::MAX_STOCK;

/// Computes the stock level after applying a movement.
///
/// ## Errors
/// - `Validation` when `quantity` is not positive, or the result would
///   exceed [`MAX_STOCK`]
/// - `NegativeStock` when the result would be below zero
///
/// ## Example
/// ```rust
/// use kasir_core::stock::resolve_adjustment;
/// use kasir_core::types::MovementType;
///
/// assert_eq!(resolve_adjustment(50, MovementType::In, 10).unwrap(), 60);
/// assert_eq!(resolve_adjustment(50, MovementType::Adjustment, 12).unwrap(), 12);
/// assert!(resolve_adjustment(50, MovementType::Out, 60).is_err());
/// ```
pub fn resolve_adjustment(current: i64, kind: MovementType, quantity: i64) -> CoreResult<i64> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into());
    }

    let result = match kind {
        MovementType::In => current.checked_add(quantity),
        MovementType::Out | MovementType::Sale => current.checked_sub(quantity),
        MovementType::Adjustment => Some(quantity),
    };

    match result {
        Some(result) if result < 0 => Err(CoreError::NegativeStock { current, result }),
        Some(result) if result <= MAX_STOCK => Ok(result),
        _ => Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_STOCK,
        }
        .into()),
    }
}

/// Signed effect of one movement on the running stock total.
///
/// `ADJUSTMENT` stores an absolute level rather than a delta, so it has no
/// sign and contributes nothing.
pub fn signed_delta(kind: MovementType, quantity: i64) -> i64 {
    match kind {
        MovementType::In => quantity,
        MovementType::Out | MovementType::Sale => -quantity,
        MovementType::Adjustment => 0,
    }
}

/// Net stock change over a set of movements.
pub fn net_delta<I>(movements: I) -> i64
where
    I: IntoIterator<Item = (MovementType, i64)>,
{
    movements
        .into_iter()
        .map(|(kind, quantity)| signed_delta(kind, quantity))
        .sum()
}

/// Total stock at the start of the day, inferred from the current total and
/// today's movements.
///
/// This is an approximation: backdated or corrected movements make it drift,
/// and it is not a point-in-time snapshot.
pub fn previous_total(current_total: i64, todays_net_delta: i64) -> i64 {
    current_total - todays_net_delta
}

// =============================================================================
// Unit Tests
// =============================================================================
