//! Errors during parsing/handling/conversion of primitives.

use rust_decimal::Decimal;
use thiserror::Error;

/// Parsing errors that can occur with L1 primitives such as rune identifiers
/// and human-denominated amounts.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    /// The provided string is not a valid `block:tx` rune identifier.
    #[error("invalid rune id: {0}")]
    InvalidRuneId(String),

    /// A human-denominated rune amount does not fit the raw integer width
    /// once scaled by the rune's divisibility.
    #[error("rune amount {amount} out of range for divisibility {divisibility}")]
    RuneAmountOutOfRange {
        /// The amount that failed to convert.
        amount: Decimal,
        /// Number of implied decimal places of the rune.
        divisibility: u8,
    },
}
