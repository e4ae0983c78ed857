//! Enumerated errors raised while constructing bridge transactions.

use thiserror::Error;
use transit_primitives::prelude::*;

/// Error during construction of a bridge transaction.
///
/// Every variant is terminal for the build except
/// [`TxBuilderError::OrderValidationFailed`], which callers may opt into
/// tolerating (see [`crate::validation`]).
#[derive(Debug, Error)]
pub enum TxBuilderError {
    /// Coin selection cannot reach the required sum.
    #[error("insufficient spendable balance (need {required} sats, have {available} sats)")]
    InsufficientBalance {
        /// Sats the transaction needs to cover outputs and fee.
        required: u64,
        /// Sats the selection was able to gather.
        available: u64,
    },

    /// Rune selection exhausted its candidates while still short.
    #[error("insufficient balance of rune {id} (short {missing} raw units)")]
    InsufficientRuneBalance {
        /// The rune that could not be covered.
        id: RuneId,
        /// Raw units still missing when candidates ran out.
        missing: u128,
    },

    /// The size estimator cannot model the spending condition of an input.
    #[error("cannot estimate input size for {outpoint}")]
    UnsupportedInputType {
        /// Identity of the offending input.
        outpoint: OutputRef,
    },

    /// A required field for the chosen route was not supplied.
    ///
    /// Raised before any collaborator is called.
    #[error("missing or invalid parameter: {0}")]
    InvalidParameters(&'static str),

    /// The order payload embedded in the built transaction does not match
    /// the request.
    #[error("order embedded in transaction does not match the request: {reason}")]
    OrderValidationFailed {
        /// Human-readable description of the mismatch.
        reason: String,
    },

    /// A collaborator (reselector, rune source, order codec, signer,
    /// broadcaster) failed.
    #[error("collaborator call failed: {0}")]
    Collaborator(String),

    /// A primitive failed to parse or convert.
    #[error("invalid primitive: {0}")]
    Parse(#[from] ParseError),
}

/// Result type alias that has [`TxBuilderError`] as the error type for
/// succinctness.
pub type TxBuilderResult<T> = Result<T, TxBuilderError>;
