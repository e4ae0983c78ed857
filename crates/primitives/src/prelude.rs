//! Re-exports of the commonly used primitives.

pub use crate::{
    amount::BitcoinAmount,
    errors::ParseError,
    outpoint::OutputRef,
    runes::{RuneAmount, RuneId},
    utxo::{
        ConfirmedUnspentOutput, Recipient, RuneUnspentOutput, SpendShape, SpendableUnspentOutput,
        UnspentOutput,
    },
};
