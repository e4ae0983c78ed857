//! Collaborator contracts the core suspends on.
//!
//! These are the only suspension points of the build: UTXO reselection,
//! rune-UTXO lookup, order encoding/decoding, signing and broadcast. The
//! core owns none of their implementations; callers inject them, typically
//! backed by a remote indexer or the bridge backend.

use async_trait::async_trait;
use bitcoin::{ScriptBuf, Transaction, Txid};
use transit_primitives::prelude::*;

use crate::{
    assemble::TxSigningData,
    errors::TxBuilderResult,
    order::{EncodedOrder, OrderRequest},
    sighash::InputScope,
};

/// Supplies ever-larger spendable input sets to the fee convergence loop.
#[async_trait]
pub trait UtxoReselector: Send + Sync {
    /// Select spendable outputs worth at least `target` sats.
    ///
    /// `pinned` outputs must always be part of the result; `last_selected`
    /// is the previous round's selection, which implementations may extend
    /// instead of recomputing. Must be safe to call repeatedly with a
    /// growing `target`.
    async fn reselect(
        &self,
        target: BitcoinAmount,
        pinned: &[SpendableUnspentOutput],
        last_selected: &[SpendableUnspentOutput],
    ) -> TxBuilderResult<Vec<SpendableUnspentOutput>>;
}

/// Supplies rune-carrying UTXOs one candidate at a time.
#[async_trait]
pub trait RuneUtxoSource: Send + Sync {
    /// The next unused candidate carrying `id`, or `None` when the wallet
    /// holds no more.
    ///
    /// `used` lists the outputs already drawn by this build; candidates in
    /// it must not be returned again.
    async fn next_candidate(
        &self,
        id: RuneId,
        used: &[OutputRef],
    ) -> TxBuilderResult<Option<RuneUnspentOutput>>;
}

/// Encodes orders into carrier outputs and decodes them back.
#[async_trait]
pub trait OrderCodec: Send + Sync {
    /// Encode an order into its opaque payload and carrier output.
    async fn encode_order(&self, order: &OrderRequest) -> TxBuilderResult<EncodedOrder>;

    /// Decode the order embedded in a carrier output's script.
    async fn decode_order(&self, carrier_script: &ScriptBuf) -> TxBuilderResult<OrderRequest>;
}

/// Produces signatures for a built transaction.
#[async_trait]
pub trait TxSigner: Send + Sync {
    /// Sign the unsigned transaction, authorizing exactly the listed inputs
    /// under their assigned signature scopes.
    ///
    /// Implementations must not reorder inputs or outputs.
    async fn sign(
        &self,
        signing_data: &TxSigningData,
        scopes: &[InputScope],
    ) -> TxBuilderResult<Transaction>;
}

/// Submits final signed transactions to the network.
#[async_trait]
pub trait TxBroadcaster: Send + Sync {
    /// Broadcast the transaction, returning its id.
    ///
    /// The core never retries a broadcast; retry policy belongs to the
    /// implementation or its caller.
    async fn broadcast(&self, tx: &Transaction) -> TxBuilderResult<Txid>;
}
