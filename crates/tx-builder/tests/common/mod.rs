//! Fake collaborators for the integration tests.

use std::collections::HashMap;

use async_trait::async_trait;
use bitcoin::{
    opcodes::all::OP_RETURN,
    script::{Builder, Instruction, PushBytesBuf},
    ScriptBuf,
};
use transit_primitives::prelude::*;
use transit_tx_builder::prelude::*;

/// Sats the fake codec asks the carrier output to hold.
pub const CARRIER_AMOUNT: u64 = 600;

/// Embeds orders as JSON behind an `OP_RETURN`.
#[derive(Debug)]
pub struct JsonOrderCodec;

#[async_trait]
impl OrderCodec for JsonOrderCodec {
    async fn encode_order(&self, order: &OrderRequest) -> TxBuilderResult<EncodedOrder> {
        let payload = serde_json::to_vec(order)
            .map_err(|e| TxBuilderError::Collaborator(e.to_string()))?;
        let pushed = PushBytesBuf::try_from(payload.clone())
            .map_err(|_| TxBuilderError::Collaborator("payload too large".into()))?;

        Ok(EncodedOrder {
            payload,
            carrier_script: Builder::new()
                .push_opcode(OP_RETURN)
                .push_slice(pushed)
                .into_script(),
            carrier_amount: BitcoinAmount::from_sat(CARRIER_AMOUNT),
        })
    }

    async fn decode_order(&self, carrier_script: &ScriptBuf) -> TxBuilderResult<OrderRequest> {
        let payload = carrier_script
            .instructions()
            .flatten()
            .find_map(|instruction| match instruction {
                Instruction::PushBytes(bytes) if !bytes.is_empty() => {
                    Some(bytes.as_bytes().to_vec())
                }
                _ => None,
            })
            .ok_or_else(|| TxBuilderError::Collaborator("no payload in carrier".into()))?;

        serde_json::from_slice(&payload).map_err(|e| TxBuilderError::Collaborator(e.to_string()))
    }
}

/// Fills each requested input with a dummy witness, mimicking a signer that
/// authorizes exactly the listed inputs and nothing else.
#[derive(Debug)]
pub struct DummySigner;

#[async_trait]
impl TxSigner for DummySigner {
    async fn sign(
        &self,
        signing_data: &TxSigningData,
        scopes: &[InputScope],
    ) -> TxBuilderResult<bitcoin::Transaction> {
        let mut tx = signing_data.unsigned_tx.clone();
        for entry in scopes {
            let input = tx
                .input
                .get_mut(entry.input_index as usize)
                .ok_or_else(|| TxBuilderError::Collaborator("scope for missing input".into()))?;
            let mut signature = vec![0u8; 64];
            signature.push(entry.scope.to_taproot() as u8);
            input.witness.push(signature);
        }
        Ok(tx)
    }
}

/// Accepts everything and reports the txid.
#[derive(Debug)]
pub struct NullBroadcaster;

#[async_trait]
impl TxBroadcaster for NullBroadcaster {
    async fn broadcast(&self, tx: &bitcoin::Transaction) -> TxBuilderResult<bitcoin::Txid> {
        Ok(tx.compute_txid())
    }
}

/// A wallet-backed reselector: ranks its confirmed pool with
/// [`select_coins`] and hydrates the chosen outputs back into spendable
/// form, the way a real indexer-backed implementation would.
#[derive(Debug)]
pub struct WalletReselector {
    pool: Vec<ConfirmedUnspentOutput>,
    by_outpoint: HashMap<OutputRef, SpendableUnspentOutput>,
}

impl WalletReselector {
    pub fn new(wallet: Vec<(SpendableUnspentOutput, u64)>) -> Self {
        let pool = wallet
            .iter()
            .map(|(utxo, height)| ConfirmedUnspentOutput::new(*utxo.output(), *height))
            .collect();
        let by_outpoint = wallet
            .into_iter()
            .map(|(utxo, _)| (utxo.outpoint(), utxo))
            .collect();
        Self { pool, by_outpoint }
    }
}

#[async_trait]
impl UtxoReselector for WalletReselector {
    async fn reselect(
        &self,
        target: BitcoinAmount,
        pinned: &[SpendableUnspentOutput],
        _last_selected: &[SpendableUnspentOutput],
    ) -> TxBuilderResult<Vec<SpendableUnspentOutput>> {
        let pinned_plain: Vec<UnspentOutput> =
            pinned.iter().map(|utxo| *utxo.output()).collect();
        let pool: Vec<ConfirmedUnspentOutput> = self
            .pool
            .iter()
            .filter(|candidate| {
                pinned
                    .iter()
                    .all(|p| p.outpoint() != candidate.output().outpoint())
            })
            .copied()
            .collect();

        let chosen = select_coins(target, &pinned_plain, &pool);

        let mut selected = pinned.to_vec();
        for utxo in chosen.iter().skip(pinned.len()) {
            let spendable = self
                .by_outpoint
                .get(&utxo.outpoint())
                .ok_or_else(|| TxBuilderError::Collaborator("unknown outpoint".into()))?;
            selected.push(spendable.clone());
        }
        Ok(selected)
    }
}
