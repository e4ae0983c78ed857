//! Fake collaborators shared by the unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use bitcoin::{
    opcodes::all::OP_RETURN,
    script::{Builder, Instruction, PushBytesBuf},
    ScriptBuf,
};
use transit_primitives::prelude::*;

use crate::{
    errors::{TxBuilderError, TxBuilderResult},
    order::{EncodedOrder, OrderRequest},
    traits::{OrderCodec, RuneUtxoSource, UtxoReselector},
};

/// Reselector over a fixed pool: pinned first, then pool entries in order
/// until the target is met.
#[derive(Debug)]
pub(crate) struct PoolReselector {
    pool: Vec<SpendableUnspentOutput>,
}

impl PoolReselector {
    pub(crate) fn new(pool: Vec<SpendableUnspentOutput>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UtxoReselector for PoolReselector {
    async fn reselect(
        &self,
        target: BitcoinAmount,
        pinned: &[SpendableUnspentOutput],
        _last_selected: &[SpendableUnspentOutput],
    ) -> TxBuilderResult<Vec<SpendableUnspentOutput>> {
        let mut selected = pinned.to_vec();
        let mut sum: u64 = selected.iter().map(|u| u.amount().to_sat()).sum();
        for utxo in &self.pool {
            if sum >= target.to_sat() {
                break;
            }
            sum += utxo.amount().to_sat();
            selected.push(utxo.clone());
        }
        Ok(selected)
    }
}

/// Hands out a fixed queue of rune UTXOs, ignoring the requested rune.
#[derive(Debug)]
pub(crate) struct QueueRuneSource {
    queue: Mutex<Vec<RuneUnspentOutput>>,
}

impl QueueRuneSource {
    pub(crate) fn new(mut utxos: Vec<RuneUnspentOutput>) -> Self {
        utxos.reverse();
        Self {
            queue: Mutex::new(utxos),
        }
    }
}

#[async_trait]
impl RuneUtxoSource for QueueRuneSource {
    async fn next_candidate(
        &self,
        _id: RuneId,
        _used: &[OutputRef],
    ) -> TxBuilderResult<Option<RuneUnspentOutput>> {
        Ok(self.queue.lock().unwrap().pop())
    }
}

/// Embeds orders as JSON behind an `OP_RETURN`, so encode/decode genuinely
/// round-trip through the carrier script.
#[derive(Debug)]
pub(crate) struct JsonOrderCodec;

/// Sats the fake codec asks the carrier output to hold.
pub(crate) const CARRIER_AMOUNT: u64 = 600;

#[async_trait]
impl OrderCodec for JsonOrderCodec {
    async fn encode_order(&self, order: &OrderRequest) -> TxBuilderResult<EncodedOrder> {
        let payload = serde_json::to_vec(order)
            .map_err(|e| TxBuilderError::Collaborator(e.to_string()))?;
        let pushed = PushBytesBuf::try_from(payload.clone())
            .map_err(|_| TxBuilderError::Collaborator("payload too large".into()))?;

        let carrier_script = Builder::new()
            .push_opcode(OP_RETURN)
            .push_slice(pushed)
            .into_script();

        Ok(EncodedOrder {
            payload,
            carrier_script,
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
