//! Final raw-transaction assembly.
//!
//! This is a pure data-shape translation: resolved inputs, recipients and
//! auxiliary scripts become a [`Transaction`] plus the per-input data the
//! external signer needs. No validation happens here beyond what
//! [`bitcoin`] itself enforces.

use bitcoin::{
    absolute::LockTime, transaction, Amount, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness,
};
use serde::{Deserialize, Serialize};
use transit_primitives::prelude::*;

use crate::fee::TransactionPlan;

/// Options affecting how the raw transaction is laid down.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct AssembleOptions {
    /// Mark every input replaceable by fee.
    ///
    /// When unset, sequences stay at the protocol default (non-replaceable).
    pub enable_rbf: bool,
}

impl AssembleOptions {
    fn sequence(&self) -> Sequence {
        if self.enable_rbf {
            Sequence::ENABLE_RBF_NO_LOCKTIME
        } else {
            Sequence::MAX
        }
    }
}

/// Everything the external signer needs to produce a fully-signed
/// transaction.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TxSigningData {
    /// The unsigned transaction (with the `script_sig` and `witness` fields
    /// not set).
    pub unsigned_tx: Transaction,

    /// The prevout of each input in the unsigned transaction respectively.
    pub prevouts: Vec<TxOut>,

    /// How each input will be spent, in the same order; carries the
    /// internal key for key-path spends and the redeem/witness script for
    /// script-hash spends.
    pub spend_shapes: Vec<SpendShape>,
}

/// Create a transaction spending `inputs` into `recipients` plus one
/// zero-value output per auxiliary script.
pub fn assemble_tx(
    inputs: &[SpendableUnspentOutput],
    recipients: &[Recipient],
    op_return_scripts: &[ScriptBuf],
    options: &AssembleOptions,
) -> Transaction {
    let tx_ins = create_tx_ins(inputs, options.sequence());

    let mut tx_outs: Vec<TxOut> = recipients
        .iter()
        .map(|recipient| TxOut {
            script_pubkey: recipient.script_pubkey().clone(),
            value: recipient.amount().into(),
        })
        .collect();
    tx_outs.extend(op_return_scripts.iter().map(|script| TxOut {
        script_pubkey: script.clone(),
        value: Amount::ZERO,
    }));

    Transaction {
        version: transaction::Version(2),
        lock_time: LockTime::ZERO,
        input: tx_ins,
        output: tx_outs,
    }
}

/// Assemble a converged [`TransactionPlan`] into signing data.
///
/// Output order is the plan's recipients, then the network-change output
/// when one exists, then the auxiliary scripts.
pub fn assemble_plan(plan: &TransactionPlan, options: &AssembleOptions) -> TxSigningData {
    let mut recipients = plan.recipients.clone();
    if plan.change_amount > BitcoinAmount::ZERO {
        recipients.push(Recipient::new(plan.change_script.clone(), plan.change_amount));
    }

    let unsigned_tx = assemble_tx(&plan.inputs, &recipients, &plan.op_return_scripts, options);

    let prevouts = plan
        .inputs
        .iter()
        .map(|utxo| TxOut {
            script_pubkey: utxo.script_pubkey().clone(),
            value: utxo.amount().into(),
        })
        .collect();
    let spend_shapes = plan
        .inputs
        .iter()
        .map(|utxo| utxo.spend_shape().clone())
        .collect();

    TxSigningData {
        unsigned_tx,
        prevouts,
        spend_shapes,
    }
}

fn create_tx_ins(inputs: &[SpendableUnspentOutput], sequence: Sequence) -> Vec<TxIn> {
    inputs
        .iter()
        .map(|utxo| TxIn {
            previous_output: *utxo.outpoint().outpoint(),
            sequence,
            script_sig: ScriptBuf::default(),
            witness: Witness::new(),
        })
        .collect()
}
