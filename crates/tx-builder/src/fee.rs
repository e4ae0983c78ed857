//! Network-fee estimation and the fee/input-set convergence loop.
//!
//! Adding inputs to cover a higher fee can itself raise the fee (more
//! witness data), so the fee and the input set are mutually recursive. The
//! loop here iterates both to a fixed point: estimate the size, compute the
//! fee, widen the selection if it falls short, repeat. It terminates because
//! every reselection must strictly grow the selected sum; a selection that
//! stops growing means the pool is exhausted.

use bitcoin::{ScriptBuf, Transaction};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use transit_primitives::prelude::*;

use crate::{
    assemble::{assemble_tx, AssembleOptions},
    errors::{TxBuilderError, TxBuilderResult},
    traits::UtxoReselector,
};

/// The min relay fee floor in sats, applied to every computed fee.
pub const MIN_RELAY_FEE: BitcoinAmount = BitcoinAmount::from_sat(1000);

/// Guard against pathological reselector behavior; selection never
/// legitimately needs anywhere near this many widening rounds.
pub const MAX_SELECTION_ROUNDS: usize = 500;

/// Bytes a signature contributes to a legacy or segwit-v0 witness/script_sig.
const DER_SIGNATURE_SIZE: usize = 72;
/// Bytes of a compressed pubkey.
const COMPRESSED_PUBKEY_SIZE: usize = 33;
/// Bytes of a schnorr signature in a keypath witness.
const SCHNORR_SIGNATURE_SIZE: usize = 64;

/// A converged transaction blueprint.
///
/// Upholds conservation exactly:
/// `sum(inputs) == sum(recipients) + fee + change_amount`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TransactionPlan {
    /// Inputs funding the transaction, pinned ones first.
    pub inputs: Vec<SpendableUnspentOutput>,

    /// Recipients after dust clamping, in final output order.
    pub recipients: Vec<Recipient>,

    /// Auxiliary scripts emitted as zero-value outputs after the change.
    pub op_return_scripts: Vec<ScriptBuf>,

    /// Script the change output pays to.
    pub change_script: ScriptBuf,

    /// Change returned to the sender; zero when none is emitted.
    pub change_amount: BitcoinAmount,

    /// The network fee the plan pays.
    pub fee: BitcoinAmount,

    /// Virtual size the fee was computed from.
    pub estimated_vsize: u64,

    /// Whether sub-dust change was folded into the fee, raising it above
    /// the requested rate.
    pub fee_absorbed_dust: bool,
}

impl TransactionPlan {
    /// Total value consumed by the plan's inputs.
    pub fn total_input(&self) -> BitcoinAmount {
        self.inputs.iter().map(|utxo| utxo.amount()).sum()
    }

    /// Total value delivered to recipients.
    pub fn total_sent(&self) -> BitcoinAmount {
        self.recipients
            .iter()
            .map(|recipient| recipient.amount())
            .sum()
    }
}

/// What [`prepare_plan`] needs from the caller.
#[derive(Clone, Debug)]
pub struct PlanRequest {
    /// Outputs the transaction must pay, in final order. Amounts below a
    /// script's dust threshold are raised to it.
    pub recipients: Vec<Recipient>,

    /// Script change returns to.
    pub change_script: ScriptBuf,

    /// Auxiliary scripts appended as zero-value outputs.
    pub op_return_scripts: Vec<ScriptBuf>,

    /// Inputs that must be spent regardless of value (rune carriers,
    /// inscription singletons, counter-party placeholders).
    pub pinned: Vec<SpendableUnspentOutput>,

    /// Fee rate in sats per virtual byte.
    pub fee_rate: u64,
}

/// Iterate selection and fee to a fixed point.
///
/// Fails with [`TxBuilderError::InsufficientBalance`] when the reselector
/// stops making progress (its sum does not strictly grow) or after
/// [`MAX_SELECTION_ROUNDS`] widenings.
pub async fn prepare_plan(
    request: PlanRequest,
    reselector: &dyn UtxoReselector,
) -> TxBuilderResult<TransactionPlan> {
    let recipients: Vec<Recipient> = request
        .recipients
        .into_iter()
        .map(Recipient::clamped_to_dust)
        .collect();
    let sats_to_send: u64 = recipients
        .iter()
        .map(|recipient| recipient.amount().to_sat())
        .sum();

    // The change output is part of every estimate; if it ends up sub-dust it
    // is folded into the fee below, which only overpays.
    let mut estimated_recipients = recipients.clone();
    estimated_recipients.push(Recipient::new(
        request.change_script.clone(),
        BitcoinAmount::ZERO,
    ));

    let mut selected = request.pinned.clone();
    let mut rounds = 0usize;

    let (fee, estimated_vsize) = loop {
        let vsize = estimate_vsize(
            &selected,
            &estimated_recipients,
            &request.op_return_scripts,
        )?;
        let fee = request
            .fee_rate
            .saturating_mul(vsize)
            .max(MIN_RELAY_FEE.to_sat());

        let available: u64 = selected.iter().map(|utxo| utxo.amount().to_sat()).sum();
        let required = sats_to_send + fee;
        if available >= required {
            break (fee, vsize);
        }

        if rounds >= MAX_SELECTION_ROUNDS {
            return Err(TxBuilderError::InsufficientBalance {
                required,
                available,
            });
        }
        rounds += 1;

        let widened = reselector
            .reselect(
                BitcoinAmount::from_sat(required),
                &request.pinned,
                &selected,
            )
            .await?;
        let widened_sum: u64 = widened.iter().map(|utxo| utxo.amount().to_sat()).sum();

        // No strict growth means the pool has nothing more to give.
        if widened_sum <= available {
            return Err(TxBuilderError::InsufficientBalance {
                required,
                available: widened_sum.max(available),
            });
        }

        debug!(round = rounds, required, selected = widened_sum, "widened input selection");
        selected = widened;
    };

    let total_input: u64 = selected.iter().map(|utxo| utxo.amount().to_sat()).sum();
    let mut fee = fee;
    let mut change_amount = total_input - sats_to_send - fee;
    let mut fee_absorbed_dust = false;

    let change_floor = request.change_script.minimal_non_dust().to_sat();
    if change_amount > 0 && change_amount < change_floor {
        warn!(
            change_amount,
            change_floor, "folding sub-dust change into the fee"
        );
        fee = total_input - sats_to_send;
        change_amount = 0;
        fee_absorbed_dust = true;
    }

    Ok(TransactionPlan {
        inputs: selected,
        recipients,
        op_return_scripts: request.op_return_scripts,
        change_script: request.change_script,
        change_amount: BitcoinAmount::from_sat(change_amount),
        fee: BitcoinAmount::from_sat(fee),
        estimated_vsize,
        fee_absorbed_dust,
    })
}

/// Estimate the virtual size of the transaction spending `inputs` into
/// `recipients` and `op_return_scripts`.
///
/// Builds the transaction skeleton and fills each input with the witness or
/// script_sig template of its spending shape, then measures. Shapes whose
/// witness cannot be templated fail with
/// [`TxBuilderError::UnsupportedInputType`].
pub fn estimate_vsize(
    inputs: &[SpendableUnspentOutput],
    recipients: &[Recipient],
    op_return_scripts: &[ScriptBuf],
) -> TxBuilderResult<u64> {
    let mut tx = assemble_tx(
        inputs,
        recipients,
        op_return_scripts,
        &AssembleOptions::default(),
    );
    fill_placeholder_signatures(&mut tx, inputs)?;
    Ok(tx.vsize() as u64)
}

fn fill_placeholder_signatures(
    tx: &mut Transaction,
    inputs: &[SpendableUnspentOutput],
) -> TxBuilderResult<()> {
    for (tx_in, utxo) in tx.input.iter_mut().zip(inputs) {
        match utxo.spend_shape() {
            SpendShape::P2pkh => {
                // <sig> <pubkey>
                tx_in.script_sig = placeholder_script(&[DER_SIGNATURE_SIZE, COMPRESSED_PUBKEY_SIZE]);
            }
            SpendShape::P2shP2wpkh { redeem_script } => {
                tx_in.script_sig = placeholder_script(&[redeem_script.len()]);
                tx_in.witness.push(vec![0u8; DER_SIGNATURE_SIZE]);
                tx_in.witness.push(vec![0u8; COMPRESSED_PUBKEY_SIZE]);
            }
            SpendShape::P2wpkh => {
                tx_in.witness.push(vec![0u8; DER_SIGNATURE_SIZE]);
                tx_in.witness.push(vec![0u8; COMPRESSED_PUBKEY_SIZE]);
            }
            SpendShape::P2tr { .. } => {
                tx_in.witness.push(vec![0u8; SCHNORR_SIGNATURE_SIZE]);
            }
            SpendShape::P2wsh { .. } => {
                // arbitrary witness stacks are not templated
                return Err(TxBuilderError::UnsupportedInputType {
                    outpoint: utxo.outpoint(),
                });
            }
        }
    }

    Ok(())
}

/// A script_sig consisting of pushes of the given sizes.
fn placeholder_script(push_sizes: &[usize]) -> ScriptBuf {
    let mut builder = bitcoin::script::Builder::new();
    for size in push_sizes {
        builder = builder.push_slice(
            bitcoin::script::PushBytesBuf::try_from(vec![0u8; *size])
                .expect("placeholder push fits the script size limit"),
        );
    }
    builder.into_script()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use transit_test_utils::btc::{spendable_output as spendable, test_txid, wpkh_script};

    use super::*;

    /// Reselector over a fixed pool: returns pinned plus pool entries in
    /// order until the target is met.
    struct PoolReselector {
        pool: Vec<SpendableUnspentOutput>,
        calls: Mutex<usize>,
    }

    impl PoolReselector {
        fn new(pool: Vec<SpendableUnspentOutput>) -> Self {
            Self {
                pool,
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
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
            *self.calls.lock().unwrap() += 1;

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

    fn request(recipient_sats: u64, pinned_sats: u64, fee_rate: u64) -> PlanRequest {
        PlanRequest {
            recipients: vec![Recipient::new(
                wpkh_script(77),
                BitcoinAmount::from_sat(recipient_sats),
            )],
            change_script: wpkh_script(78),
            op_return_scripts: vec![],
            pinned: vec![spendable(1, pinned_sats)],
            fee_rate,
        }
    }

    fn assert_conserved(plan: &TransactionPlan) {
        assert_eq!(
            plan.total_input().to_sat(),
            plan.total_sent().to_sat() + plan.fee.to_sat() + plan.change_amount.to_sat(),
        );
    }

    #[tokio::test]
    async fn pinned_cover_everything_without_reselection() {
        let reselector = PoolReselector::new(vec![]);
        let plan = prepare_plan(request(5_000, 10_000, 10), &reselector)
            .await
            .unwrap();

        assert_eq!(reselector.calls(), 0, "pinned funds suffice");
        assert_eq!(plan.inputs.len(), 1);
        assert_eq!(plan.fee.to_sat(), MIN_RELAY_FEE.to_sat().max(10 * plan.estimated_vsize));
        assert_eq!(
            plan.change_amount.to_sat(),
            10_000 - 5_000 - plan.fee.to_sat()
        );
        assert!(!plan.fee_absorbed_dust);
        assert_conserved(&plan);
    }

    #[tokio::test]
    async fn min_relay_fee_floor_applies() {
        // one tiny input and output at 1 sat/vB lands well under the floor
        let reselector = PoolReselector::new(vec![]);
        let plan = prepare_plan(request(5_000, 10_000, 1), &reselector)
            .await
            .unwrap();

        assert_eq!(plan.fee, MIN_RELAY_FEE);
        assert_conserved(&plan);
    }

    #[tokio::test]
    async fn widens_selection_until_covered() {
        let pool = vec![spendable(2, 4_000), spendable(3, 4_000), spendable(4, 4_000)];
        let reselector = PoolReselector::new(pool);

        let plan = prepare_plan(request(8_000, 2_000, 2), &reselector)
            .await
            .unwrap();

        assert!(reselector.calls() >= 1);
        assert!(plan.inputs.len() > 1);
        assert_eq!(plan.inputs[0], spendable(1, 2_000), "pinned stay first");
        assert_conserved(&plan);
    }

    #[tokio::test]
    async fn stalled_selection_is_insufficient_balance() {
        // pool adds nothing; the reselector keeps returning just the pinned set
        let reselector = PoolReselector::new(vec![]);
        let err = prepare_plan(request(8_000, 7_000, 10), &reselector)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TxBuilderError::InsufficientBalance { available: 7_000, .. }
        ));
        assert_eq!(reselector.calls(), 1, "fails on the first stalled round");
    }

    #[tokio::test]
    async fn sub_dust_change_folds_into_fee() {
        // change after fee lands below the p2wpkh dust floor (294 sats)
        let reselector = PoolReselector::new(vec![]);
        let mut req = request(5_000, 6_100, 1);
        req.recipients[0] = Recipient::new(wpkh_script(77), BitcoinAmount::from_sat(5_000));
        let plan = prepare_plan(req, &reselector).await.unwrap();

        assert_eq!(plan.change_amount, BitcoinAmount::ZERO);
        assert_eq!(plan.fee.to_sat(), 1_100, "change joined the fee");
        assert!(plan.fee_absorbed_dust);
        assert_conserved(&plan);
    }

    #[tokio::test]
    async fn recipients_are_raised_to_dust() {
        let reselector = PoolReselector::new(vec![]);
        let mut req = request(1, 10_000, 1);
        req.recipients[0] = Recipient::new(wpkh_script(77), BitcoinAmount::from_sat(1));
        let plan = prepare_plan(req, &reselector).await.unwrap();

        let floor = wpkh_script(77).minimal_non_dust().to_sat();
        assert_eq!(plan.recipients[0].amount().to_sat(), floor);
        assert_conserved(&plan);
    }

    #[tokio::test]
    async fn unsupported_shape_names_the_input() {
        let outpoint = OutputRef::new(test_txid(42), 9);
        let script_utxo = SpendableUnspentOutput::new(
            UnspentOutput::new(outpoint, BitcoinAmount::from_sat(10_000)),
            wpkh_script(5),
            SpendShape::P2wsh {
                witness_script: wpkh_script(6),
            },
        );

        let reselector = PoolReselector::new(vec![]);
        let req = PlanRequest {
            recipients: vec![Recipient::new(
                wpkh_script(77),
                BitcoinAmount::from_sat(5_000),
            )],
            change_script: wpkh_script(78),
            op_return_scripts: vec![],
            pinned: vec![script_utxo],
            fee_rate: 1,
        };

        let err = prepare_plan(req, &reselector).await.unwrap_err();
        assert!(
            matches!(err, TxBuilderError::UnsupportedInputType { outpoint: o } if o == outpoint)
        );
    }

    #[test]
    fn estimate_orders_shapes_by_weight() {
        let recipients = vec![Recipient::new(
            wpkh_script(77),
            BitcoinAmount::from_sat(5_000),
        )];
        let sized = |shape: SpendShape| {
            let utxo = SpendableUnspentOutput::new(
                UnspentOutput::new(OutputRef::new(test_txid(9), 0), BitcoinAmount::from_sat(10_000)),
                wpkh_script(9),
                shape,
            );
            estimate_vsize(&[utxo], &recipients, &[]).unwrap()
        };

        let p2tr = sized(SpendShape::P2tr { internal_key: None });
        let p2wpkh = sized(SpendShape::P2wpkh);
        let wrapped = sized(SpendShape::P2shP2wpkh {
            redeem_script: wpkh_script(9),
        });
        let p2pkh = sized(SpendShape::P2pkh);

        // keypath < native segwit < wrapped segwit < legacy
        assert!(p2tr < p2wpkh);
        assert!(p2wpkh < wrapped);
        assert!(wrapped < p2pkh);
    }

    #[test]
    fn estimate_grows_with_inputs() {
        let recipients = vec![Recipient::new(
            wpkh_script(77),
            BitcoinAmount::from_sat(5_000),
        )];

        let one = estimate_vsize(&[spendable(1, 1_000)], &recipients, &[]).unwrap();
        let two =
            estimate_vsize(&[spendable(1, 1_000), spendable(2, 1_000)], &recipients, &[]).unwrap();

        assert!(two > one);
        // a p2wpkh input adds ~68 vbytes
        assert!((60..80).contains(&(two - one)));
    }
}
