//! Accumulating selection of rune balances.

use std::collections::BTreeMap;

use tracing::debug;
use transit_primitives::prelude::*;

use crate::{
    errors::{TxBuilderError, TxBuilderResult},
    traits::RuneUtxoSource,
};

/// A rune balance owed to a recipient, in raw units.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RuneRecipient {
    /// The rune required.
    pub id: RuneId,
    /// Raw units required.
    pub amount: u128,
}

/// The product of rune selection.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RuneSelection {
    /// The rune-carrying inputs drawn, in draw order.
    pub inputs: Vec<RuneUnspentOutput>,

    /// Left-over balances per rune after all recipients are satisfied.
    ///
    /// Holds every rune carried by the drawn inputs, not just the requested
    /// ones; entries that net to zero are dropped.
    pub change: BTreeMap<RuneId, RuneAmount>,
}

impl RuneSelection {
    /// Whether any balance is left over.
    pub fn has_change(&self) -> bool {
        !self.change.is_empty()
    }
}

/// Draw rune-carrying inputs until every recipient's requirement is met.
///
/// Recipients are processed in order. Each is satisfied from the running
/// change ledger first; while the ledger is short, one more candidate is
/// requested from `source`. Every balance carried by a drawn candidate is
/// accrued into the ledger, so an output paying towards one rune can end up
/// funding a later recipient of another.
pub async fn select_rune_inputs(
    recipients: &[RuneRecipient],
    source: &dyn RuneUtxoSource,
) -> TxBuilderResult<RuneSelection> {
    let mut inputs: Vec<RuneUnspentOutput> = Vec::new();
    let mut used: Vec<OutputRef> = Vec::new();

    // rune -> (divisibility, raw balance)
    let mut ledger: BTreeMap<RuneId, (u8, u128)> = BTreeMap::new();

    for recipient in recipients {
        loop {
            let accrued = ledger
                .get(&recipient.id)
                .map(|(_, raw)| *raw)
                .unwrap_or_default();
            if accrued >= recipient.amount {
                break;
            }

            let candidate = source.next_candidate(recipient.id, &used).await?.ok_or(
                TxBuilderError::InsufficientRuneBalance {
                    id: recipient.id,
                    missing: recipient.amount - accrued,
                },
            )?;

            if used.contains(&candidate.outpoint()) {
                return Err(TxBuilderError::Collaborator(format!(
                    "rune source returned already-used output {}",
                    candidate.outpoint()
                )));
            }

            debug!(outpoint = %candidate.outpoint(), rune = %recipient.id, "drew rune utxo");

            used.push(candidate.outpoint());
            for balance in candidate.runes() {
                let entry = ledger
                    .entry(balance.id())
                    .or_insert((balance.divisibility(), 0));
                entry.1 += balance.amount();
            }
            inputs.push(candidate);
        }

        let entry = ledger
            .get_mut(&recipient.id)
            .expect("ledger covers the recipient after the draw loop");
        entry.1 -= recipient.amount;
    }

    let change = ledger
        .into_iter()
        .filter(|(_, (_, raw))| *raw > 0)
        .map(|(id, (divisibility, raw))| (id, RuneAmount::from_raw(id, divisibility, raw)))
        .collect();

    Ok(RuneSelection { inputs, change })
}
