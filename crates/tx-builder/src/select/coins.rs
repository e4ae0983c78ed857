//! Greedy selection of plain-value inputs.

use std::cmp::Reverse;

use transit_primitives::prelude::*;

/// Choose inputs to cover `target` sats.
///
/// `pinned` outputs are always included and are never dropped; they lead the
/// returned set. Remaining candidates are drawn from `available` largest
/// first (ties broken towards older confirmations, preferring settled funds)
/// until the running sum reaches the target, then selection stops -- first
/// fit, not minimal waste.
///
/// If `available` runs out before the target is reached, everything
/// accumulated is returned; the caller detects the shortfall by comparing
/// sums.
pub fn select_coins(
    target: BitcoinAmount,
    pinned: &[UnspentOutput],
    available: &[ConfirmedUnspentOutput],
) -> Vec<UnspentOutput> {
    let mut selected: Vec<UnspentOutput> = pinned.to_vec();
    let mut sum: u64 = selected.iter().map(|utxo| utxo.amount().to_sat()).sum();

    if sum >= target.to_sat() {
        return selected;
    }

    let mut candidates: Vec<&ConfirmedUnspentOutput> = available.iter().collect();
    candidates.sort_by_key(|utxo| (Reverse(utxo.amount()), utxo.confirmation_height()));

    for candidate in candidates {
        if sum >= target.to_sat() {
            break;
        }
        sum += candidate.amount().to_sat();
        selected.push(*candidate.output());
    }

    selected
}
