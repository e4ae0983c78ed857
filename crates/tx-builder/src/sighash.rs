//! Signature-scope assignment for cooperative transaction completion.
//!
//! An instant swap is built by two parties in turn: the user signs a
//! skeleton first, then a market maker extends it with its own inputs and
//! outputs and completes it. Each user signature must therefore commit to
//! exactly the economics the user cares about and nothing the maker will
//! touch. This module assigns a signature scope to every input index; it
//! never signs anything itself.

use std::str::FromStr;

use bitcoin::{
    key::TweakedPublicKey, secp256k1::XOnlyPublicKey, EcdsaSighashType, OutPoint, ScriptBuf,
    TapSighashType,
};
use serde::{Deserialize, Serialize};
use transit_primitives::prelude::*;

/// Which parts of the transaction a signature commits to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum SignatureScope {
    /// Full authorization: every input and output is covered. Used for
    /// transactions one party builds end to end.
    All,

    /// Covers this input and the output at the same index only. Locks the
    /// user's primary economic commitment while letting the counter-party
    /// append around it.
    SinglePlusAnyoneCanPay,

    /// Covers this input and no outputs. Used for follow-up same-party
    /// inputs (fee top-ups) that must stay valid under any later additions.
    NonePlusAnyoneCanPay,
}

impl SignatureScope {
    /// The taproot sighash flag for this scope.
    pub fn to_taproot(self) -> TapSighashType {
        match self {
            SignatureScope::All => TapSighashType::All,
            SignatureScope::SinglePlusAnyoneCanPay => TapSighashType::SinglePlusAnyoneCanPay,
            SignatureScope::NonePlusAnyoneCanPay => TapSighashType::NonePlusAnyoneCanPay,
        }
    }

    /// The legacy/segwit-v0 sighash flag for this scope.
    pub fn to_ecdsa(self) -> EcdsaSighashType {
        match self {
            SignatureScope::All => EcdsaSighashType::All,
            SignatureScope::SinglePlusAnyoneCanPay => EcdsaSighashType::SinglePlusAnyoneCanPay,
            SignatureScope::NonePlusAnyoneCanPay => EcdsaSighashType::NonePlusAnyoneCanPay,
        }
    }
}

/// A scope assigned to one input.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct InputScope {
    /// Index of the input in the unsigned transaction.
    pub input_index: u32,

    /// The scope its signature must use.
    pub scope: SignatureScope,
}

/// Assign full authorization to every input of a single-party transaction.
pub fn full_authorization_scopes(input_count: usize) -> Vec<InputScope> {
    (0..input_count as u32)
        .map(|input_index| InputScope {
            input_index,
            scope: SignatureScope::All,
        })
        .collect()
}

/// Assign scopes for the user's signing pass of a cooperative swap.
///
/// `user_input_indices` are the inputs funding the user's side, in
/// transaction order. The first funds the primary commitment and is locked
/// to its corresponding output; the rest only vouch for themselves so the
/// counter-party may append freely. Counter-party placeholder inputs get no
/// entry; the counter-party authorizes their replacements in its own pass.
pub fn cooperative_swap_scopes(user_input_indices: &[u32]) -> Vec<InputScope> {
    user_input_indices
        .iter()
        .enumerate()
        .map(|(position, &input_index)| InputScope {
            input_index,
            scope: if position == 0 {
                SignatureScope::SinglePlusAnyoneCanPay
            } else {
                SignatureScope::NonePlusAnyoneCanPay
            },
        })
        .collect()
}

/// Amount carried by counter-party placeholder inputs and outputs.
pub const PLACEHOLDER_AMOUNT: BitcoinAmount = BitcoinAmount::from_sat(546);

lazy_static::lazy_static! {
    /// Key-path-unspendable internal key backing the placeholder script;
    /// the NUMS point of [BIP 341](https://github.com/bitcoin/bips/blob/master/bip-0341.mediawiki#constructing-and-spending-taproot-outputs).
    pub static ref PLACEHOLDER_INTERNAL_KEY: XOnlyPublicKey = XOnlyPublicKey::from_str(
        "50929b74c1a04954b78b4b6035e97a5e078a5a0f28ec96d547bfee9ace803ac0"
    )
    .expect("valid x-only pubkey");

    /// The well-known script marking outputs and inputs reserved for the
    /// counter-party. The maker recognizes slots by script equality and
    /// substitutes its own.
    pub static ref PLACEHOLDER_SCRIPT: ScriptBuf = ScriptBuf::new_p2tr_tweaked(
        TweakedPublicKey::dangerous_assume_tweaked(*PLACEHOLDER_INTERNAL_KEY)
    );
}

/// A pinned input reserving a slot for the counter-party's funding.
pub fn placeholder_input() -> SpendableUnspentOutput {
    SpendableUnspentOutput::new(
        UnspentOutput::new(OutputRef::from(OutPoint::null()), PLACEHOLDER_AMOUNT),
        PLACEHOLDER_SCRIPT.clone(),
        SpendShape::P2tr { internal_key: None },
    )
}

/// A pinned output reserving a slot for the counter-party's payout.
pub fn placeholder_output() -> Recipient {
    Recipient::new(PLACEHOLDER_SCRIPT.clone(), PLACEHOLDER_AMOUNT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_build_signs_everything() {
        let scopes = full_authorization_scopes(3);
        assert_eq!(scopes.len(), 3);
        for (i, entry) in scopes.iter().enumerate() {
            assert_eq!(entry.input_index, i as u32);
            assert_eq!(entry.scope, SignatureScope::All);
        }
    }

    #[test]
    fn swap_locks_first_input_to_its_output() {
        let scopes = cooperative_swap_scopes(&[1, 3, 4]);

        assert_eq!(
            scopes[0],
            InputScope {
                input_index: 1,
                scope: SignatureScope::SinglePlusAnyoneCanPay
            }
        );
        assert_eq!(scopes[1].scope, SignatureScope::NonePlusAnyoneCanPay);
        assert_eq!(scopes[2].scope, SignatureScope::NonePlusAnyoneCanPay);
    }

    #[test]
    fn swap_with_no_user_inputs_assigns_nothing() {
        assert!(cooperative_swap_scopes(&[]).is_empty());
    }

    #[test]
    fn scope_flag_conversions() {
        assert_eq!(SignatureScope::All.to_taproot(), TapSighashType::All);
        assert_eq!(
            SignatureScope::SinglePlusAnyoneCanPay.to_ecdsa(),
            EcdsaSighashType::SinglePlusAnyoneCanPay
        );
        assert_eq!(
            SignatureScope::NonePlusAnyoneCanPay.to_taproot(),
            TapSighashType::NonePlusAnyoneCanPay
        );
    }

    #[test]
    fn placeholders_share_the_well_known_script() {
        let input = placeholder_input();
        let output = placeholder_output();

        assert_eq!(input.script_pubkey(), output.script_pubkey());
        assert_eq!(input.amount(), PLACEHOLDER_AMOUNT);
        assert_eq!(output.amount(), PLACEHOLDER_AMOUNT);
        assert!(input.script_pubkey().is_p2tr());
    }
}
