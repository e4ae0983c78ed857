//! The layered unspent-output model.
//!
//! Each layer adds the data one more stage of the pipeline needs, so that an
//! algorithm's input type statically guarantees the fields it reads: plain
//! value for selection, confirmation height for ranking, script and spending
//! shape for size estimation and signing, rune balances for the token
//! overlay.

use arbitrary::Arbitrary;
use bitcoin::{secp256k1::XOnlyPublicKey, ScriptBuf};
use serde::{Deserialize, Serialize};

use crate::{
    amount::BitcoinAmount,
    outpoint::OutputRef,
    runes::{RuneAmount, RuneId},
};

/// An unspent output known only by reference and value.
#[derive(Arbitrary, Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct UnspentOutput {
    outpoint: OutputRef,
    amount: BitcoinAmount,
}

impl UnspentOutput {
    /// Creates an unspent output.
    pub fn new(outpoint: OutputRef, amount: BitcoinAmount) -> Self {
        Self { outpoint, amount }
    }

    /// Identity of this output.
    pub fn outpoint(&self) -> OutputRef {
        self.outpoint
    }

    /// Value of this output in sats.
    pub fn amount(&self) -> BitcoinAmount {
        self.amount
    }
}

/// An unspent output with the height at which it confirmed.
///
/// Only used to rank candidates during initial coin selection.
#[derive(Arbitrary, Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct ConfirmedUnspentOutput {
    output: UnspentOutput,
    confirmation_height: u64,
}

impl ConfirmedUnspentOutput {
    /// Creates a confirmed unspent output.
    pub fn new(output: UnspentOutput, confirmation_height: u64) -> Self {
        Self {
            output,
            confirmation_height,
        }
    }

    /// The underlying output.
    pub fn output(&self) -> &UnspentOutput {
        &self.output
    }

    /// Height of the block this output confirmed in.
    pub fn confirmation_height(&self) -> u64 {
        self.confirmation_height
    }

    /// Value of this output in sats.
    pub fn amount(&self) -> BitcoinAmount {
        self.output.amount()
    }
}

/// The spending condition of an output we intend to consume.
///
/// This is a closed union: every variant can be sized for fee estimation and
/// translated into the auxiliary data the external signer needs. Spending
/// conditions outside this set cannot enter the pipeline.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum SpendShape {
    /// Legacy pay-to-pubkey-hash.
    P2pkh,

    /// Segwit-v0 key spend wrapped in a script hash.
    P2shP2wpkh {
        /// The `OP_0 <20-byte-key-hash>` redeem script revealed in the
        /// script_sig.
        redeem_script: ScriptBuf,
    },

    /// Native segwit-v0 key spend.
    P2wpkh,

    /// Native segwit-v0 script spend.
    ///
    /// The witness template of an arbitrary script is not modeled; inputs of
    /// this shape are rejected by the size estimator.
    P2wsh {
        /// The script whose hash the output commits to.
        witness_script: ScriptBuf,
    },

    /// Taproot key-path spend.
    P2tr {
        /// The untweaked internal key, when the signer needs it to derive
        /// the tweak.
        internal_key: Option<XOnlyPublicKey>,
    },
}

/// An unspent output carrying everything needed to estimate and later
/// produce a valid input spending it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SpendableUnspentOutput {
    output: UnspentOutput,
    script_pubkey: ScriptBuf,
    spend_shape: SpendShape,
}

impl SpendableUnspentOutput {
    /// Creates a spendable unspent output.
    pub fn new(output: UnspentOutput, script_pubkey: ScriptBuf, spend_shape: SpendShape) -> Self {
        Self {
            output,
            script_pubkey,
            spend_shape,
        }
    }

    /// The underlying output.
    pub fn output(&self) -> &UnspentOutput {
        &self.output
    }

    /// Identity of this output.
    pub fn outpoint(&self) -> OutputRef {
        self.output.outpoint()
    }

    /// Value of this output in sats.
    pub fn amount(&self) -> BitcoinAmount {
        self.output.amount()
    }

    /// The script this output is locked to.
    pub fn script_pubkey(&self) -> &ScriptBuf {
        &self.script_pubkey
    }

    /// How this output will be spent.
    pub fn spend_shape(&self) -> &SpendShape {
        &self.spend_shape
    }
}

/// A spendable unspent output together with the rune balances it carries.
///
/// A single output may carry zero or more rune balances.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RuneUnspentOutput {
    output: SpendableUnspentOutput,
    runes: Vec<RuneAmount>,
}

impl RuneUnspentOutput {
    /// Creates a rune-carrying unspent output.
    pub fn new(output: SpendableUnspentOutput, runes: Vec<RuneAmount>) -> Self {
        Self { output, runes }
    }

    /// The spendable output the balances ride on.
    pub fn output(&self) -> &SpendableUnspentOutput {
        &self.output
    }

    /// Identity of this output.
    pub fn outpoint(&self) -> OutputRef {
        self.output.outpoint()
    }

    /// All rune balances carried by this output, in entry order.
    pub fn runes(&self) -> &[RuneAmount] {
        &self.runes
    }

    /// The raw balance of a given rune carried by this output, if any.
    pub fn rune_amount(&self, id: RuneId) -> Option<u128> {
        self.runes
            .iter()
            .find(|entry| entry.id() == id)
            .map(|entry| entry.amount())
    }

    /// Discards the rune layer.
    pub fn into_output(self) -> SpendableUnspentOutput {
        self.output
    }
}

/// A script and the amount to lock to it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Recipient {
    script_pubkey: ScriptBuf,
    amount: BitcoinAmount,
}

impl Recipient {
    /// Creates a recipient.
    pub fn new(script_pubkey: ScriptBuf, amount: BitcoinAmount) -> Self {
        Self {
            script_pubkey,
            amount,
        }
    }

    /// The script to pay.
    pub fn script_pubkey(&self) -> &ScriptBuf {
        &self.script_pubkey
    }

    /// The amount to pay, in sats.
    pub fn amount(&self) -> BitcoinAmount {
        self.amount
    }

    /// The smallest amount this recipient's script may carry.
    pub fn dust_threshold(&self) -> BitcoinAmount {
        self.script_pubkey.minimal_non_dust().into()
    }

    /// Raises the amount to the script's dust threshold if it is below it.
    pub fn clamped_to_dust(self) -> Self {
        let floor = self.dust_threshold();
        Self {
            amount: self.amount.max(floor),
            ..self
        }
    }
}
