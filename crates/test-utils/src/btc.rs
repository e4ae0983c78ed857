//! Deterministic UTXO, script and key generators for tests.

use bitcoin::{
    hashes::{sha256d, Hash},
    key::{Keypair, Secp256k1},
    secp256k1::SecretKey,
    ScriptBuf, Txid, WPubkeyHash, XOnlyPublicKey,
};
use transit_primitives::prelude::*;

/// A txid derived from a tag, stable across runs.
pub fn test_txid(tag: u8) -> Txid {
    Txid::from_raw_hash(sha256d::Hash::hash(&[tag; 8]))
}

/// A p2wpkh script derived from a tag.
pub fn wpkh_script(tag: u8) -> ScriptBuf {
    ScriptBuf::new_p2wpkh(&WPubkeyHash::from_byte_array([tag; 20]))
}

/// An x-only pubkey derived from a nonzero tag.
pub fn xonly_pubkey(tag: u8) -> XOnlyPublicKey {
    let secp = Secp256k1::new();
    let secret = SecretKey::from_slice(&[tag; 32]).expect("nonzero tag gives a valid key");
    let keypair = Keypair::from_secret_key(&secp, &secret);
    XOnlyPublicKey::from_keypair(&keypair).0
}

/// A plain unspent output.
pub fn unspent_output(tag: u8, sats: u64) -> UnspentOutput {
    UnspentOutput::new(
        OutputRef::new(test_txid(tag), 0),
        BitcoinAmount::from_sat(sats),
    )
}

/// A confirmed unspent output.
pub fn confirmed_output(tag: u8, sats: u64, height: u64) -> ConfirmedUnspentOutput {
    ConfirmedUnspentOutput::new(unspent_output(tag, sats), height)
}

/// A spendable p2wpkh unspent output.
pub fn spendable_output(tag: u8, sats: u64) -> SpendableUnspentOutput {
    SpendableUnspentOutput::new(unspent_output(tag, sats), wpkh_script(tag), SpendShape::P2wpkh)
}

/// A spendable output carrying the given rune balances.
pub fn rune_output(tag: u8, balances: &[(RuneId, u8, u128)]) -> RuneUnspentOutput {
    let runes = balances
        .iter()
        .map(|(id, divisibility, amount)| RuneAmount::from_raw(*id, *divisibility, *amount))
        .collect();
    RuneUnspentOutput::new(spendable_output(tag, 546), runes)
}

/// A rune id, unwrapping the etching coordinates.
pub fn rune_id(block: u64, tx: u32) -> RuneId {
    RuneId::new(block, tx).expect("valid etching coordinates")
}
