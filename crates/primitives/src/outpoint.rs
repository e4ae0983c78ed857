//! References to prior transaction outputs.

use std::{
    fmt::Display,
    io::{self, Read, Write},
};

use arbitrary::{Arbitrary, Unstructured};
use bitcoin::{
    hashes::{sha256d, Hash},
    OutPoint, Txid,
};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// Number of bytes in a txid.
const TXID_SIZE: usize = 32;

/// Reference to a prior transaction output.
///
/// This is the identity of every unspent output handled by the core: two
/// outputs are the same UTXO iff their [`OutputRef`]s are equal.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OutputRef(OutPoint);

impl From<OutPoint> for OutputRef {
    fn from(value: OutPoint) -> Self {
        Self(value)
    }
}

impl OutputRef {
    /// Creates a reference from a txid and an output index.
    pub fn new(txid: Txid, vout: u32) -> Self {
        Self(OutPoint::new(txid, vout))
    }

    /// The underlying [`OutPoint`].
    pub fn outpoint(&self) -> &OutPoint {
        &self.0
    }

    /// The referenced transaction's id.
    pub fn txid(&self) -> Txid {
        self.0.txid
    }

    /// The referenced output's index within its transaction.
    pub fn vout(&self) -> u32 {
        self.0.vout
    }
}

impl Display for OutputRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.0.txid, self.0.vout)
    }
}

impl BorshSerialize for OutputRef {
    fn serialize<W: Write>(&self, writer: &mut W) -> Result<(), io::Error> {
        writer.write_all(&self.0.txid[..])?;
        writer.write_all(&self.0.vout.to_le_bytes())?;
        Ok(())
    }
}

impl BorshDeserialize for OutputRef {
    fn deserialize_reader<R: Read>(reader: &mut R) -> Result<Self, io::Error> {
        let mut txid_bytes = [0u8; TXID_SIZE];
        reader.read_exact(&mut txid_bytes)?;
        let txid = Txid::from_slice(&txid_bytes)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "invalid txid"))?;

        let mut vout_bytes = [0u8; 4];
        reader.read_exact(&mut vout_bytes)?;
        let vout = u32::from_le_bytes(vout_bytes);

        Ok(OutputRef(OutPoint { txid, vout }))
    }
}

impl<'a> Arbitrary<'a> for OutputRef {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        let mut txid_bytes = [0u8; TXID_SIZE];
        u.fill_buffer(&mut txid_bytes)?;
        let hash = sha256d::Hash::from_byte_array(txid_bytes);
        let txid = Txid::from_raw_hash(hash);

        let vout = u.int_in_range(0..=u32::MAX)?;

        Ok(OutputRef(OutPoint { txid, vout }))
    }
}
