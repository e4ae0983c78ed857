//! Rune identifiers and balances.
//!
//! Runes are the fungible-token overlay carried on top of the base UTXO
//! protocol. A rune is identified by the block height and transaction index
//! of its etching (`block:tx`), and its balances are integer "raw" units with
//! a fixed number of implied decimal places (the divisibility).

use std::{
    fmt::Display,
    io::{self, Read, Write},
    str::FromStr,
};

use arbitrary::{Arbitrary, Unstructured};
use borsh::{BorshDeserialize, BorshSerialize};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::ParseError;

/// Identity of a rune: the `block:tx` coordinates of its etching.
///
/// Wraps [`ordinals::RuneId`] so that we can implement `Borsh*` and
/// [`Arbitrary`] on it.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Ord, PartialOrd)]
pub struct RuneId(ordinals::RuneId);

impl RuneId {
    /// Creates a rune id from etching coordinates.
    ///
    /// Returns `None` for coordinates that no rune can have (a nonzero tx
    /// index in block zero).
    pub fn new(block: u64, tx: u32) -> Option<Self> {
        ordinals::RuneId::new(block, tx).map(Self)
    }

    /// Block height of the etching.
    pub fn block(&self) -> u64 {
        self.0.block
    }

    /// Transaction index of the etching within its block.
    pub fn tx(&self) -> u32 {
        self.0.tx
    }

    /// The underlying [`ordinals::RuneId`].
    pub fn inner(&self) -> ordinals::RuneId {
        self.0
    }
}

impl From<ordinals::RuneId> for RuneId {
    fn from(value: ordinals::RuneId) -> Self {
        Self(value)
    }
}

impl Display for RuneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RuneId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<ordinals::RuneId>()
            .map(Self)
            .map_err(|_| ParseError::InvalidRuneId(s.to_owned()))
    }
}

impl Serialize for RuneId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RuneId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

impl BorshSerialize for RuneId {
    fn serialize<W: Write>(&self, writer: &mut W) -> Result<(), io::Error> {
        writer.write_all(&self.0.block.to_le_bytes())?;
        writer.write_all(&self.0.tx.to_le_bytes())?;
        Ok(())
    }
}

impl BorshDeserialize for RuneId {
    fn deserialize_reader<R: Read>(reader: &mut R) -> Result<Self, io::Error> {
        let mut block_bytes = [0u8; 8];
        reader.read_exact(&mut block_bytes)?;
        let mut tx_bytes = [0u8; 4];
        reader.read_exact(&mut tx_bytes)?;

        ordinals::RuneId::new(u64::from_le_bytes(block_bytes), u32::from_le_bytes(tx_bytes))
            .map(Self)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "invalid rune id"))
    }
}

impl<'a> Arbitrary<'a> for RuneId {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        let block = u.int_in_range(1..=u64::MAX >> 16)?;
        let tx = u.arbitrary()?;
        RuneId::new(block, tx).ok_or(arbitrary::Error::IncorrectFormat)
    }
}

/// A rune balance in raw units.
///
/// Raw amounts are what the chain and the runestone edicts carry; the
/// divisibility says how many implied decimal places separate raw units from
/// the human-denominated amount.
#[derive(Arbitrary, Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct RuneAmount {
    id: RuneId,
    divisibility: u8,
    amount: u128,
}

impl RuneAmount {
    /// Creates a balance from raw units.
    pub fn from_raw(id: RuneId, divisibility: u8, amount: u128) -> Self {
        Self {
            id,
            divisibility,
            amount,
        }
    }

    /// Creates a balance from a human-denominated amount, rounding up so that
    /// a send backed by this balance never under-delivers.
    pub fn from_decimal_ceil(
        id: RuneId,
        divisibility: u8,
        amount: Decimal,
    ) -> Result<Self, ParseError> {
        let out_of_range = || ParseError::RuneAmountOutOfRange {
            amount,
            divisibility,
        };

        let scale = 10u64
            .checked_pow(u32::from(divisibility))
            .ok_or_else(out_of_range)?;
        let raw = amount
            .checked_mul(Decimal::from(scale))
            .ok_or_else(out_of_range)?
            .ceil()
            .to_u128()
            .ok_or_else(out_of_range)?;

        Ok(Self::from_raw(id, divisibility, raw))
    }

    /// The rune this balance belongs to.
    pub fn id(&self) -> RuneId {
        self.id
    }

    /// Number of implied decimal places.
    pub fn divisibility(&self) -> u8 {
        self.divisibility
    }

    /// The balance in raw units.
    pub fn amount(&self) -> u128 {
        self.amount
    }

    /// The balance in human-denominated units.
    ///
    /// Returns `None` if the raw amount exceeds what a decimal can represent
    /// at this divisibility.
    pub fn to_decimal(&self) -> Option<Decimal> {
        let mantissa = i128::try_from(self.amount).ok()?;
        Decimal::try_from_i128_with_scale(mantissa, u32::from(self.divisibility)).ok()
    }

}

impl Display for RuneAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_decimal() {
            Some(dec) => write!(f, "{} {}", dec.normalize(), self.id),
            None => write!(f, "{} raw units of {}", self.amount, self.id),
        }
    }
}
