//! Satoshi amounts.

use std::{fmt::Display, iter::Sum, ops::Add};

use arbitrary::Arbitrary;
use bitcoin::Amount;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// A bitcoin amount in sats similar to the implementation in [`bitcoin::Amount`].
///
/// NOTE: This wrapper has been created so that we can implement `Borsh*` traits on it.
#[derive(
    Arbitrary,
    BorshSerialize,
    BorshDeserialize,
    Clone,
    Copy,
    Debug,
    Deserialize,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
pub struct BitcoinAmount(u64);

impl Display for BitcoinAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Amount> for BitcoinAmount {
    fn from(value: Amount) -> Self {
        Self::from_sat(value.to_sat())
    }
}

impl From<BitcoinAmount> for Amount {
    fn from(value: BitcoinAmount) -> Self {
        Self::from_sat(value.to_sat())
    }
}

impl BitcoinAmount {
    /// The zero amount.
    pub const ZERO: BitcoinAmount = Self(0);

    /// The maximum value allowed as an amount. Useful for sanity checking.
    pub const MAX_MONEY: BitcoinAmount = Self::from_int_btc(21_000_000);

    /// The number of sats in 1 bitcoin.
    pub const SATS_FACTOR: u64 = 100_000_000;

    /// Get the number of sats in this [`BitcoinAmount`].
    pub const fn to_sat(&self) -> u64 {
        self.0
    }

    /// Create a [`BitcoinAmount`] with sats precision and the given number of sats.
    pub const fn from_sat(value: u64) -> Self {
        Self(value)
    }

    /// Convert a whole number of bitcoins to a [`BitcoinAmount`] in const
    /// context.
    ///
    /// # Panics
    ///
    /// The function panics if the argument multiplied by the number of sats
    /// per bitcoin overflows a u64 type.
    pub const fn from_int_btc(btc: u64) -> Self {
        match btc.checked_mul(Self::SATS_FACTOR) {
            Some(amount) => Self::from_sat(amount),
            None => {
                panic!("number of sats greater than u64::MAX");
            }
        }
    }

    /// Checked addition in sats.
    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        match self.0.checked_add(rhs.0) {
            Some(sats) => Some(Self(sats)),
            None => None,
        }
    }

    /// Checked subtraction in sats.
    pub const fn checked_sub(self, rhs: Self) -> Option<Self> {
        match self.0.checked_sub(rhs.0) {
            Some(sats) => Some(Self(sats)),
            None => None,
        }
    }

    /// Subtraction in sats that clamps at zero instead of wrapping.
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Add for BitcoinAmount {
    type Output = BitcoinAmount;

    fn add(self, rhs: Self) -> Self::Output {
        Self::from_sat(self.to_sat() + rhs.to_sat())
    }
}

impl Sum for BitcoinAmount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self::from_sat(iter.map(|amt| amt.to_sat()).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sats_roundtrip_and_sum() {
        let amts = [1_000u64, 2_000, 42].map(BitcoinAmount::from_sat);
        let total: BitcoinAmount = amts.iter().copied().sum();
        assert_eq!(total.to_sat(), 3_042);

        let as_bitcoin: Amount = total.into();
        assert_eq!(BitcoinAmount::from(as_bitcoin), total);
    }

    #[test]
    fn checked_arithmetic_bounds() {
        let a = BitcoinAmount::from_sat(5);
        let b = BitcoinAmount::from_sat(7);
        assert_eq!(a.checked_sub(b), None);
        assert_eq!(a.saturating_sub(b), BitcoinAmount::ZERO);
        assert_eq!(b.checked_sub(a), Some(BitcoinAmount::from_sat(2)));
        assert_eq!(a.checked_add(b), Some(BitcoinAmount::from_sat(12)));
        assert_eq!(
            BitcoinAmount::from_sat(u64::MAX).checked_add(BitcoinAmount::from_sat(1)),
            None
        );
    }
}
