//! Bridge orders.
//!
//! An order is the protocol-level statement of a transfer's intent: where
//! the value goes and how much of it moves. The backend encodes an order
//! into an opaque payload plus the carrier output that embeds it in the
//! transaction; this module only models the request and the encoder's
//! product, not the encoding itself.

use bitcoin::ScriptBuf;
use serde::{Deserialize, Serialize};
use transit_primitives::prelude::*;

use crate::routes::RoutePair;

/// A rune movement requested by an order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RuneTransfer {
    /// The rune being bridged.
    pub id: RuneId,
    /// Raw units to deliver to the bridge.
    pub amount: u128,
}

/// The swap-route metadata the backend encodes into an order payload.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    route: RoutePair,
    receiver: Vec<u8>,
    amount: BitcoinAmount,
    rune: Option<RuneTransfer>,
}

impl OrderRequest {
    /// Creates an order request.
    pub fn new(
        route: RoutePair,
        receiver: Vec<u8>,
        amount: BitcoinAmount,
        rune: Option<RuneTransfer>,
    ) -> Self {
        Self {
            route,
            receiver,
            amount,
            rune,
        }
    }

    /// The source/destination pairing of this order.
    pub fn route(&self) -> RoutePair {
        self.route
    }

    /// Receiver identity on the destination chain.
    pub fn receiver(&self) -> &[u8] {
        &self.receiver
    }

    /// Sats being bridged (the peg-in amount on value routes).
    pub fn amount(&self) -> BitcoinAmount {
        self.amount
    }

    /// The rune moved by this order, when the source carries one.
    pub fn rune(&self) -> Option<RuneTransfer> {
        self.rune
    }
}

/// The encoder's product: an opaque payload plus the carrier output that
/// embeds it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct EncodedOrder {
    /// Opaque protocol payload proving the transfer's intent.
    pub payload: Vec<u8>,

    /// Script of the order-carrier output.
    pub carrier_script: ScriptBuf,

    /// Amount the carrier output must hold.
    pub carrier_amount: BitcoinAmount,
}
