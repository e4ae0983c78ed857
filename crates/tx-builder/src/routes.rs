//! Route dispatch across chain kinds.
//!
//! A bridge transfer is keyed by the pair of source and destination chain
//! kinds. The pair resolves to the planner that lays the transaction out;
//! resolution is a single exhaustive `match` so adding a kind fails to
//! compile until every pair is handled.

use serde::{Deserialize, Serialize};

/// The source-chain variants this core can spend from.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum SourceKind {
    /// A plain-value UTXO chain.
    Value,

    /// A UTXO chain carrying a rune overlay.
    Rune,

    /// A rune chain where the transfer additionally moves an
    /// inscription-style singleton held in a dedicated input.
    RuneWithInscription,
}

/// The destination-chain variants orders can point at.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum DestinationKind {
    /// Another UTXO chain; the receiver is a script on that chain.
    Utxo,

    /// An account/contract chain; the receiver is an account address
    /// interpreted by the destination contract.
    Account,
}

/// A source/destination pairing.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct RoutePair {
    /// Chain the value is spent from.
    pub source: SourceKind,
    /// Chain the value is bridged to.
    pub destination: DestinationKind,
}

/// The planner responsible for a route.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RouteHandler {
    /// [`crate::layout::value::plan_value_route`].
    Value,

    /// [`crate::layout::rune::plan_rune_route`] without a singleton input.
    Rune,

    /// [`crate::layout::rune::plan_rune_route`] with a singleton input.
    RuneWithInscription,
}

impl RoutePair {
    /// Creates a route pair.
    pub fn new(source: SourceKind, destination: DestinationKind) -> Self {
        Self {
            source,
            destination,
        }
    }

    /// Resolves the planner for this pair.
    ///
    /// The destination kind never changes which planner runs, only what the
    /// order must carry; both facts are decided here so the planners stay
    /// free of per-chain conditionals.
    pub fn handler(&self) -> RouteHandler {
        match (self.source, self.destination) {
            (SourceKind::Value, DestinationKind::Utxo)
            | (SourceKind::Value, DestinationKind::Account) => RouteHandler::Value,
            (SourceKind::Rune, DestinationKind::Utxo)
            | (SourceKind::Rune, DestinationKind::Account) => RouteHandler::Rune,
            (SourceKind::RuneWithInscription, DestinationKind::Utxo)
            | (SourceKind::RuneWithInscription, DestinationKind::Account) => {
                RouteHandler::RuneWithInscription
            }
        }
    }
}
