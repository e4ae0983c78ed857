//! Context shared by every transaction built within one bridge client.

use bitcoin::Network;

/// Provides access to the pieces of client-level configuration the builders
/// need.
pub trait BuildContext {
    /// The bitcoin network for which the builder constructs transactions.
    fn network(&self) -> &Network;

    /// Whether a mismatch found by order post-validation is tolerated.
    ///
    /// When `true`, [`crate::validation::validate_embedded_order`] logs the
    /// mismatch and lets the build proceed instead of failing it. Every
    /// other error stays fatal regardless of this flag.
    fn best_effort_order_validation(&self) -> bool;
}

/// Context for the transactions built by this bridge client.
#[derive(Debug, Clone)]
pub struct TxBuildContext {
    /// The network to build the transactions for.
    network: Network,

    /// Opt-in soft handling of order post-validation mismatches.
    best_effort_order_validation: bool,
}

impl TxBuildContext {
    /// Create a new [`TxBuildContext`] for the given network.
    ///
    /// Order post-validation defaults to strict.
    pub fn new(network: Network) -> Self {
        Self {
            network,
            best_effort_order_validation: false,
        }
    }

    /// Tolerate order post-validation mismatches, logging them instead.
    pub fn with_best_effort_order_validation(mut self) -> Self {
        self.best_effort_order_validation = true;
        self
    }
}

impl BuildContext for TxBuildContext {
    fn network(&self) -> &Network {
        &self.network
    }

    fn best_effort_order_validation(&self) -> bool {
        self.best_effort_order_validation
    }
}
