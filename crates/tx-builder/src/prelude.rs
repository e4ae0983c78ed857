//! Re-exports of the types most callers need.

pub use crate::{
    assemble::{assemble_plan, assemble_tx, AssembleOptions, TxSigningData},
    context::{BuildContext, TxBuildContext},
    errors::{TxBuilderError, TxBuilderResult},
    fee::{prepare_plan, PlanRequest, TransactionPlan, MIN_RELAY_FEE},
    layout::{
        rune::{plan_rune_route, RuneRouteRequest},
        value::{plan_value_route, ValueRouteRequest},
        OutputLayout, OutputSlot,
    },
    order::{EncodedOrder, OrderRequest, RuneTransfer},
    routes::{DestinationKind, RouteHandler, RoutePair, SourceKind},
    select::{
        coins::select_coins,
        runes::{select_rune_inputs, RuneRecipient, RuneSelection},
    },
    sighash::{
        cooperative_swap_scopes, full_authorization_scopes, placeholder_input, placeholder_output,
        InputScope, SignatureScope,
    },
    traits::{OrderCodec, RuneUtxoSource, TxBroadcaster, TxSigner, UtxoReselector},
    validation::validate_embedded_order,
};
