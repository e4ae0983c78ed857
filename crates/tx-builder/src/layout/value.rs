//! Layout planning for plain-value routes.

use std::collections::BTreeMap;

use bitcoin::ScriptBuf;
use transit_primitives::prelude::*;

use crate::{
    errors::{TxBuilderError, TxBuilderResult},
    fee::{prepare_plan, PlanRequest},
    layout::{OutputLayout, SemanticOutputs},
    order::OrderRequest,
    routes::RouteHandler,
    traits::{OrderCodec, UtxoReselector},
};

/// Everything a plain-value route needs from the caller.
#[derive(Clone, Debug)]
pub struct ValueRouteRequest {
    /// The order being fulfilled.
    pub order: OrderRequest,

    /// Script of the output the bridged sats land on (the peg-in address).
    pub transfer_script: Option<ScriptBuf>,

    /// Protocol-fee output, when the route charges one.
    pub bridge_fee: Option<Recipient>,

    /// Marker output correlating this transaction to a protocol flow.
    pub linkage: Option<Recipient>,

    /// Inputs that must be spent regardless of value.
    pub pinned_inputs: Vec<SpendableUnspentOutput>,

    /// Outputs emitted before every semantic output.
    pub pinned_outputs: Vec<Recipient>,

    /// Outputs emitted after the semantic ones.
    pub append_outputs: Vec<Recipient>,

    /// Caller-supplied auxiliary scripts, emitted last as zero-value
    /// outputs.
    pub aux_op_returns: Vec<ScriptBuf>,

    /// Script network change returns to.
    pub change_script: ScriptBuf,

    /// Fee rate in sats per virtual byte.
    pub fee_rate: u64,
}

impl ValueRouteRequest {
    fn validate(&self) -> TxBuilderResult<&ScriptBuf> {
        if self.order.route().handler() != RouteHandler::Value {
            return Err(TxBuilderError::InvalidParameters("route"));
        }
        if self.order.rune().is_some() {
            return Err(TxBuilderError::InvalidParameters(
                "rune transfer on a value route",
            ));
        }
        if self.order.receiver().is_empty() {
            return Err(TxBuilderError::InvalidParameters("order receiver"));
        }
        if self.order.amount() == BitcoinAmount::ZERO {
            return Err(TxBuilderError::InvalidParameters("order amount"));
        }

        self.transfer_script
            .as_ref()
            .ok_or(TxBuilderError::InvalidParameters("transfer script"))
    }
}

/// Plan the outputs of a plain-value bridge transaction.
///
/// Parameters are checked before the order is encoded, so an incomplete
/// request never reaches the backend.
pub async fn plan_value_route(
    request: ValueRouteRequest,
    codec: &dyn OrderCodec,
    reselector: &dyn UtxoReselector,
) -> TxBuilderResult<OutputLayout> {
    let transfer_script = request.validate()?.clone();

    let encoded = codec.encode_order(&request.order).await?;

    let semantic = SemanticOutputs::new(
        request.pinned_outputs,
        None,
        Recipient::new(encoded.carrier_script, encoded.carrier_amount),
        request.bridge_fee,
        request.linkage,
        Recipient::new(transfer_script, request.order.amount()),
        request.append_outputs,
    );

    let plan = prepare_plan(
        PlanRequest {
            recipients: semantic.recipients().to_vec(),
            change_script: request.change_script,
            op_return_scripts: request.aux_op_returns,
            pinned: request.pinned_inputs,
            fee_rate: request.fee_rate,
        },
        reselector,
    )
    .await?;

    Ok(semantic.into_layout(plan, BTreeMap::new()))
}
