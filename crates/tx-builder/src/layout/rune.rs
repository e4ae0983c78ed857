//! Layout planning for rune-carrying routes.
//!
//! On top of the value-route shape these routes draw rune inputs, emit a
//! dust-sized carrier output the runes move onto, and append a runestone
//! directing the movement. The runestone's edict references the *final*
//! resolved index of the carrier output and its pointer directs left-over
//! balance to the rune-change output, so it is built only after every
//! offset is known.

use bitcoin::ScriptBuf;
use ordinals::{Edict, Runestone};
use transit_primitives::prelude::*;

use crate::{
    errors::{TxBuilderError, TxBuilderResult},
    fee::{prepare_plan, PlanRequest},
    layout::{OutputLayout, SemanticOutputs},
    order::{OrderRequest, RuneTransfer},
    routes::RouteHandler,
    select::runes::{select_rune_inputs, RuneRecipient},
    traits::{OrderCodec, RuneUtxoSource, UtxoReselector},
};

/// Everything a rune route needs from the caller.
#[derive(Clone, Debug)]
pub struct RuneRouteRequest {
    /// The order being fulfilled; must name a rune transfer.
    pub order: OrderRequest,

    /// Script of the carrier output the runes move onto (the peg-in
    /// address).
    pub transfer_script: Option<ScriptBuf>,

    /// Protocol-fee output, when the route charges one.
    pub bridge_fee: Option<Recipient>,

    /// Marker output correlating this transaction to a protocol flow.
    pub linkage: Option<Recipient>,

    /// The inscription-style singleton spent by this transfer, when the
    /// route moves one. Pinned as the first input.
    pub inscription_input: Option<SpendableUnspentOutput>,

    /// The output re-materializing the singleton, emitted first.
    pub inscription_output: Option<Recipient>,

    /// Further inputs that must be spent regardless of value.
    pub pinned_inputs: Vec<SpendableUnspentOutput>,

    /// Outputs emitted before every semantic output (after the singleton's,
    /// when present).
    pub pinned_outputs: Vec<Recipient>,

    /// Outputs emitted after the semantic ones.
    pub append_outputs: Vec<Recipient>,

    /// Caller-supplied auxiliary scripts, emitted last as zero-value
    /// outputs after the runestone.
    pub aux_op_returns: Vec<ScriptBuf>,

    /// Script network change and left-over runes return to.
    pub change_script: ScriptBuf,

    /// Fee rate in sats per virtual byte.
    pub fee_rate: u64,
}

impl RuneRouteRequest {
    fn validate(&self) -> TxBuilderResult<(RuneTransfer, &ScriptBuf)> {
        match self.order.route().handler() {
            RouteHandler::Rune => {
                if self.inscription_input.is_some() || self.inscription_output.is_some() {
                    return Err(TxBuilderError::InvalidParameters(
                        "inscription on a plain rune route",
                    ));
                }
            }
            RouteHandler::RuneWithInscription => {
                if self.inscription_input.is_none() || self.inscription_output.is_none() {
                    return Err(TxBuilderError::InvalidParameters("inscription input/output"));
                }
            }
            RouteHandler::Value => return Err(TxBuilderError::InvalidParameters("route")),
        }

        if self.order.receiver().is_empty() {
            return Err(TxBuilderError::InvalidParameters("order receiver"));
        }

        let rune = self
            .order
            .rune()
            .ok_or(TxBuilderError::InvalidParameters("rune transfer"))?;
        if rune.amount == 0 {
            return Err(TxBuilderError::InvalidParameters("rune amount"));
        }

        let transfer_script = self
            .transfer_script
            .as_ref()
            .ok_or(TxBuilderError::InvalidParameters("transfer script"))?;

        Ok((rune, transfer_script))
    }
}

/// Plan the outputs of a rune bridge transaction.
///
/// Parameters are checked before any collaborator runs; rune inputs are
/// drawn next so the rune-change output's presence is known before indices
/// are fixed.
pub async fn plan_rune_route(
    request: RuneRouteRequest,
    codec: &dyn OrderCodec,
    rune_source: &dyn RuneUtxoSource,
    reselector: &dyn UtxoReselector,
) -> TxBuilderResult<OutputLayout> {
    let (rune, transfer_script) = request.validate()?;
    let transfer_script = transfer_script.clone();

    let selection = select_rune_inputs(
        &[RuneRecipient {
            id: rune.id,
            amount: rune.amount,
        }],
        rune_source,
    )
    .await?;

    let encoded = codec.encode_order(&request.order).await?;

    let mut pinned_outputs = Vec::new();
    pinned_outputs.extend(request.inscription_output);
    pinned_outputs.extend(request.pinned_outputs);

    // left-over balances need a pointer output to land on
    let rune_change = selection
        .has_change()
        .then(|| Recipient::new(request.change_script.clone(), BitcoinAmount::ZERO));

    let semantic = SemanticOutputs::new(
        pinned_outputs,
        rune_change,
        Recipient::new(encoded.carrier_script, encoded.carrier_amount),
        request.bridge_fee,
        request.linkage,
        Recipient::new(transfer_script, BitcoinAmount::ZERO),
        request.append_outputs,
    );

    // all offsets are resolved; the runestone can reference them
    let runestone = Runestone {
        edicts: vec![Edict {
            id: rune.id.inner(),
            amount: rune.amount,
            output: semantic.transfer_index(),
        }],
        pointer: semantic.rune_change_index(),
        ..Default::default()
    };

    let mut op_return_scripts = vec![runestone.encipher()];
    op_return_scripts.extend(request.aux_op_returns);

    let mut pinned_inputs = Vec::new();
    pinned_inputs.extend(request.inscription_input);
    pinned_inputs.extend(
        selection
            .inputs
            .iter()
            .cloned()
            .map(RuneUnspentOutput::into_output),
    );
    pinned_inputs.extend(request.pinned_inputs);

    let plan = prepare_plan(
        PlanRequest {
            recipients: semantic.recipients().to_vec(),
            change_script: request.change_script,
            op_return_scripts,
            pinned: pinned_inputs,
            fee_rate: request.fee_rate,
        },
        reselector,
    )
    .await?;

    Ok(semantic.into_layout(plan, selection.change))
}
