//! Output layout planning.
//!
//! Every route emits its outputs in one fixed semantic order:
//!
//! ```text
//! [pinned..., rune change?, order carrier, bridge fee?, linkage?,
//!  transfer/destination, appended..., network change?, OP_RETURNs]
//! ```
//!
//! Optional outputs shift later indices only when present, so the planners
//! compute each name's index additively and downstream consumers never
//! hard-code positions. The network change and the auxiliary scripts trail
//! the semantic outputs, which keeps every named index independent of
//! whether change ends up being emitted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use transit_primitives::prelude::*;

use crate::fee::TransactionPlan;

pub mod rune;
pub mod value;

/// A named output's position and final amount.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct OutputSlot {
    /// Index of the output in the transaction.
    pub index: u32,

    /// Sats the output carries.
    pub amount: BitcoinAmount,
}

/// A converged plan plus the resolved index of every semantically-named
/// output of the route.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct OutputLayout {
    /// The underlying converged plan.
    pub plan: TransactionPlan,

    /// Caller-pinned outputs, leading the transaction.
    pub pinned_outputs: Vec<OutputSlot>,

    /// The pointer output receiving left-over rune balances, when the route
    /// produced rune change.
    pub rune_change_output: Option<OutputSlot>,

    /// The order-carrier output embedding the encoded order.
    pub order_output: OutputSlot,

    /// The protocol-fee output, when the route charges one.
    pub bridge_fee_output: Option<OutputSlot>,

    /// The marker output correlating this transaction to a protocol flow.
    pub linkage_output: Option<OutputSlot>,

    /// The output the bridged value (or rune carrier) lands on.
    pub transfer_output: OutputSlot,

    /// Caller-appended outputs, after the semantic ones.
    pub append_outputs: Vec<OutputSlot>,

    /// The network-change output, when one is emitted.
    pub change_output: Option<OutputSlot>,

    /// Left-over rune balances directed at the rune-change output; empty on
    /// value routes.
    pub rune_change_balances: BTreeMap<RuneId, RuneAmount>,
}

/// The semantic output list of a route before fee convergence.
///
/// Records which optional outputs are present so the final indices can be
/// derived additively, and owns the recipients in emission order.
#[derive(Clone, Debug)]
pub(crate) struct SemanticOutputs {
    recipients: Vec<Recipient>,
    pinned_len: u32,
    has_rune_change: bool,
    has_bridge_fee: bool,
    has_linkage: bool,
    append_len: u32,
}

impl SemanticOutputs {
    pub(crate) fn new(
        pinned: Vec<Recipient>,
        rune_change: Option<Recipient>,
        order: Recipient,
        bridge_fee: Option<Recipient>,
        linkage: Option<Recipient>,
        transfer: Recipient,
        append: Vec<Recipient>,
    ) -> Self {
        let pinned_len = pinned.len() as u32;
        let has_rune_change = rune_change.is_some();
        let has_bridge_fee = bridge_fee.is_some();
        let has_linkage = linkage.is_some();
        let append_len = append.len() as u32;

        let mut recipients = pinned;
        recipients.extend(rune_change);
        recipients.push(order);
        recipients.extend(bridge_fee);
        recipients.extend(linkage);
        recipients.push(transfer);
        recipients.extend(append);

        Self {
            recipients,
            pinned_len,
            has_rune_change,
            has_bridge_fee,
            has_linkage,
            append_len,
        }
    }

    /// The recipients in emission order, for the fee engine.
    pub(crate) fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }

    pub(crate) fn rune_change_index(&self) -> Option<u32> {
        self.has_rune_change.then_some(self.pinned_len)
    }

    pub(crate) fn order_index(&self) -> u32 {
        self.pinned_len + u32::from(self.has_rune_change)
    }

    pub(crate) fn bridge_fee_index(&self) -> Option<u32> {
        self.has_bridge_fee.then_some(self.order_index() + 1)
    }

    pub(crate) fn linkage_index(&self) -> Option<u32> {
        let offset = self.order_index() + 1 + u32::from(self.has_bridge_fee);
        self.has_linkage.then_some(offset)
    }

    pub(crate) fn transfer_index(&self) -> u32 {
        self.order_index() + 1 + u32::from(self.has_bridge_fee) + u32::from(self.has_linkage)
    }

    /// Resolve the slots against a converged plan.
    ///
    /// Amounts are read back from the plan's recipients so that dust
    /// clamping is reflected in every slot.
    pub(crate) fn into_layout(
        self,
        plan: TransactionPlan,
        rune_change_balances: BTreeMap<RuneId, RuneAmount>,
    ) -> OutputLayout {
        let slot = |index: u32| OutputSlot {
            index,
            amount: plan.recipients[index as usize].amount(),
        };

        let pinned_outputs = (0..self.pinned_len).map(slot).collect();
        let rune_change_output = self.rune_change_index().map(slot);
        let order_output = slot(self.order_index());
        let bridge_fee_output = self.bridge_fee_index().map(slot);
        let linkage_output = self.linkage_index().map(slot);
        let transfer_output = slot(self.transfer_index());
        let append_start = self.transfer_index() + 1;
        let append_outputs = (append_start..append_start + self.append_len)
            .map(slot)
            .collect();

        let change_output = (plan.change_amount > BitcoinAmount::ZERO).then(|| OutputSlot {
            index: plan.recipients.len() as u32,
            amount: plan.change_amount,
        });

        OutputLayout {
            plan,
            pinned_outputs,
            rune_change_output,
            order_output,
            bridge_fee_output,
            linkage_output,
            transfer_output,
            append_outputs,
            change_output,
            rune_change_balances,
        }
    }
}
