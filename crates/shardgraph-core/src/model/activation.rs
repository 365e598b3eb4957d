// shardgraph-core/src/model/activation.rs
// ============================================================================
// Module: Activation
// Description: One plugin invocation node inside an ActivationGraph.
// Purpose: Carry a graph node's bound arguments, dependency edges, output
//          symbol, and trigger slots.
// Dependencies: crate::model::{SymbolicArgumentSet, Symbol, TriggerSlot}
// ============================================================================

//! ## Overview
//! An [`Activation`] is one node of an [`crate::model::ActivationGraph`]: a
//! plugin invocation with its arguments bound against the plugin's
//! signature, a fresh output [`Symbol`] other activations may reference, the
//! set of sibling activations it depends on, and its two per-activation
//! trigger slots.

use crate::model::Symbol;
use crate::model::SymbolicArgumentSet;
use crate::model::TriggerSlot;

// ============================================================================
// SECTION: ActivationId
// ============================================================================

/// A lightweight handle into an [`crate::model::ActivationGraph`]'s arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActivationId(u32);

impl ActivationId {
    /// Builds an id from a raw arena index; used only by
    /// [`crate::model::ActivationGraph`] itself.
    pub(crate) const fn from_index(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw arena index backing this id.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ActivationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "act#{}", self.0)
    }
}

// ============================================================================
// SECTION: Activation
// ============================================================================

/// One node of an [`crate::model::ActivationGraph`].
#[derive(Debug, Clone)]
pub struct Activation<Trig> {
    /// This activation's own id within its owning graph's arena.
    id: ActivationId,
    /// Bound plugin identity and arguments.
    arguments: SymbolicArgumentSet,
    /// Fresh symbol other activations (or the graph's caller) may reference
    /// to mean "this activation's result".
    output_symbol: Symbol,
    /// Sibling activations whose output symbols this activation's
    /// arguments reference.
    dependencies: Vec<ActivationId>,
    /// Fires once this activation's result first becomes available.
    trigger_on_result: TriggerSlot<Trig>,
    /// Fires once none of this activation's descendants carry any trigger
    /// of their own.
    trigger_on_descendants: TriggerSlot<Trig>,
}

impl<Trig> Activation<Trig> {
    /// Builds a new activation; only [`crate::model::ActivationGraph`]
    /// constructs these, since it alone assigns consistent ids and
    /// dependency edges.
    pub(crate) const fn new(
        id: ActivationId,
        arguments: SymbolicArgumentSet,
        output_symbol: Symbol,
        dependencies: Vec<ActivationId>,
    ) -> Self {
        Self {
            id,
            arguments,
            output_symbol,
            dependencies,
            trigger_on_result: TriggerSlot::empty(),
            trigger_on_descendants: TriggerSlot::empty(),
        }
    }

    /// Returns this activation's id.
    #[must_use]
    pub const fn id(&self) -> ActivationId {
        self.id
    }

    /// Returns the bound plugin identity and arguments.
    #[must_use]
    pub const fn arguments(&self) -> &SymbolicArgumentSet {
        &self.arguments
    }

    /// Returns the symbol representing this activation's result.
    #[must_use]
    pub const fn output_symbol(&self) -> Symbol {
        self.output_symbol
    }

    /// Returns the ids of sibling activations this one depends on.
    #[must_use]
    pub fn dependencies(&self) -> &[ActivationId] {
        &self.dependencies
    }

    /// Returns this activation's `trigger_on_result` slot.
    #[must_use]
    pub const fn trigger_on_result(&self) -> &TriggerSlot<Trig> {
        &self.trigger_on_result
    }

    /// Returns a mutable reference to `trigger_on_result`.
    pub fn trigger_on_result_mut(&mut self) -> &mut TriggerSlot<Trig> {
        &mut self.trigger_on_result
    }

    /// Returns this activation's `trigger_on_descendants` slot.
    #[must_use]
    pub const fn trigger_on_descendants(&self) -> &TriggerSlot<Trig> {
        &self.trigger_on_descendants
    }

    /// Returns a mutable reference to `trigger_on_descendants`.
    pub fn trigger_on_descendants_mut(&mut self) -> &mut TriggerSlot<Trig> {
        &mut self.trigger_on_descendants
    }
}
