// shardgraph-core/src/model/graph.rs
// ============================================================================
// Module: Activation Graph
// Description: Arena of deduplicated plugin-invocation activations.
// Purpose: Build up a computation graph incrementally, deduplicating
//          activations that invoke the same plugin with the same bound
//          arguments, then seal it into an immutable graph ready for
//          evaluation.
// Dependencies: crate::model::{Activation, ActivationId, ArgumentError,
//               PluginId, Signature, Symbol, SymbolicArgumentSet,
//               SymbolicObject, TriggerSlot, TriggerSlotError}
// ============================================================================

//! ## Overview
//! [`ActivationGraph`] is the mutable builder: call [`ActivationGraph::declare_input`]
//! for each free parameter the graph itself takes, then
//! [`ActivationGraph::add_activation`] for every plugin invocation, building
//! later activations' arguments out of earlier ones' output symbols (or
//! declared input symbols). A graph may be spliced into another as a
//! reusable sub-computation via [`ActivationGraph::attach_graph`], which
//! realizes the sub-graph's declared inputs against symbolic objects in the
//! parent's own scope. Once every declared input has been realized,
//! [`ActivationGraph::seal`] produces an immutable [`SealedActivationGraph`],
//! the only form the evaluator accepts.
//!
//! Grounded on the entry-arena pattern used by `pantsbuild/pants`'s
//! rust-engine graph (`EntryId` + `Entries` map) and `buck2`'s `dice`
//! incremental graph: nodes live in a flat arena and are addressed by a
//! small integer id rather than by pointer or name.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::collections::HashSet;

use crate::model::Activation;
use crate::model::ActivationId;
use crate::model::ArgumentError;
use crate::model::PluginId;
use crate::model::Signature;
use crate::model::Symbol;
use crate::model::SymbolicArgumentSet;
use crate::model::SymbolicObject;
use crate::model::TriggerSlot;
use crate::model::TriggerSlotError;

// ============================================================================
// SECTION: ActivationGraph
// ============================================================================

/// A mutable, deduplicating builder of [`Activation`]s.
///
/// `Trig` is the payload type carried by trigger slots; the graph layer is
/// agnostic to what a trigger actually does, leaving that to the evaluation
/// layer that instantiates this type.
#[derive(Debug)]
pub struct ActivationGraph<Trig> {
    /// Arena of activations, indexed by [`ActivationId::index`].
    activations: Vec<Activation<Trig>>,
    /// Maps a bound argument set to the activation that already realizes
    /// it, so re-adding an identical invocation is a cheap no-op.
    dedup_index: HashMap<SymbolicArgumentSet, ActivationId>,
    /// Maps every symbol this graph knows about (declared inputs and
    /// activation outputs) to the activation that owns it, or `None` for a
    /// still-unrealized declared input.
    symbol_owner: HashMap<Symbol, Option<ActivationId>>,
    /// Declared inputs not yet realized via [`Self::attach_graph`].
    unrealized_inputs: Vec<Symbol>,
    /// This graph's own trigger, fired when nothing else is pending.
    trigger_method: TriggerSlot<Trig>,
}

impl<Trig> Default for ActivationGraph<Trig> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Trig> ActivationGraph<Trig> {
    /// Builds an empty graph with no activations and no declared inputs.
    #[must_use]
    pub fn new() -> Self {
        Self {
            activations: Vec::new(),
            dedup_index: HashMap::new(),
            symbol_owner: HashMap::new(),
            unrealized_inputs: Vec::new(),
            trigger_method: TriggerSlot::empty(),
        }
    }

    /// Declares a new free input parameter of this graph and returns the
    /// symbol activations may reference to mean "whatever this graph is
    /// eventually called with here".
    pub fn declare_input(&mut self) -> Symbol {
        let symbol = Symbol::fresh();
        self.symbol_owner.insert(symbol, None);
        self.unrealized_inputs.push(symbol);
        symbol
    }

    /// Declared inputs not yet realized.
    #[must_use]
    pub fn unrealized_inputs(&self) -> &[Symbol] {
        &self.unrealized_inputs
    }

    /// Returns the activation with the given id, if present.
    #[must_use]
    pub fn activation(&self, id: ActivationId) -> Option<&Activation<Trig>> {
        self.activations.get(id.index())
    }

    /// Returns a mutable reference to the activation with the given id.
    pub fn activation_mut(&mut self, id: ActivationId) -> Option<&mut Activation<Trig>> {
        self.activations.get_mut(id.index())
    }

    /// Iterates over every activation currently in the graph, in insertion
    /// order.
    pub fn activations(&self) -> impl Iterator<Item = &Activation<Trig>> {
        self.activations.iter()
    }

    /// Number of activations currently in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.activations.len()
    }

    /// Whether the graph has no activations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.activations.is_empty()
    }

    /// Binds `positional`/`keyword` symbolic arguments to `signature` for
    /// `plugin_id` and adds the resulting activation, or returns the
    /// existing one if an activation with an identical bound argument set
    /// already exists (idempotent add).
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::ForeignSymbol`] if an argument references a
    /// symbol this graph does not know (neither a declared input nor an
    /// existing activation's output). Propagates [`ArgumentError`] from
    /// [`Signature::bind`] for signature mismatches.
    pub fn add_activation(
        &mut self,
        plugin_id: PluginId,
        signature: &Signature,
        positional: Vec<SymbolicObject>,
        keyword: std::collections::BTreeMap<String, SymbolicObject>,
    ) -> Result<(ActivationId, Symbol), ArgumentError> {
        let arguments = SymbolicArgumentSet::new(plugin_id, signature, positional, keyword)?;

        if let Some(existing) = self.dedup_index.get(&arguments) {
            let output_symbol = self.activations[existing.index()].output_symbol();
            return Ok((*existing, output_symbol));
        }

        let mut dependencies = Vec::new();
        let mut seen = HashSet::new();
        for symbol in arguments.get_symbols() {
            let owner = self
                .symbol_owner
                .get(&symbol)
                .ok_or(ArgumentError::ForeignSymbol(symbol))?;
            if let Some(owner_id) = owner
                && seen.insert(*owner_id)
            {
                dependencies.push(*owner_id);
            }
        }
        dependencies.sort_unstable();

        let id = ActivationId::from_index(u32::try_from(self.activations.len()).unwrap_or(u32::MAX));
        let output_symbol = Symbol::fresh();
        self.dedup_index.insert(arguments.clone(), id);
        self.symbol_owner.insert(output_symbol, Some(id));
        self.activations
            .push(Activation::new(id, arguments, output_symbol, dependencies));
        Ok((id, output_symbol))
    }

    /// Splices `sub`'s activations into `self`, realizing each of `sub`'s
    /// declared inputs against the corresponding entry of `realizations`
    /// (in declaration order).
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::RealizationCountMismatch`] if
    /// `realizations.len()` does not equal `sub`'s number of unrealized
    /// declared inputs.
    pub fn attach_graph(
        &mut self,
        sub: Self,
        realizations: Vec<SymbolicObject>,
    ) -> Result<(), ArgumentError>
    where
        Trig: Clone,
    {
        if realizations.len() != sub.unrealized_inputs.len() {
            return Err(ArgumentError::RealizationCountMismatch {
                expected: sub.unrealized_inputs.len(),
                actual: realizations.len(),
            });
        }

        let substitutions: Vec<(Symbol, SymbolicObject)> = sub
            .unrealized_inputs
            .iter()
            .copied()
            .zip(realizations)
            .collect();

        let offset = u32::try_from(self.activations.len()).unwrap_or(u32::MAX);
        let remap = |old: ActivationId| -> ActivationId {
            ActivationId::from_index(offset + u32::try_from(old.index()).unwrap_or(u32::MAX))
        };

        for activation in sub.activations {
            let substituted_arguments = activation.arguments().substitute(&substitutions)?;
            let id = remap(activation.id());
            let output_symbol = activation.output_symbol();
            let dependencies = activation.dependencies().iter().copied().map(remap).collect();
            self.dedup_index
                .insert(substituted_arguments.clone(), id);
            self.symbol_owner.insert(output_symbol, Some(id));
            self.activations.push(Activation::new(
                id,
                substituted_arguments,
                output_symbol,
                dependencies,
            ));
        }
        Ok(())
    }

    /// Registers this graph's own trigger, fired once no activation has
    /// any pending trigger.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerSlotError::AlreadyPresent`] if already set.
    pub fn set_trigger_method(&mut self, trigger: Trig) -> Result<(), TriggerSlotError> {
        self.trigger_method.set(trigger)
    }

    /// Clears this graph's own trigger.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerSlotError::Absent`] if no trigger is set.
    pub fn clear_trigger_method(&mut self) -> Result<Trig, TriggerSlotError> {
        self.trigger_method.clear()
    }

    /// Returns this graph's own trigger slot.
    #[must_use]
    pub const fn trigger_method(&self) -> &TriggerSlot<Trig> {
        &self.trigger_method
    }

    /// Finalizes this graph for evaluation.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::UnsealedInputs`] if any declared input has
    /// not been realized via [`Self::attach_graph`].
    pub fn seal(self) -> Result<SealedActivationGraph<Trig>, ArgumentError> {
        if !self.unrealized_inputs.is_empty() {
            return Err(ArgumentError::UnsealedInputs(self.unrealized_inputs.len()));
        }
        Ok(SealedActivationGraph { graph: self })
    }
}

// ============================================================================
// SECTION: SealedActivationGraph
// ============================================================================

/// An [`ActivationGraph`] with every declared input realized, ready for
/// evaluation.
///
/// Sealing does not make the graph immutable in the Rust-borrowing sense
/// (trigger slots still need interior mutation during evaluation); it only
/// guarantees the *structure* — activations, dependency edges, output
/// symbols — is complete and will not change.
#[derive(Debug)]
pub struct SealedActivationGraph<Trig> {
    graph: ActivationGraph<Trig>,
}

impl<Trig> SealedActivationGraph<Trig> {
    /// Returns the activation with the given id, if present.
    #[must_use]
    pub fn activation(&self, id: ActivationId) -> Option<&Activation<Trig>> {
        self.graph.activation(id)
    }

    /// Returns a mutable reference to the activation with the given id.
    pub fn activation_mut(&mut self, id: ActivationId) -> Option<&mut Activation<Trig>> {
        self.graph.activation_mut(id)
    }

    /// Iterates over every activation, in insertion order.
    pub fn activations(&self) -> impl Iterator<Item = &Activation<Trig>> {
        self.graph.activations()
    }

    /// Number of activations in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.len()
    }

    /// Whether the graph has no activations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    /// Returns this graph's own trigger slot.
    #[must_use]
    pub const fn trigger_method(&self) -> &TriggerSlot<Trig> {
        self.graph.trigger_method()
    }

    /// Adds a new activation after sealing; used by triggers splicing in a
    /// dynamically generated sub-computation mid-evaluation. Sealing
    /// guarantees every *declared input* is realized, not that the
    /// activation set is frozen, so this is allowed.
    ///
    /// # Errors
    ///
    /// See [`ActivationGraph::add_activation`].
    pub fn add_activation(
        &mut self,
        plugin_id: PluginId,
        signature: &Signature,
        positional: Vec<SymbolicObject>,
        keyword: std::collections::BTreeMap<String, SymbolicObject>,
    ) -> Result<(ActivationId, Symbol), ArgumentError> {
        self.graph.add_activation(plugin_id, signature, positional, keyword)
    }

    /// Clears this graph's own trigger.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerSlotError::Absent`] if no trigger is set.
    pub fn clear_trigger_method(&mut self) -> Result<Trig, TriggerSlotError> {
        self.graph.clear_trigger_method()
    }

    /// Registers this graph's own trigger.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerSlotError::AlreadyPresent`] if already set.
    pub fn set_trigger_method(&mut self, trigger: Trig) -> Result<(), TriggerSlotError> {
        self.graph.set_trigger_method(trigger)
    }

    /// Computes each activation's level: zero for an activation with no
    /// dependencies, otherwise one more than the greatest level among its
    /// dependencies. Indexed by [`ActivationId::index`].
    #[must_use]
    pub fn levels(&self) -> Vec<usize> {
        let mut levels = vec![0_usize; self.graph.activations.len()];
        for (index, activation) in self.graph.activations.iter().enumerate() {
            let level = activation
                .dependencies()
                .iter()
                .map(|dependency| levels[dependency.index()])
                .max()
                .map_or(0, |max| max + 1);
            levels[index] = level;
        }
        levels
    }

    /// Returns the ids of every activation nothing else in the graph
    /// depends on: the terminal, childless set whose materialized results
    /// `evaluate` reports back to its caller.
    ///
    /// Recomputed from the current dependency edges on every call, so a
    /// trigger that spliced in new activations (or gave a previously
    /// childless activation a new dependent) is reflected immediately.
    #[must_use]
    pub fn childless_activations(&self) -> Vec<ActivationId> {
        let mut has_child = vec![false; self.graph.activations.len()];
        for activation in &self.graph.activations {
            for dependency in activation.dependencies() {
                has_child[dependency.index()] = true;
            }
        }
        self.graph
            .activations
            .iter()
            .map(Activation::id)
            .filter(|id| !has_child[id.index()])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        reason = "Test-only assertions favor clarity over production error handling."
    )]

    use super::*;
    use crate::model::Parameter;

    fn const_signature() -> Signature {
        Signature::new(vec![Parameter::required("v")])
    }

    #[test]
    fn add_activation_is_idempotent() {
        let mut graph: ActivationGraph<()> = ActivationGraph::new();
        let (first, _) = graph
            .add_activation(
                PluginId::new("const", "1"),
                &const_signature(),
                vec![SymbolicObject::Value(1.into())],
                std::collections::BTreeMap::new(),
            )
            .expect("add");
        let (second, _) = graph
            .add_activation(
                PluginId::new("const", "1"),
                &const_signature(),
                vec![SymbolicObject::Value(1.into())],
                std::collections::BTreeMap::new(),
            )
            .expect("add again");
        assert_eq!(first, second);
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn add_activation_rejects_foreign_symbol() {
        let mut graph: ActivationGraph<()> = ActivationGraph::new();
        let stray = Symbol::fresh();
        let err = graph
            .add_activation(
                PluginId::new("identity", "1"),
                &const_signature(),
                vec![SymbolicObject::Symbol(stray)],
                std::collections::BTreeMap::new(),
            )
            .unwrap_err();
        assert!(matches!(err, ArgumentError::ForeignSymbol(_)));
    }

    #[test]
    fn dependency_chain_computes_increasing_levels() {
        let mut graph: ActivationGraph<()> = ActivationGraph::new();
        let (_, leaf_symbol) = graph
            .add_activation(
                PluginId::new("const", "1"),
                &const_signature(),
                vec![SymbolicObject::Value(1.into())],
                std::collections::BTreeMap::new(),
            )
            .expect("leaf");
        let identity_signature = Signature::new(vec![Parameter::required("v")]);
        graph
            .add_activation(
                PluginId::new("identity", "1"),
                &identity_signature,
                vec![SymbolicObject::Symbol(leaf_symbol)],
                std::collections::BTreeMap::new(),
            )
            .expect("dependent");

        let sealed = graph.seal().expect("seal");
        assert_eq!(sealed.levels(), vec![0, 1]);
    }

    #[test]
    fn seal_rejects_unrealized_inputs() {
        let mut graph: ActivationGraph<()> = ActivationGraph::new();
        graph.declare_input();
        let err = graph.seal().unwrap_err();
        assert!(matches!(err, ArgumentError::UnsealedInputs(1)));
    }

    #[test]
    fn attach_graph_realizes_declared_inputs() {
        let mut sub: ActivationGraph<()> = ActivationGraph::new();
        let input = sub.declare_input();
        let identity_signature = Signature::new(vec![Parameter::required("v")]);
        sub.add_activation(
            PluginId::new("identity", "1"),
            &identity_signature,
            vec![SymbolicObject::Symbol(input)],
            std::collections::BTreeMap::new(),
        )
        .expect("sub activation");

        let mut parent: ActivationGraph<()> = ActivationGraph::new();
        parent
            .attach_graph(sub, vec![SymbolicObject::Value(42.into())])
            .expect("attach");
        assert_eq!(parent.len(), 1);

        let sealed = parent.seal().expect("seal");
        assert_eq!(sealed.len(), 1);
    }
}
