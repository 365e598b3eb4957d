// shardgraph-core/src/eval/state.rs
// ============================================================================
// Module: Evaluation State
// Description: Owns every DataNode, the sealed graph, the plugin registry,
//              and the database handle for one evaluation run, and runs the
//              "as soon as possible" trigger cascade.
// Purpose: Be the single mutable surface every evaluation algorithm and
//          every fired trigger operates through.
// Dependencies: crate::eval::data_node, crate::eval::eligibility,
//               crate::interfaces::Database, crate::memory::MemoryInfo,
//               crate::model::*
// ============================================================================

//! ## Overview
//! [`EvaluationState`] is the mutable heart of one `evaluate` call: one
//! [`DataNode`] per activation, the [`SealedActivationGraph`] those nodes
//! describe, a plugin registry to invoke, and the [`Database`] results may
//! be spilled to and reloaded from. A registered trigger is a boxed closure
//! ([`Trigger`]) that receives `&mut EvaluationState` and may freely add new
//! activations to the graph (splicing in a dynamically generated
//! sub-computation) or register further triggers.
//!
//! Firing follows an "as soon as possible" cascade: as soon as an
//! activation's result first lands in memory, its `trigger_on_result`
//! fires immediately, before moving on to any other pending work. Once no
//! activation has a ready `trigger_on_result`, eligible `trigger_on_descendants`
//! fire one at a time (an activation is eligible once none of its
//! descendants carry any trigger of their own, per
//! [`crate::eval::eligibility::ActivationEligibilityDetector`]). Only once
//! neither kind of trigger has anything left to do does the graph's own
//! `trigger_method` fire.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::collections::HashSet;
use std::collections::VecDeque;
use std::sync::Arc;

use thiserror::Error;

use crate::eval::data_node::DataNode;
use crate::eval::data_node::DataNodeError;
use crate::eval::data_node::DataNodeState;
use crate::eval::eligibility::ActivationEligibilityDetector;
use crate::interfaces::Database;
use crate::interfaces::DatabaseError;
use crate::memory::MemoryInfo;
use crate::memory::MemoryInfoError;
use crate::model::ActivationId;
use crate::model::ArgumentError;
use crate::model::DataDefinition;
use crate::model::Payload;
use crate::model::Plugin;
use crate::model::PluginId;
use crate::model::PluginInvokeError;
use crate::model::SealedActivationGraph;
use crate::model::ShareMode;
use crate::model::Symbol;
use crate::model::TriggerSlotError;

// ============================================================================
// SECTION: Trigger
// ============================================================================

/// A callback registered on an activation's `trigger_on_result` /
/// `trigger_on_descendants` slot, or on the graph's own `trigger_method`
/// slot.
///
/// Triggers may mutate the graph (splicing in new activations) and
/// register further triggers; they run with exclusive access to the whole
/// evaluation state.
pub type Trigger<D> = Box<dyn FnOnce(&mut EvaluationState<D>) -> Result<(), EvaluatorError> + Send>;

// ============================================================================
// SECTION: EvaluatorError
// ============================================================================

/// Errors raised while running an evaluation.
#[derive(Debug, Error)]
pub enum EvaluatorError {
    /// A data node transition was attempted out of order.
    #[error(transparent)]
    DataNode(#[from] DataNodeError),
    /// A construction-time argument error surfaced during evaluation (for
    /// example, a trigger spliced in an activation with a foreign symbol).
    #[error(transparent)]
    Argument(#[from] ArgumentError),
    /// A trigger slot was set or cleared illegally.
    #[error(transparent)]
    TriggerSlot(#[from] TriggerSlotError),
    /// The plugin registry has no entry for a referenced plugin id.
    #[error("no plugin registered for {0}")]
    UnknownPlugin(PluginId),
    /// A plugin invocation failed.
    #[error(transparent)]
    PluginInvoke(#[from] PluginInvokeError),
    /// The database backing spilled results failed.
    #[error(transparent)]
    Database(#[from] DatabaseError),
    /// Memory usage could not be read while deciding whether to spill.
    #[error(transparent)]
    MemoryInfo(#[from] MemoryInfoError),
    /// An activation id did not refer to any node.
    #[error("no activation for id {0}")]
    UnknownActivation(ActivationId),
    /// A dependency's data node was not in a state its result could be
    /// read from.
    #[error("dependency {0} of activation {1} is not available")]
    DependencyNotAvailable(ActivationId, ActivationId),
}

// ============================================================================
// SECTION: EvaluationState
// ============================================================================

/// Owns everything one `evaluate` call needs: the graph, one `DataNode`
/// per activation, the plugin registry, the database, and memory
/// introspection.
pub struct EvaluationState<D> {
    /// The sealed graph being evaluated; triggers may add activations to
    /// it but never remove any.
    graph: SealedActivationGraph<Trigger<D>>,
    /// One data node per activation, indexed by [`ActivationId::index`].
    nodes: Vec<DataNode<Trigger<D>>>,
    /// Plugins this evaluation may invoke, keyed by id.
    plugins: HashMap<PluginId, Arc<dyn Plugin>>,
    /// Spilled-result storage, opened on [`Self::new`] and closed on drop.
    database: D,
    /// Process memory introspection, used to decide when to spill.
    memory_info: Box<dyn MemoryInfo>,
    /// Activations with a pending `trigger_on_result`, in the order their
    /// result first landed.
    objectives: VecDeque<ActivationId>,
    /// Activations whose result (and whole subtree) is known to be stable:
    /// no trigger anywhere in their dependency closure will ever fire
    /// again.
    results: HashSet<ActivationId>,
    /// Memoized content-addressed identity per activation, built lazily
    /// (and recursively) on first [`Self::storage_key`] request.
    definitions: Vec<Option<DataDefinition>>,
}

impl<D: Database> EvaluationState<D> {
    /// Builds a fresh evaluation state for `graph`, opening `database` for
    /// the duration of this state's life; it is closed when this state is
    /// dropped, on every exit path including a panic unwind.
    ///
    /// # Errors
    ///
    /// Propagates [`DatabaseError`] if `database.open()` fails.
    pub fn new(
        graph: SealedActivationGraph<Trigger<D>>,
        plugins: HashMap<PluginId, Arc<dyn Plugin>>,
        mut database: D,
        memory_info: Box<dyn MemoryInfo>,
    ) -> Result<Self, EvaluatorError> {
        database.open()?;
        let nodes = (0..graph.len()).map(|_| DataNode::new()).collect();
        Ok(Self {
            graph,
            nodes,
            plugins,
            database,
            memory_info,
            objectives: VecDeque::new(),
            results: HashSet::new(),
            definitions: Vec::new(),
        })
    }

    /// Returns the graph being evaluated.
    #[must_use]
    pub const fn graph(&self) -> &SealedActivationGraph<Trigger<D>> {
        &self.graph
    }

    /// Returns a mutable reference to the graph being evaluated; used by
    /// triggers that splice in new activations.
    pub fn graph_mut(&mut self) -> &mut SealedActivationGraph<Trigger<D>> {
        &mut self.graph
    }

    /// Returns the activations whose subtree is known fully stable.
    #[must_use]
    pub const fn results(&self) -> &HashSet<ActivationId> {
        &self.results
    }

    /// Returns the data node for `id`, growing the node arena first if the
    /// graph has gained activations since this state was built.
    fn node_mut(&mut self, id: ActivationId) -> &mut DataNode<Trigger<D>> {
        if id.index() >= self.nodes.len() {
            self.nodes.resize_with(id.index() + 1, DataNode::new);
        }
        &mut self.nodes[id.index()]
    }

    /// Returns the data node for `id`, if it has been allocated.
    #[must_use]
    pub fn node(&self, id: ActivationId) -> Option<&DataNode<Trigger<D>>> {
        self.nodes.get(id.index())
    }

    /// Returns the materialized result for `id`, if its node is currently
    /// `Memory`.
    #[must_use]
    pub fn memory_value(&self, id: ActivationId) -> Option<&Payload> {
        self.nodes.get(id.index()).and_then(DataNode::payload)
    }

    /// Computes (and memoizes) the content-addressed
    /// [`crate::model::DataDefinition`] for `id`, recursively resolving
    /// every dependency's own definition first so the resulting digest is
    /// stable across runs and processes, unlike the ephemeral in-process
    /// [`Symbol`] ids the graph itself uses.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluatorError::UnknownActivation`] if `id` or one of its
    /// dependencies is not a known activation. Propagates [`ArgumentError`]
    /// if the underlying arguments cannot be interned.
    pub fn data_definition(&mut self, id: ActivationId) -> Result<DataDefinition, EvaluatorError> {
        if let Some(Some(definition)) = self.definitions.get(id.index()) {
            return Ok(definition.clone());
        }

        let activation = self
            .graph
            .activation(id)
            .ok_or(EvaluatorError::UnknownActivation(id))?;
        let plugin_id = activation.arguments().plugin_id().clone();
        let arguments = activation.arguments().clone();
        let dependencies = activation.dependencies().to_vec();

        let mut bindings = std::collections::BTreeMap::new();
        for dependency in dependencies {
            let output_symbol = self
                .graph
                .activation(dependency)
                .ok_or(EvaluatorError::UnknownActivation(dependency))?
                .output_symbol();
            let definition = self.data_definition(dependency)?;
            bindings.insert(output_symbol, definition);
        }

        let definition = DataDefinition::new(plugin_id, arguments, bindings)?;
        if id.index() >= self.definitions.len() {
            self.definitions.resize(id.index() + 1, None);
        }
        self.definitions[id.index()] = Some(definition.clone());
        Ok(definition)
    }

    /// Returns the content-addressed storage key for an activation's
    /// result; see [`Self::data_definition`].
    ///
    /// # Errors
    ///
    /// Propagates [`EvaluatorError`] from [`Self::data_definition`].
    pub fn storage_key(
        &mut self,
        id: ActivationId,
    ) -> Result<crate::hashing::HashDigest, EvaluatorError> {
        Ok(self.data_definition(id)?.digest().clone())
    }

    /// Looks up the lookup result (from storage) for `id`'s node while it
    /// is `Unknown`, firing any registered callback.
    ///
    /// # Errors
    ///
    /// Propagates database and data-node errors.
    pub fn try_load(&mut self, id: ActivationId) -> Result<(), EvaluatorError> {
        let key = self.storage_key(id)?;
        let found = if self.database.contains(&key) {
            Some(self.database.load(&key)?)
        } else {
            None
        };
        let hit = found.is_some();
        let fired = self.node_mut(id).try_load(found)?;
        self.run_trigger(fired)?;
        if hit {
            // First entry into Memory: trigger_on_result becomes eligible to
            // fire. A load miss leaves the node at NoData, not Memory, so it
            // does not qualify.
            self.enqueue_objective(id);
        }
        Ok(())
    }

    /// Invokes `id`'s plugin against its dependencies' materialized
    /// results, firing any registered `on_evaluate` callback.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluatorError::DependencyNotAvailable`] if a dependency
    /// is not currently `Memory`. Propagates plugin and data-node errors.
    pub fn evaluate_activation(&mut self, id: ActivationId) -> Result<(), EvaluatorError> {
        let activation = self
            .graph
            .activation(id)
            .ok_or(EvaluatorError::UnknownActivation(id))?;
        let plugin_id = activation.arguments().plugin_id().clone();
        let plugin = self
            .plugins
            .get(&plugin_id)
            .cloned()
            .ok_or_else(|| EvaluatorError::UnknownPlugin(plugin_id))?;

        let mut bindings: HashMap<Symbol, Payload> = HashMap::new();
        for dependency in activation.dependencies() {
            let value = self
                .memory_value(*dependency)
                .ok_or(EvaluatorError::DependencyNotAvailable(*dependency, id))?
                .clone();
            let output_symbol = self
                .graph
                .activation(*dependency)
                .ok_or(EvaluatorError::UnknownActivation(*dependency))?
                .output_symbol();
            bindings.insert(output_symbol, value);
        }

        let bound_arguments = activation.arguments().bound();
        let mut materialized = crate::model::BoundArguments {
            by_parameter: Vec::with_capacity(bound_arguments.by_parameter.len()),
            extra_positional: Vec::with_capacity(bound_arguments.extra_positional.len()),
            extra_keyword: std::collections::BTreeMap::new(),
        };
        for (name, object) in &bound_arguments.by_parameter {
            let value = object
                .get_value(&bindings, ShareMode::Shared)
                .map_err(|err| match err {
                    crate::model::GetValueError::Unbound(err) => {
                        ArgumentError::NotHashable(err.to_string())
                    }
                    crate::model::GetValueError::DuplicateKey(key) => {
                        ArgumentError::NotHashable(format!("duplicate key {key:?}"))
                    }
                })?;
            materialized.by_parameter.push((name.clone(), value));
        }
        for object in &bound_arguments.extra_positional {
            let value = object
                .get_value(&bindings, ShareMode::Shared)
                .map_err(|err| ArgumentError::NotHashable(err.to_string()))?;
            materialized.extra_positional.push(value);
        }
        for (name, object) in &bound_arguments.extra_keyword {
            let value = object
                .get_value(&bindings, ShareMode::Shared)
                .map_err(|err| ArgumentError::NotHashable(err.to_string()))?;
            materialized.extra_keyword.insert(name.clone(), value);
        }

        let result = plugin.invoke(&materialized)?;
        let fired = self.node_mut(id).evaluate(result)?;
        self.run_trigger(fired)?;
        // NoData -> Memory is always a first entry into Memory.
        self.enqueue_objective(id);
        Ok(())
    }

    /// Spills `id`'s in-memory result to the database, firing any
    /// registered `on_store` callback.
    ///
    /// # Errors
    ///
    /// Propagates database and data-node errors.
    pub fn store(&mut self, id: ActivationId) -> Result<(), EvaluatorError> {
        let key = self.storage_key(id)?;
        let payload = self
            .memory_value(id)
            .cloned()
            .ok_or(EvaluatorError::DependencyNotAvailable(id, id))?;
        self.database.save(&key, &payload)?;
        let fired = self.node_mut(id).store()?;
        self.run_trigger(fired)
    }

    /// Reloads `id`'s spilled result into memory, firing any registered
    /// `on_reload` callback.
    ///
    /// # Errors
    ///
    /// Propagates database and data-node errors.
    pub fn reload(&mut self, id: ActivationId) -> Result<(), EvaluatorError> {
        let key = self.storage_key(id)?;
        let payload = self.database.load(&key)?;
        let fired = self.node_mut(id).load(payload)?;
        self.run_trigger(fired)
    }

    /// Returns the current lifecycle state of `id`'s node, or `Unknown` if
    /// no node has been allocated for it yet.
    #[must_use]
    pub fn state_of(&self, id: ActivationId) -> DataNodeState {
        self.nodes
            .get(id.index())
            .map_or(DataNodeState::Unknown, DataNode::state)
    }

    /// Returns the current process virtual memory usage.
    ///
    /// # Errors
    ///
    /// Propagates [`MemoryInfoError`].
    pub fn used_virtual_memory(&self) -> Result<u64, EvaluatorError> {
        Ok(self.memory_info.used_virtual_memory()?)
    }

    /// Runs `fired`, if a callback was returned by a `DataNode` transition,
    /// then drains the trigger cascade.
    fn run_trigger(&mut self, fired: Option<Trigger<D>>) -> Result<(), EvaluatorError> {
        if let Some(trigger) = fired {
            trigger(self)?;
        }
        Ok(())
    }

    /// Registers `id` as having a freshly pending `trigger_on_result`,
    /// joining the objective queue that [`Self::drain_objectives`] runs
    /// down, implementing the "as soon as possible" cascade policy: objective
    /// triggers always run before any `trigger_on_descendants` is considered.
    pub fn enqueue_objective(&mut self, id: ActivationId) {
        self.objectives.push_back(id);
    }

    /// Runs every pending `trigger_on_result` to completion, in the order
    /// results first landed, then fires every eligible
    /// `trigger_on_descendants`, and finally the graph's own
    /// `trigger_method` once nothing else is pending.
    ///
    /// # Errors
    ///
    /// Propagates any error raised by a fired trigger.
    pub fn drain_objectives(&mut self) -> Result<(), EvaluatorError> {
        while let Some(id) = self.objectives.pop_front() {
            if let Some(node) = self.graph.activation_mut(id)
                && node.trigger_on_result().is_present()
            {
                let trigger = node.trigger_on_result_mut().clear()?;
                trigger(self)?;
            }
        }

        loop {
            let detector = ActivationEligibilityDetector::build(&self.graph);
            let eligible = self
                .graph
                .activations()
                .filter(|activation| activation.trigger_on_descendants().is_present())
                .map(crate::model::Activation::id)
                .find(|id| detector.is_eligible(&self.graph, *id));
            let Some(id) = eligible else {
                break;
            };
            if let Some(node) = self.graph.activation_mut(id) {
                let trigger = node.trigger_on_descendants_mut().clear()?;
                trigger(self)?;
            }
            while let Some(id) = self.objectives.pop_front() {
                if let Some(node) = self.graph.activation_mut(id)
                    && node.trigger_on_result().is_present()
                {
                    let trigger = node.trigger_on_result_mut().clear()?;
                    trigger(self)?;
                }
            }
        }

        if self.graph.trigger_method().is_present() {
            let trigger = self.graph.clear_trigger_method()?;
            trigger(self)?;
        }
        Ok(())
    }

    /// Marks `id` as a settled result: its entire dependency subtree is
    /// stable and no further trigger will touch it.
    pub fn mark_result(&mut self, id: ActivationId) {
        self.results.insert(id);
    }
}

impl<D: Database> Drop for EvaluationState<D> {
    /// Closes the database opened by [`Self::new`]. Mirrors
    /// [`crate::interfaces::DatabaseHandle`]'s open-on-acquire,
    /// close-on-drop discipline; this state cannot borrow the database
    /// through that handle because trigger closures need `&mut` access to
    /// it for the state's entire life, so it owns the database outright and
    /// closes it itself, on every exit path including a panic unwind.
    fn drop(&mut self) {
        let _ = self.database.close();
    }
}
