// shardgraph-plugins/src/registry.rs
// ============================================================================
// Module: Plugin Registry
// Description: A name-keyed collection of plugins, handed to the evaluator.
// Purpose: Let callers assemble the set of plugins a graph may invoke
//          without hand-writing a `HashMap<PluginId, Arc<dyn Plugin>>`.
// Dependencies: shardgraph-core
// ============================================================================

//! ## Overview
//! [`PluginRegistry`] is a thin builder around the
//! `HashMap<PluginId, Arc<dyn Plugin>>` that [`shardgraph_core::evaluate`]
//! takes directly. [`PluginRegistry::with_arithmetic_plugins`] seeds it with
//! every plugin in [`crate::arithmetic`], the set this crate's tests and the
//! CLI demo graph build against.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use shardgraph_core::Plugin;
use shardgraph_core::PluginId;

use crate::arithmetic::AddPlugin;
use crate::arithmetic::ConstPlugin;
use crate::arithmetic::DivPlugin;
use crate::arithmetic::DivisorsPlugin;
use crate::arithmetic::MaxPlugin;
use crate::arithmetic::MinPlugin;
use crate::arithmetic::MulPlugin;
use crate::arithmetic::PowPlugin;
use crate::arithmetic::SubPlugin;

// ============================================================================
// SECTION: PluginRegistry
// ============================================================================

/// A named collection of plugins, ready to hand to `shardgraph_core::evaluate`.
#[derive(Debug, Default, Clone)]
pub struct PluginRegistry {
    /// Registered plugins, keyed by their stable identity.
    plugins: HashMap<PluginId, Arc<dyn Plugin>>,
}

impl PluginRegistry {
    /// Builds an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry seeded with every plugin in [`crate::arithmetic`].
    #[must_use]
    pub fn with_arithmetic_plugins() -> Self {
        let mut registry = Self::new();
        registry.register(ConstPlugin);
        registry.register(AddPlugin);
        registry.register(SubPlugin);
        registry.register(MulPlugin);
        registry.register(DivPlugin);
        registry.register(PowPlugin);
        registry.register(MaxPlugin);
        registry.register(MinPlugin);
        registry.register(DivisorsPlugin);
        registry
    }

    /// Registers `plugin`, replacing any existing entry with the same
    /// [`PluginId`].
    pub fn register(&mut self, plugin: impl Plugin + 'static) {
        self.plugins.insert(plugin.id(), Arc::new(plugin));
    }

    /// Returns whether `id` is registered.
    #[must_use]
    pub fn contains(&self, id: &PluginId) -> bool {
        self.plugins.contains_key(id)
    }

    /// Returns the registered plugin for `id`, if any.
    #[must_use]
    pub fn plugin(&self, id: &PluginId) -> Option<&Arc<dyn Plugin>> {
        self.plugins.get(id)
    }

    /// Consumes the registry, returning the raw map `evaluate` expects.
    #[must_use]
    pub fn into_map(self) -> HashMap<PluginId, Arc<dyn Plugin>> {
        self.plugins
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

    #[test]
    fn arithmetic_registry_contains_every_seeded_plugin() {
        let registry = PluginRegistry::with_arithmetic_plugins();
        assert!(registry.contains(&PluginId::new("const", "1")));
        assert!(registry.contains(&PluginId::new("add", "1")));
        assert!(registry.contains(&PluginId::new("divisors", "1")));
    }

    #[test]
    fn register_overwrites_existing_id() {
        let mut registry = PluginRegistry::new();
        registry.register(ConstPlugin);
        registry.register(ConstPlugin);
        assert_eq!(registry.into_map().len(), 1);
    }
}
