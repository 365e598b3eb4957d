// shardgraph-core/src/model/data_definition.rs
// ============================================================================
// Module: Data Definition
// Description: Interned, content-addressed identity of a plugin invocation.
// Purpose: Give every activation a stable digest built from "which plugin,
//          with which arguments, where every free symbol resolves to
//          another data definition's own digest" — so that two activations
//          with identical logical identity always collapse to the same
//          handle, process-wide.
// Dependencies: crate::hashing, crate::model::{ArgumentError, PluginId,
//               Symbol, SymbolicArgumentSet}
// ============================================================================

//! ## Overview
//! A [`DataDefinition`] is the recursive, content-addressed description of
//! one plugin invocation: a [`PluginId`], a [`SymbolicArgumentSet`] bound to
//! that plugin's signature, and a map resolving every free [`Symbol`] the
//! argument set still contains to another `DataDefinition`. Two
//! `DataDefinition`s built from equal inputs are guaranteed to be the exact
//! same handle (`Arc` pointer-equal), via a process-wide intern table keyed
//! by content digest — this is what lets the graph layer deduplicate
//! activations by `(plugin, arguments)` cheaply.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::OnceLock;

use serde::Serialize;

use crate::hashing;
use crate::hashing::HashAlgorithm;
use crate::hashing::HashDigest;
use crate::model::ArgumentError;
use crate::model::PluginId;
use crate::model::Symbol;
use crate::model::SymbolicArgumentSet;

// ============================================================================
// SECTION: DataDefinition
// ============================================================================

/// The interned contents of a [`DataDefinition`].
#[derive(Debug)]
struct Inner {
    /// Plugin this definition invokes.
    plugin_id: PluginId,
    /// Arguments bound to the plugin's signature; any free symbols here are
    /// resolved through `bindings`.
    arguments: SymbolicArgumentSet,
    /// Resolves every free symbol in `arguments` to the definition that
    /// produces its value.
    bindings: BTreeMap<Symbol, DataDefinition>,
    /// Content digest identifying this definition process-wide.
    digest: HashDigest,
}

/// The content-addressed identity of one plugin invocation.
///
/// Cloning a `DataDefinition` is cheap (an `Arc` clone); two definitions
/// built from equal `(plugin_id, arguments, bindings)` triples are always
/// the same underlying `Arc`, courtesy of [`intern`].
#[derive(Debug, Clone)]
pub struct DataDefinition(Arc<Inner>);

/// Process-wide table deduplicating `DataDefinition`s by content digest.
static INTERN_TABLE: OnceLock<Mutex<BTreeMap<HashDigest, DataDefinition>>> = OnceLock::new();

impl DataDefinition {
    /// Builds (or returns the already-interned) definition for invoking
    /// `plugin_id` with `arguments`, resolving `arguments`' free symbols
    /// through `bindings`.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::ForeignSymbol`] if `arguments` contains a
    /// free symbol absent from `bindings`.
    pub fn new(
        plugin_id: PluginId,
        arguments: SymbolicArgumentSet,
        bindings: BTreeMap<Symbol, DataDefinition>,
    ) -> Result<Self, ArgumentError> {
        for symbol in arguments.get_symbols() {
            if !bindings.contains_key(&symbol) {
                return Err(ArgumentError::ForeignSymbol(symbol));
            }
        }

        let digest = Self::compute_digest(&plugin_id, &arguments, &bindings)?;
        let table = INTERN_TABLE.get_or_init(|| Mutex::new(BTreeMap::new()));
        let mut table = table.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(existing) = table.get(&digest) {
            return Ok(existing.clone());
        }
        let definition = Self(Arc::new(Inner {
            plugin_id,
            arguments,
            bindings,
            digest: digest.clone(),
        }));
        table.insert(digest, definition.clone());
        Ok(definition)
    }

    /// Computes this definition's content digest from its logical identity,
    /// replacing every bound symbol with the digest of what it resolves to
    /// so that structurally-equal definitions always hash identically.
    fn compute_digest(
        plugin_id: &PluginId,
        arguments: &SymbolicArgumentSet,
        bindings: &BTreeMap<Symbol, DataDefinition>,
    ) -> Result<HashDigest, ArgumentError> {
        #[derive(Serialize)]
        struct Canonical<'a> {
            plugin_id: &'a PluginId,
            arguments: &'a SymbolicArgumentSet,
            bindings: BTreeMap<String, &'a HashDigest>,
        }

        let bindings = bindings
            .iter()
            .map(|(symbol, definition)| (symbol.to_string(), definition.digest()))
            .collect();
        let canonical = Canonical {
            plugin_id,
            arguments,
            bindings,
        };
        hashing::hash_canonical_json(HashAlgorithm::Sha256, &canonical)
            .map_err(|err| ArgumentError::NotHashable(err.to_string()))
    }

    /// Returns this definition's stable, process-wide content digest.
    #[must_use]
    pub fn digest(&self) -> &HashDigest {
        &self.0.digest
    }

    /// Returns the plugin this definition invokes.
    #[must_use]
    pub fn plugin_id(&self) -> &PluginId {
        &self.0.plugin_id
    }

    /// Returns the argument set bound to the plugin's signature.
    #[must_use]
    pub fn arguments(&self) -> &SymbolicArgumentSet {
        &self.0.arguments
    }

    /// Returns the map resolving every free symbol in [`Self::arguments`]
    /// to the definition producing its value.
    #[must_use]
    pub fn bindings(&self) -> &BTreeMap<Symbol, DataDefinition> {
        &self.0.bindings
    }
}

impl PartialEq for DataDefinition {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.digest == other.0.digest
    }
}

impl Eq for DataDefinition {}

impl std::hash::Hash for DataDefinition {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.digest.hash(state);
    }
}

impl PartialOrd for DataDefinition {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DataDefinition {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.digest.cmp(&other.0.digest)
    }
}
