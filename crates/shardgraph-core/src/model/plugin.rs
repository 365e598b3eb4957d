// shardgraph-core/src/model/plugin.rs
// ============================================================================
// Module: Plugin
// Description: The pure computation contract the evaluator invokes.
// Purpose: Decouple the evaluation core from any concrete plugin
//          implementation; `shardgraph-core` depends only on this trait,
//          never on a specific plugin crate.
// Dependencies: crate::model::{Payload, Signature}
// ============================================================================

//! ## Overview
//! A [`Plugin`] is a pure function over materialized [`Payload`] arguments,
//! identified by a stable [`PluginId`] and described by a [`Signature`].
//! Plugins must not perform I/O, mutate shared state, or depend on anything
//! but their own arguments: the evaluator memoizes invocations by content
//! hash of `(PluginId, arguments)` and will happily skip re-invoking a
//! plugin whose result is already on disk.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::model::BoundArguments;
use crate::model::Payload;
use crate::model::Signature;

// ============================================================================
// SECTION: PluginId
// ============================================================================

/// A plugin's stable identity: name plus version.
///
/// Two `PluginId`s with the same name but different versions are treated as
/// entirely unrelated plugins by the evaluator; this lets a plugin's
/// behavior change across versions without invalidating digests computed
/// under the old version (they simply hash differently).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PluginId {
    /// Plugin name, unique within a version.
    pub name: String,
    /// Plugin version string, opaque to the evaluator.
    pub version: String,
}

impl PluginId {
    /// Builds a new plugin identity.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

// ============================================================================
// SECTION: Plugin
// ============================================================================

/// A pure, content-addressable computation.
pub trait Plugin: fmt::Debug + Send + Sync {
    /// Returns this plugin's stable identity.
    fn id(&self) -> PluginId;

    /// Returns this plugin's declared parameter list.
    fn signature(&self) -> Signature;

    /// Invokes the plugin with fully materialized arguments.
    ///
    /// # Errors
    ///
    /// Returns [`PluginInvokeError`] if the plugin cannot produce a result
    /// for the given arguments.
    fn invoke(&self, arguments: &BoundArguments<Payload>) -> Result<Payload, PluginInvokeError>;
}

/// Errors a [`Plugin::invoke`] implementation may raise.
#[derive(Debug, Error)]
pub enum PluginInvokeError {
    /// An argument had the wrong shape or an out-of-domain value.
    #[error("invalid argument for plugin: {0}")]
    InvalidArgument(String),
    /// The plugin failed for a reason specific to its own domain logic.
    #[error("plugin invocation failed: {0}")]
    Failed(String),
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
    fn plugin_id_displays_name_at_version() {
        let id = PluginId::new("arithmetic.add", "1.0.0");
        assert_eq!(id.to_string(), "arithmetic.add@1.0.0");
    }

    #[test]
    fn plugin_ids_with_different_versions_are_distinct() {
        let a = PluginId::new("p", "1.0.0");
        let b = PluginId::new("p", "2.0.0");
        assert_ne!(a, b);
    }
}
