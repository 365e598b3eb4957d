// shardgraph-core/src/model/argument_set.rs
// ============================================================================
// Module: Symbolic Argument Set
// Description: Symbolic arguments bound to a plugin's declared signature.
// Purpose: Give every activation a hashable, content-addressable identity
//          built from "which plugin, with which symbolic arguments",
//          independent of the order arguments were originally supplied in.
// Dependencies: crate::model::{BoundArguments, PluginId, Signature,
//               SymbolicObject, Symbol}
// ============================================================================

//! ## Overview
//! A [`SymbolicArgumentSet`] is the result of binding a plugin invocation's
//! positional and keyword [`SymbolicObject`] arguments against that
//! plugin's [`Signature`]. Binding happens once, at construction time, so
//! that two argument sets built from differently-ordered keyword arguments
//! but an equal logical binding compare and hash equal.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::HashSet;

use serde::Serialize;

use crate::model::ArgumentError;
use crate::model::BoundArguments;
use crate::model::PluginId;
use crate::model::Signature;
use crate::model::Symbol;
use crate::model::SymbolicObject;

// ============================================================================
// SECTION: SymbolicArgumentSet
// ============================================================================

/// A plugin's identity together with its arguments, bound against that
/// plugin's declared [`Signature`] and still possibly containing free
/// [`Symbol`]s.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SymbolicArgumentSet {
    /// The plugin this argument set will be invoked against.
    plugin_id: PluginId,
    /// Arguments bound to the plugin's declared parameters.
    bound: BoundArguments<SymbolicObject>,
}

impl SymbolicArgumentSet {
    /// Binds `positional`/`keyword` symbolic arguments against `signature`
    /// for the plugin identified by `plugin_id`.
    ///
    /// # Errors
    ///
    /// Propagates [`ArgumentError`] from [`Signature::bind`] when the
    /// supplied arguments do not match the signature.
    pub fn new(
        plugin_id: PluginId,
        signature: &Signature,
        positional: Vec<SymbolicObject>,
        keyword: BTreeMap<String, SymbolicObject>,
    ) -> Result<Self, ArgumentError> {
        let bound = signature.bind(positional, keyword)?;
        Ok(Self { plugin_id, bound })
    }

    /// Returns the plugin this argument set targets.
    #[must_use]
    pub const fn plugin_id(&self) -> &PluginId {
        &self.plugin_id
    }

    /// Returns the bound arguments, one per declared parameter plus any
    /// variadic overflow.
    #[must_use]
    pub const fn bound(&self) -> &BoundArguments<SymbolicObject> {
        &self.bound
    }

    /// Returns every free [`Symbol`] reachable from any bound argument.
    #[must_use]
    pub fn get_symbols(&self) -> HashSet<Symbol> {
        let mut out = HashSet::new();
        for (_, value) in &self.bound.by_parameter {
            out.extend(value.get_symbols());
        }
        for value in &self.bound.extra_positional {
            out.extend(value.get_symbols());
        }
        for value in self.bound.extra_keyword.values() {
            out.extend(value.get_symbols());
        }
        out
    }

    /// Returns a new argument set with every bound argument substituted
    /// according to `pairs`.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::DuplicateSubstitutionSource`] if the same
    /// source `Symbol` appears more than once among `pairs`.
    pub fn substitute(
        &self,
        pairs: &[(Symbol, SymbolicObject)],
    ) -> Result<Self, ArgumentError> {
        let mut seen = HashSet::new();
        for (from, _) in pairs {
            if !seen.insert(*from) {
                return Err(ArgumentError::DuplicateSubstitutionSource(*from));
            }
        }
        let apply = |object: &SymbolicObject| -> Result<SymbolicObject, ArgumentError> {
            object.substitute(pairs.iter().cloned())
        };
        let by_parameter = self
            .bound
            .by_parameter
            .iter()
            .map(|(name, value)| apply(value).map(|value| (name.clone(), value)))
            .collect::<Result<Vec<_>, _>>()?;
        let extra_positional = self
            .bound
            .extra_positional
            .iter()
            .map(apply)
            .collect::<Result<Vec<_>, _>>()?;
        let extra_keyword = self
            .bound
            .extra_keyword
            .iter()
            .map(|(name, value)| apply(value).map(|value| (name.clone(), value)))
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Ok(Self {
            plugin_id: self.plugin_id.clone(),
            bound: BoundArguments {
                by_parameter,
                extra_positional,
                extra_keyword,
            },
        })
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

    fn signature() -> Signature {
        Signature::new(vec![Parameter::required("a"), Parameter::required("b")])
    }

    #[test]
    fn equal_bindings_compare_equal_regardless_of_construction_order() {
        let plugin = PluginId::new("p", "1");
        let mut kw_a = BTreeMap::new();
        kw_a.insert("b".to_string(), SymbolicObject::Value(2.into()));
        let a = SymbolicArgumentSet::new(
            plugin.clone(),
            &signature(),
            vec![SymbolicObject::Value(1.into())],
            kw_a,
        )
        .expect("bind a");

        let mut kw_b = BTreeMap::new();
        kw_b.insert("a".to_string(), SymbolicObject::Value(1.into()));
        kw_b.insert("b".to_string(), SymbolicObject::Value(2.into()));
        let b = SymbolicArgumentSet::new(plugin, &signature(), vec![], kw_b).expect("bind b");

        assert_eq!(a, b);
    }

    #[test]
    fn get_symbols_reports_every_free_symbol() {
        let plugin = PluginId::new("p", "1");
        let symbol = Symbol::fresh();
        let set = SymbolicArgumentSet::new(
            plugin,
            &signature(),
            vec![SymbolicObject::Symbol(symbol), SymbolicObject::Value(2.into())],
            BTreeMap::new(),
        )
        .expect("bind");
        assert!(set.get_symbols().contains(&symbol));
    }

    #[test]
    fn substitute_replaces_bound_arguments() {
        let plugin = PluginId::new("p", "1");
        let symbol = Symbol::fresh();
        let set = SymbolicArgumentSet::new(
            plugin,
            &signature(),
            vec![SymbolicObject::Symbol(symbol), SymbolicObject::Value(2.into())],
            BTreeMap::new(),
        )
        .expect("bind");
        let replaced = set
            .substitute(&[(symbol, SymbolicObject::Value(9.into()))])
            .expect("substitute");
        assert!(replaced.get_symbols().is_empty());
    }
}
