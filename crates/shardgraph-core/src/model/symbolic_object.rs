// shardgraph-core/src/model/symbolic_object.rs
// ============================================================================
// Module: Symbolic Object
// Description: Immutable tree describing a plugin argument before binding.
// Purpose: Let an activation's arguments reference the graph's inputs or
//          other activations' results symbolically, then materialize once
//          every free Symbol is bound.
// Dependencies: crate::model::{Payload, Symbol, UnboundSymbolError}
// ============================================================================

//! ## Overview
//! A [`SymbolicObject`] is either a free [`Symbol`], a concrete [`Payload`],
//! or a `List`/`Dict` composed of further symbolic objects. `substitute`
//! replaces free symbols with other symbolic objects; `get_value`
//! materializes a fully-bound object into a plain [`Payload`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::HashMap;

use serde::Serialize;

use crate::model::ArgumentError;
use crate::model::Payload;
use crate::model::Symbol;
use crate::model::UnboundSymbolError;

// ============================================================================
// SECTION: SymbolicObject
// ============================================================================

/// An immutable tree describing a plugin argument, possibly with free
/// [`Symbol`]s still to be bound.
///
/// `Dict` is represented as an ordered list of key/value pairs rather than
/// a map, because keys may themselves contain unbound `Symbol`s and are
/// therefore not necessarily `Ord`/`Hash` until materialized; hashability of
/// *materialized* keys is enforced in [`SymbolicObject::get_value`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolicObject {
    /// A free variable.
    Symbol(Symbol),
    /// A concrete, already-bound value.
    Value(Payload),
    /// An ordered list of symbolic objects.
    List(Vec<SymbolicObject>),
    /// An association of symbolic object pairs.
    Dict(Vec<(SymbolicObject, SymbolicObject)>),
}

/// Sharing mode used when materializing repeated occurrences of one
/// [`Symbol`] during [`SymbolicObject::get_value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareMode {
    /// Every occurrence of a given `Symbol` shares one deep copy of its
    /// binding; two different symbols bound to an identical payload each
    /// still get their own, independent copy.
    Shared,
    /// Every occurrence gets its own independent deep copy.
    PerOccurrence,
}

impl SymbolicObject {
    /// Wraps an arbitrary [`Payload`] as a `Value` node.
    #[must_use]
    pub const fn value(payload: Payload) -> Self {
        Self::Value(payload)
    }

    /// Returns `self` substituted with a single `(from, to)` pair.
    ///
    /// Returns `self` unchanged (structurally, but newly allocated) when
    /// `from` does not occur anywhere in the tree. Since this is an
    /// immutable value type rather than a reference type, callers that want
    /// to detect the "unchanged" case can compare with
    /// `get_symbols().contains(&from)` beforehand.
    #[must_use]
    pub fn substitute_one(&self, from: Symbol, to: &Self) -> Self {
        match self {
            Self::Symbol(symbol) if *symbol == from => to.clone(),
            Self::Symbol(_) | Self::Value(_) => self.clone(),
            Self::List(items) => {
                Self::List(items.iter().map(|item| item.substitute_one(from, to)).collect())
            }
            Self::Dict(entries) => Self::Dict(
                entries
                    .iter()
                    .map(|(key, value)| {
                        (key.substitute_one(from, to), value.substitute_one(from, to))
                    })
                    .collect(),
            ),
        }
    }

    /// Applies a batch of `(from, to)` substitution pairs.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::DuplicateSubstitutionSource`] if the same
    /// `from` `Symbol` appears more than once among `pairs`.
    pub fn substitute(
        &self,
        pairs: impl IntoIterator<Item = (Symbol, Self)>,
    ) -> Result<Self, ArgumentError> {
        let mut seen = std::collections::HashSet::new();
        let mut result = self.clone();
        for (from, to) in pairs {
            if !seen.insert(from) {
                return Err(ArgumentError::DuplicateSubstitutionSource(from));
            }
            result = result.substitute_one(from, &to);
        }
        Ok(result)
    }

    /// Returns the set of free [`Symbol`]s reachable from this object.
    #[must_use]
    pub fn get_symbols(&self) -> std::collections::HashSet<Symbol> {
        let mut out = std::collections::HashSet::new();
        self.collect_symbols(&mut out);
        out
    }

    /// Recursive helper for [`Self::get_symbols`].
    fn collect_symbols(&self, out: &mut std::collections::HashSet<Symbol>) {
        match self {
            Self::Symbol(symbol) => {
                out.insert(*symbol);
            }
            Self::Value(_) => {}
            Self::List(items) => {
                for item in items {
                    item.collect_symbols(out);
                }
            }
            Self::Dict(entries) => {
                for (key, value) in entries {
                    key.collect_symbols(out);
                    value.collect_symbols(out);
                }
            }
        }
    }

    /// Materializes this object into a plain [`Payload`], using `bindings`
    /// to resolve free symbols.
    ///
    /// `share` controls how repeated occurrences of the same `Symbol` are
    /// treated: [`ShareMode::Shared`] clones each bound payload once and
    /// reuses that single clone across every occurrence of the symbol (two
    /// different symbols bound to an identical payload still get
    /// independent copies); [`ShareMode::PerOccurrence`] clones once per
    /// occurrence.
    ///
    /// `Payload` has no interior sharing, so both modes currently produce
    /// value-equal results; the distinction is preserved because it becomes
    /// observable once a future payload extension admits reference types.
    ///
    /// # Errors
    ///
    /// Returns [`GetValueError::Unbound`] if a free `Symbol` has no entry in
    /// `bindings`, or [`GetValueError::DuplicateKey`] if materializing a
    /// `Dict` produces the same key twice.
    pub fn get_value(
        &self,
        bindings: &HashMap<Symbol, Payload>,
        share: ShareMode,
    ) -> Result<Payload, GetValueError> {
        let mut cache: HashMap<Symbol, Payload> = HashMap::new();
        self.get_value_inner(bindings, share, &mut cache)
    }

    /// Recursive worker for [`Self::get_value`]; `cache` backs
    /// [`ShareMode::Shared`].
    fn get_value_inner(
        &self,
        bindings: &HashMap<Symbol, Payload>,
        share: ShareMode,
        cache: &mut HashMap<Symbol, Payload>,
    ) -> Result<Payload, GetValueError> {
        match self {
            Self::Symbol(symbol) => match share {
                ShareMode::Shared => {
                    if let Some(cached) = cache.get(symbol) {
                        return Ok(cached.clone());
                    }
                    let bound = bindings
                        .get(symbol)
                        .cloned()
                        .ok_or(GetValueError::Unbound(UnboundSymbolError(*symbol)))?;
                    cache.insert(*symbol, bound.clone());
                    Ok(bound)
                }
                ShareMode::PerOccurrence => bindings
                    .get(symbol)
                    .cloned()
                    .ok_or(GetValueError::Unbound(UnboundSymbolError(*symbol))),
            },
            Self::Value(payload) => Ok(payload.clone()),
            Self::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(item.get_value_inner(bindings, share, cache)?);
                }
                Ok(Payload::List(out))
            }
            Self::Dict(entries) => {
                let mut out = BTreeMap::new();
                for (key, value) in entries {
                    let key = key.get_value_inner(bindings, share, cache)?;
                    let value = value.get_value_inner(bindings, share, cache)?;
                    if out.insert(key.clone(), value).is_some() {
                        return Err(GetValueError::DuplicateKey(key));
                    }
                }
                Ok(Payload::Map(out))
            }
        }
    }
}

/// Errors raised while materializing a [`SymbolicObject`].
#[derive(Debug, thiserror::Error)]
pub enum GetValueError {
    /// A free symbol had no binding.
    #[error(transparent)]
    Unbound(#[from] UnboundSymbolError),
    /// Two dict entries materialized to the same key.
    #[error("duplicate materialized dict key: {0:?}")]
    DuplicateKey(Payload),
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

    fn bindings(pairs: &[(Symbol, Payload)]) -> HashMap<Symbol, Payload> {
        pairs.iter().cloned().collect()
    }

    #[test]
    fn substitute_is_identity_when_symbol_absent() {
        let object = SymbolicObject::Value(Payload::Int(1));
        let other = Symbol::fresh();
        let replacement = SymbolicObject::Value(Payload::Int(2));
        assert_eq!(object.substitute_one(other, &replacement), object);
    }

    #[test]
    fn substitute_replaces_matching_symbol() {
        let target = Symbol::fresh();
        let object = SymbolicObject::List(vec![
            SymbolicObject::Symbol(target),
            SymbolicObject::Value(Payload::Int(7)),
        ]);
        let replacement = SymbolicObject::Value(Payload::Int(42));
        let result = object.substitute_one(target, &replacement);
        assert_eq!(
            result,
            SymbolicObject::List(vec![
                SymbolicObject::Value(Payload::Int(42)),
                SymbolicObject::Value(Payload::Int(7)),
            ])
        );
    }

    #[test]
    fn substitute_rejects_duplicate_source() {
        let object = SymbolicObject::Value(Payload::Int(1));
        let symbol = Symbol::fresh();
        let err = object
            .substitute([
                (symbol, SymbolicObject::Value(Payload::Int(1))),
                (symbol, SymbolicObject::Value(Payload::Int(2))),
            ])
            .unwrap_err();
        assert!(matches!(err, ArgumentError::DuplicateSubstitutionSource(_)));
    }

    #[test]
    fn get_value_fails_on_unbound_symbol() {
        let object = SymbolicObject::Symbol(Symbol::fresh());
        let err = object.get_value(&HashMap::new(), ShareMode::Shared).unwrap_err();
        assert!(matches!(err, GetValueError::Unbound(_)));
    }

    #[test]
    fn get_value_materializes_list_and_dict() {
        let sym = Symbol::fresh();
        let object = SymbolicObject::List(vec![
            SymbolicObject::Symbol(sym),
            SymbolicObject::Dict(vec![(
                SymbolicObject::Value(Payload::from("k")),
                SymbolicObject::Symbol(sym),
            )]),
        ]);
        let value = object
            .get_value(&bindings(&[(sym, Payload::Int(9))]), ShareMode::Shared)
            .expect("materialize");
        let Payload::List(items) = value else {
            panic!("expected list");
        };
        assert_eq!(items[0], Payload::Int(9));
    }

    #[test]
    fn get_value_rejects_duplicate_materialized_keys() {
        let a = Symbol::fresh();
        let b = Symbol::fresh();
        let object = SymbolicObject::Dict(vec![
            (SymbolicObject::Symbol(a), SymbolicObject::Value(Payload::Int(1))),
            (SymbolicObject::Symbol(b), SymbolicObject::Value(Payload::Int(2))),
        ]);
        let bound =
            bindings(&[(a, Payload::from("same")), (b, Payload::from("same"))]);
        let err = object.get_value(&bound, ShareMode::Shared).unwrap_err();
        assert!(matches!(err, GetValueError::DuplicateKey(_)));
    }

    #[test]
    fn get_symbols_collects_nested_symbols() {
        let a = Symbol::fresh();
        let b = Symbol::fresh();
        let object = SymbolicObject::List(vec![
            SymbolicObject::Symbol(a),
            SymbolicObject::Dict(vec![(
                SymbolicObject::Symbol(b),
                SymbolicObject::Value(Payload::Int(0)),
            )]),
        ]);
        let symbols = object.get_symbols();
        assert!(symbols.contains(&a));
        assert!(symbols.contains(&b));
        assert_eq!(symbols.len(), 2);
    }
}
