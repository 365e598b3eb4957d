// shardgraph-core/src/model/signature.rs
// ============================================================================
// Module: Signature
// Description: Plugin parameter-list description used to bind symbolic
//              arguments to named, positional slots.
// Purpose: Let a `Plugin` declare how callers may pass arguments (by
//          position, by keyword, or both) and let `SymbolicArgumentSet`
//          validate a binding against that declaration before it is ever
//          attached to a graph.
// Dependencies: crate::model::ArgumentError
// ============================================================================

//! ## Overview
//! A [`Signature`] is an ordered list of [`Parameter`]s plus optional
//! variadic positional (`*args`) and keyword (`**kwargs`) catch-alls,
//! mirroring a typical dynamic-language call signature. [`Signature::bind`]
//! takes a caller's positional and keyword arguments and resolves them into
//! one value per declared parameter name, the overflow positional list, and
//! the overflow keyword map.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::ArgumentError;

// ============================================================================
// SECTION: Parameter
// ============================================================================

/// How a single declared parameter may be supplied by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    /// May only be supplied positionally.
    PositionalOnly,
    /// May be supplied positionally or by keyword.
    PositionalOrKeyword,
    /// May only be supplied by keyword.
    KeywordOnly,
}

/// One declared parameter of a [`Signature`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name, used for keyword lookups and error messages.
    pub name: String,
    /// How this parameter may be supplied.
    pub kind: ParameterKind,
    /// Whether this parameter has a default and may be omitted.
    pub has_default: bool,
}

impl Parameter {
    /// Builds a required, positional-or-keyword parameter.
    #[must_use]
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::PositionalOrKeyword,
            has_default: false,
        }
    }

    /// Builds a parameter of the given `kind` with a default value, i.e. one
    /// that callers may omit.
    #[must_use]
    pub fn with_default(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            has_default: true,
        }
    }
}

// ============================================================================
// SECTION: Signature
// ============================================================================

/// A plugin's declared parameter list.
///
/// Parameters are declared in call order: positional-only and
/// positional-or-keyword parameters first (in the order they may be filled
/// positionally), then keyword-only parameters. `accepts_var_positional` and
/// `accepts_var_keyword` mirror Python's `*args`/`**kwargs` catch-alls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Declared parameters, in positional-then-keyword-only order.
    pub parameters: Vec<Parameter>,
    /// Whether unmatched trailing positional arguments are collected rather
    /// than rejected.
    pub accepts_var_positional: bool,
    /// Whether unmatched keyword arguments are collected rather than
    /// rejected.
    pub accepts_var_keyword: bool,
}

/// One bound argument, after [`Signature::bind`] resolves positions and
/// keywords against declared parameter names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BoundArguments<T> {
    /// One value per declared parameter, in declaration order.
    pub by_parameter: Vec<(String, T)>,
    /// Overflow positional arguments captured by `*args`.
    pub extra_positional: Vec<T>,
    /// Overflow keyword arguments captured by `**kwargs`.
    pub extra_keyword: BTreeMap<String, T>,
}

impl Signature {
    /// Builds a signature with no variadic catch-alls.
    #[must_use]
    pub fn new(parameters: Vec<Parameter>) -> Self {
        Self {
            parameters,
            accepts_var_positional: false,
            accepts_var_keyword: false,
        }
    }

    /// Enables `*args` collection of unmatched trailing positional
    /// arguments.
    #[must_use]
    pub const fn with_var_positional(mut self) -> Self {
        self.accepts_var_positional = true;
        self
    }

    /// Enables `**kwargs` collection of unmatched keyword arguments.
    #[must_use]
    pub const fn with_var_keyword(mut self) -> Self {
        self.accepts_var_keyword = true;
        self
    }

    /// Binds caller-supplied positional and keyword arguments against this
    /// signature's declared parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::SignatureMismatch`] if a required parameter
    /// is left unfilled, if a keyword argument does not match any
    /// keyword-eligible parameter and `accepts_var_keyword` is `false`, if
    /// a positional argument would fill a keyword-only parameter, or if
    /// excess positional arguments are supplied and
    /// `accepts_var_positional` is `false`.
    pub fn bind<T>(
        &self,
        positional: Vec<T>,
        mut keyword: BTreeMap<String, T>,
    ) -> Result<BoundArguments<T>, ArgumentError> {
        let positional_slots = self
            .parameters
            .iter()
            .take_while(|p| p.kind != ParameterKind::KeywordOnly)
            .count();

        if positional.len() > positional_slots && !self.accepts_var_positional {
            return Err(ArgumentError::SignatureMismatch(format!(
                "expected at most {positional_slots} positional argument(s), got {}",
                positional.len()
            )));
        }

        let mut positional = positional.into_iter();
        let mut by_parameter = Vec::with_capacity(self.parameters.len());
        let mut extra_positional = Vec::new();

        for (index, parameter) in self.parameters.iter().enumerate() {
            let value = if index < positional_slots {
                positional.next()
            } else {
                None
            };
            let value = match value {
                Some(value) => Some(value),
                None if parameter.kind != ParameterKind::PositionalOnly => {
                    keyword.remove(&parameter.name)
                }
                None => None,
            };
            match value {
                Some(value) => by_parameter.push((parameter.name.clone(), value)),
                None if parameter.has_default => {}
                None => {
                    return Err(ArgumentError::SignatureMismatch(format!(
                        "missing required parameter '{}'",
                        parameter.name
                    )));
                }
            }
        }

        extra_positional.extend(positional);
        if !extra_positional.is_empty() && !self.accepts_var_positional {
            return Err(ArgumentError::SignatureMismatch(
                "excess positional arguments with no variadic slot".to_string(),
            ));
        }

        if !keyword.is_empty() && !self.accepts_var_keyword {
            let names = keyword.keys().cloned().collect::<Vec<_>>().join(", ");
            return Err(ArgumentError::SignatureMismatch(format!(
                "unexpected keyword argument(s): {names}"
            )));
        }

        Ok(BoundArguments {
            by_parameter,
            extra_positional,
            extra_keyword: keyword,
        })
    }
}
