//! Per-layer converter registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use super::{read_lock, write_lock};
use crate::expr::{ConvertExpression, ConvertFn};
use crate::types::DataType;

/// A registered conversion: the rewritable expression and, optionally, the
/// callable compiled from it.
#[derive(Clone)]
pub struct ConvertRule {
    /// The rewritable, unreduced expression.
    pub expression: ConvertExpression,
    /// Callable compiled from the reduced expression, if cached.
    pub compiled: Option<ConvertFn>,
}

impl ConvertRule {
    /// A rule with an optional compiled callable.
    #[must_use]
    pub const fn new(expression: ConvertExpression, compiled: Option<ConvertFn>) -> Self {
        Self {
            expression,
            compiled,
        }
    }

    /// A rule without a compiled callable.
    #[must_use]
    pub const fn expression_only(expression: ConvertExpression) -> Self {
        Self::new(expression, None)
    }

    /// The same rule with its compiled callable dropped.
    #[must_use]
    pub fn without_compiled(self) -> Self {
        Self::expression_only(self.expression)
    }
}

impl fmt::Debug for ConvertRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvertRule")
            .field("expression", &self.expression.to_string())
            .field("compiled", &self.compiled.is_some())
            .finish()
    }
}

/// Conversion rules of a single layer, keyed by `(from, to)`.
///
/// Lookups never search other layers and never synthesize anything.
#[derive(Default)]
pub struct ConverterRegistry {
    rules: RwLock<HashMap<(DataType, DataType), ConvertRule>>,
}

impl ConverterRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a rule, replacing any previous rule for the same pair.
    pub fn set(&self, from: DataType, to: DataType, rule: ConvertRule) {
        write_lock(&self.rules, "converters").insert((from, to), rule);
    }

    /// The rule for exactly `(from, to)` in this layer.
    pub fn get(&self, from: &DataType, to: &DataType) -> Option<ConvertRule> {
        // Keys are owned, so the pair is rebuilt for the lookup.
        read_lock(&self.rules, "converters")
            .get(&(from.clone(), to.clone()))
            .cloned()
    }

    /// Whether this layer has a rule for `(from, to)`.
    pub fn contains(&self, from: &DataType, to: &DataType) -> bool {
        read_lock(&self.rules, "converters").contains_key(&(from.clone(), to.clone()))
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        read_lock(&self.rules, "converters").len()
    }

    /// Whether no rule is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
