//! Per-layer default-value registry.

use std::collections::HashMap;
use std::sync::RwLock;

use super::{read_lock, write_lock};
use crate::types::DataType;
use crate::value::Value;

/// Canonical "zero/empty" values overridden by a single layer.
#[derive(Debug, Default)]
pub struct DefaultValueRegistry {
    values: RwLock<HashMap<DataType, Value>>,
}

impl DefaultValueRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The override for `ty` in this layer.
    pub fn get(&self, ty: &DataType) -> Option<Value> {
        read_lock(&self.values, "default values").get(ty).cloned()
    }

    /// Overrides the default of `ty`.
    pub fn set(&self, ty: DataType, value: Value) {
        write_lock(&self.values, "default values").insert(ty, value);
    }

    /// Number of overridden types.
    pub fn len(&self) -> usize {
        read_lock(&self.values, "default values").len()
    }

    /// Whether nothing is overridden.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
