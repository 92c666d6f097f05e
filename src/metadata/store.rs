//! In-memory metadata reader.
//!
//! Thread-safe store of attributes registered in code. It is the reader a
//! schema installs when none was configured, and a reference
//! implementation of [`MetadataReader`].

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{AttributeEntry, MetadataReader};
use crate::layer::{read_lock, write_lock};
use crate::types::DataType;

type Key = (DataType, Option<String>);

/// Attributes keyed by type and optional member name.
#[derive(Default)]
pub struct AttributeStore {
    entries: RwLock<HashMap<Key, Vec<AttributeEntry>>>,
}

impl AttributeStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches an attribute to a type.
    pub fn add_type_attribute<A>(&self, ty: DataType, attribute: A)
    where
        A: Any + Send + Sync,
    {
        self.push((ty, None), Arc::new(attribute));
    }

    /// Attaches an attribute to a member of a type.
    pub fn add_member_attribute<A>(&self, ty: DataType, member: impl Into<String>, attribute: A)
    where
        A: Any + Send + Sync,
    {
        self.push((ty, Some(member.into())), Arc::new(attribute));
    }

    fn push(&self, key: Key, entry: AttributeEntry) {
        write_lock(&self.entries, "attributes")
            .entry(key)
            .or_default()
            .push(entry);
    }

    fn lookup(&self, key: &Key) -> Vec<AttributeEntry> {
        read_lock(&self.entries, "attributes")
            .get(key)
            .cloned()
            .unwrap_or_default()
    }
}

impl MetadataReader for AttributeStore {
    fn get_attributes(&self, ty: &DataType) -> Vec<AttributeEntry> {
        self.lookup(&(ty.clone(), None))
    }

    fn get_member_attributes(&self, ty: &DataType, member: &str) -> Vec<AttributeEntry> {
        self.lookup(&(ty.clone(), Some(member.to_string())))
    }
}

impl std::fmt::Debug for AttributeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeStore")
            .field("keys", &read_lock(&self.entries, "attributes").len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::downcast_all;

    #[derive(Debug, PartialEq)]
    struct MapTo(&'static str);

    #[test]
    fn test_type_and_member_are_separate() {
        let store = AttributeStore::new();
        let ty = DataType::named("Order");
        store.add_type_attribute(ty.clone(), MapTo("orders"));
        store.add_member_attribute(ty.clone(), "Id", MapTo("order_id"));

        let on_type = downcast_all::<MapTo>(store.get_attributes(&ty));
        assert_eq!(on_type.len(), 1);
        assert_eq!(*on_type[0], MapTo("orders"));

        let on_member = downcast_all::<MapTo>(store.get_member_attributes(&ty, "Id"));
        assert_eq!(on_member.len(), 1);
        assert_eq!(*on_member[0], MapTo("order_id"));
    }

    #[test]
    fn test_unknown_returns_empty() {
        let store = AttributeStore::new();
        assert!(store.get_attributes(&DataType::I32).is_empty());
        assert!(store.get_member_attributes(&DataType::I32, "x").is_empty());
    }

    #[test]
    fn test_registration_order_is_kept() {
        let store = AttributeStore::new();
        let ty = DataType::named("Order");
        store.add_type_attribute(ty.clone(), MapTo("a"));
        store.add_type_attribute(ty.clone(), MapTo("b"));
        let attrs = downcast_all::<MapTo>(store.get_attributes(&ty));
        assert_eq!(*attrs[0], MapTo("a"));
        assert_eq!(*attrs[1], MapTo("b"));
    }
}
