//! Schema layers.
//!
//! A [`SchemaLayer`] is one overlay in a schema's stack: an optional
//! configuration tag, its own converter and default-value registries and an
//! optional metadata reader. Layers are shared between schemas by `Arc` and
//! compared by identity.

mod converters;
mod defaults;

use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::metadata::MetadataReader;

pub use converters::{ConvertRule, ConverterRegistry};
pub use defaults::DefaultValueRegistry;

pub(crate) fn read_lock<'a, T>(lock: &'a RwLock<T>, what: &'static str) -> RwLockReadGuard<'a, T> {
    match lock.read() {
        Ok(g) => g,
        Err(poisoned) => {
            tracing::warn!(registry = what, "read lock was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

pub(crate) fn write_lock<'a, T>(lock: &'a RwLock<T>, what: &'static str) -> RwLockWriteGuard<'a, T> {
    match lock.write() {
        Ok(g) => g,
        Err(poisoned) => {
            tracing::warn!(registry = what, "write lock was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

/// One overlay of a schema stack.
pub struct SchemaLayer {
    configuration: Option<String>,
    converters: ConverterRegistry,
    defaults: DefaultValueRegistry,
    metadata_reader: RwLock<Option<Arc<dyn MetadataReader>>>,
}

impl SchemaLayer {
    /// Creates an empty layer.
    #[must_use]
    pub fn new(configuration: Option<String>) -> Self {
        Self {
            configuration,
            converters: ConverterRegistry::new(),
            defaults: DefaultValueRegistry::new(),
            metadata_reader: RwLock::new(None),
        }
    }

    /// Creates an empty layer with a metadata reader already installed.
    #[must_use]
    pub fn with_reader(configuration: Option<String>, reader: Arc<dyn MetadataReader>) -> Self {
        let layer = Self::new(configuration);
        *write_lock(&layer.metadata_reader, "metadata reader") = Some(reader);
        layer
    }

    /// The configuration tag, if any.
    pub fn configuration(&self) -> Option<&str> {
        self.configuration.as_deref()
    }

    /// This layer's conversion rules.
    pub const fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    /// This layer's default-value overrides.
    pub const fn defaults(&self) -> &DefaultValueRegistry {
        &self.defaults
    }

    /// The installed metadata reader.
    pub fn metadata_reader(&self) -> Option<Arc<dyn MetadataReader>> {
        read_lock(&self.metadata_reader, "metadata reader").clone()
    }

    /// Installs or removes the metadata reader.
    pub fn set_metadata_reader(&self, reader: Option<Arc<dyn MetadataReader>>) {
        *write_lock(&self.metadata_reader, "metadata reader") = reader;
    }

    /// Returns the installed reader, installing the one built by `init` if
    /// there is none yet.
    pub fn metadata_reader_or_init(
        &self,
        init: impl FnOnce() -> Arc<dyn MetadataReader>,
    ) -> Arc<dyn MetadataReader> {
        let mut guard = write_lock(&self.metadata_reader, "metadata reader");
        guard.get_or_insert_with(init).clone()
    }
}

impl fmt::Debug for SchemaLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaLayer")
            .field("configuration", &self.configuration)
            .field("converters", &self.converters.len())
            .field("defaults", &self.defaults.len())
            .field("has_metadata_reader", &self.metadata_reader().is_some())
            .finish()
    }
}
