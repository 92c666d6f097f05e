//! Builder for composing schemas.

use std::sync::Arc;

use super::{MappingSchema, Parents};
use crate::metadata::MetadataReader;

/// Builder for [`MappingSchema`].
///
/// Keeps apart "no parents given" (inherit the default schema) and "an empty
/// parent list" (inherit nothing).
///
/// # Examples
///
/// ```
/// use mapping_schema::MappingSchema;
///
/// let base = MappingSchema::with_configuration("base");
/// let schema = MappingSchema::builder()
///     .configuration("reporting")
///     .parent(&base)
///     .build();
/// assert_eq!(schema.configuration_list(), ["reporting", "base", ""]);
///
/// let isolated = MappingSchema::builder().isolated().build();
/// assert_eq!(isolated.layers().len(), 1);
/// ```
#[derive(Default)]
pub struct SchemaBuilder<'a> {
    configuration: Option<String>,
    parents: Option<Vec<&'a MappingSchema>>,
    metadata_reader: Option<Arc<dyn MetadataReader>>,
}

impl<'a> SchemaBuilder<'a> {
    /// A builder that inherits the default schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration tag of the new schema's own layer.
    #[must_use]
    pub fn configuration(mut self, configuration: impl Into<String>) -> Self {
        self.configuration = Some(configuration.into());
        self
    }

    /// Appends a parent schema.
    #[must_use]
    pub fn parent(mut self, parent: &'a MappingSchema) -> Self {
        self.parents.get_or_insert_with(Vec::new).push(parent);
        self
    }

    /// Appends several parent schemas, first parent first.
    #[must_use]
    pub fn parents(mut self, parents: &[&'a MappingSchema]) -> Self {
        self.parents
            .get_or_insert_with(Vec::new)
            .extend_from_slice(parents);
        self
    }

    /// Inherit nothing, not even the default schema.
    #[must_use]
    pub fn isolated(mut self) -> Self {
        self.parents = Some(Vec::new());
        self
    }

    /// Installs a metadata reader on the new schema's own layer.
    #[must_use]
    pub fn metadata_reader(mut self, reader: Arc<dyn MetadataReader>) -> Self {
        self.metadata_reader = Some(reader);
        self
    }

    /// Composes the schema.
    #[must_use]
    pub fn build(self) -> MappingSchema {
        let schema = match &self.parents {
            None => MappingSchema::compose(self.configuration, Parents::Unspecified),
            Some(parents) => MappingSchema::compose(self.configuration, Parents::Explicit(parents)),
        };
        if let Some(reader) = self.metadata_reader {
            schema.set_metadata_reader(reader);
        }
        schema
    }
}
