//! Mapping schemas.
//!
//! A [`MappingSchema`] is a read view over an ordered stack of
//! [`SchemaLayer`]s. Layer 0 is private to the schema and is the only layer
//! the schema ever writes to; deeper layers are inherited from parent
//! schemas and shared with them by reference.
//!
//! Lookups walk the stack from layer 0 outwards, so a schema's own rules
//! shadow inherited ones, and fall back to the process-wide built-in tables.

mod attributes;
mod builder;
mod convert;
mod culture;

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::builtin;
use crate::error::ConfigError;
use crate::layer::SchemaLayer;
use crate::metadata::{AttributeStore, MetadataReader};
use crate::types::{DataType, Mappable};
use crate::value::Value;

pub use builder::SchemaBuilder;
pub use convert::Converter;

static DEFAULT_SCHEMA: OnceLock<MappingSchema> = OnceLock::new();

/// Which layers a new schema inherits.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Parents<'a> {
    /// Nothing specified: inherit the default schema.
    Unspecified,
    /// An explicit list; empty means no inheritance.
    Explicit(&'a [&'a MappingSchema]),
}

/// A layered conversion, default-value and metadata view.
///
/// # Examples
///
/// ```
/// use mapping_schema::{ConvertExpression, MappingSchema};
///
/// let schema = MappingSchema::new();
/// schema.set_convert_expression::<i32, String>(
///     ConvertExpression::unary("to_string", |v: i32| v.to_string()),
///     true,
/// )?;
///
/// // int? -> String is lifted from the registered int -> String rule.
/// let convert = schema.get_converter::<Option<i32>, String>()?;
/// assert_eq!(convert.convert(Some(5))?, "5");
/// assert_eq!(convert.convert(None)?, "");
/// # Ok::<(), mapping_schema::MappingError>(())
/// ```
pub struct MappingSchema {
    layers: Vec<Arc<SchemaLayer>>,
    configuration_list: OnceLock<Vec<String>>,
}

impl MappingSchema {
    /// A schema inheriting the default schema.
    #[must_use]
    pub fn new() -> Self {
        Self::compose(None, Parents::Unspecified)
    }

    /// A schema with a configuration tag inheriting the default schema.
    #[must_use]
    pub fn with_configuration(configuration: impl Into<String>) -> Self {
        Self::compose(Some(configuration.into()), Parents::Unspecified)
    }

    /// A schema composed from `parents`, first parent first.
    ///
    /// An empty slice yields a schema that inherits nothing, not even the
    /// default schema.
    #[must_use]
    pub fn with_parents(parents: &[&Self]) -> Self {
        Self::compose(None, Parents::Explicit(parents))
    }

    /// Starts building a schema.
    #[must_use]
    pub fn builder<'a>() -> SchemaBuilder<'a> {
        SchemaBuilder::new()
    }

    /// The process-wide schema every unparented schema inherits.
    pub fn default_schema() -> &'static Self {
        DEFAULT_SCHEMA.get_or_init(|| {
            let reader: Arc<dyn MetadataReader> = Arc::new(AttributeStore::new());
            Self::from_layers(vec![Arc::new(SchemaLayer::with_reader(
                Some(String::new()),
                reader,
            ))])
        })
    }

    pub(crate) fn compose(configuration: Option<String>, parents: Parents<'_>) -> Self {
        let inherited: Vec<Arc<SchemaLayer>> = match parents {
            Parents::Unspecified => Self::default_schema().layers.clone(),
            Parents::Explicit([]) => Vec::new(),
            Parents::Explicit([single]) => single.layers.clone(),
            Parents::Explicit(many) => {
                let mut out: Vec<Arc<SchemaLayer>> = Vec::new();
                for layer in many.iter().flat_map(|s| s.layers.iter()) {
                    if !out.iter().any(|seen| Arc::ptr_eq(seen, layer)) {
                        out.push(Arc::clone(layer));
                    }
                }
                out
            }
        };

        let mut layers = Vec::with_capacity(inherited.len() + 1);
        layers.push(Arc::new(SchemaLayer::new(configuration)));
        layers.extend(inherited);

        Self::from_layers(layers)
    }

    fn from_layers(layers: Vec<Arc<SchemaLayer>>) -> Self {
        Self {
            layers,
            configuration_list: OnceLock::new(),
        }
    }

    /// The layer stack, most specific first.
    pub fn layers(&self) -> &[Arc<SchemaLayer>] {
        &self.layers
    }

    /// The schema's private layer.
    pub fn own_layer(&self) -> &SchemaLayer {
        &self.layers[0]
    }

    /// Configuration tag of layer 0.
    pub fn configuration(&self) -> Option<&str> {
        self.own_layer().configuration()
    }

    /// Configuration tags in priority order.
    ///
    /// Layer 0's tag comes first, followed by every other distinct tag in
    /// stack order. Computed once per schema.
    pub fn configuration_list(&self) -> &[String] {
        self.configuration_list.get_or_init(|| {
            let mut list: Vec<String> = Vec::new();
            for tag in self.layers.iter().filter_map(|l| l.configuration()) {
                if !list.iter().any(|seen| seen == tag) {
                    list.push(tag.to_string());
                }
            }
            list
        })
    }

    // ------------------------------------------------------------------
    // Default values
    // ------------------------------------------------------------------

    /// The canonical default of `ty`: the first layer that overrides it, or
    /// the built-in default.
    #[must_use]
    pub fn default_value(&self, ty: &DataType) -> Value {
        self.layers
            .iter()
            .find_map(|layer| layer.defaults().get(ty))
            .unwrap_or_else(|| builtin::default_value(ty))
    }

    /// Overrides the default of `T` in this schema.
    pub fn set_default_value<T: Mappable>(&self, value: T) {
        self.own_layer()
            .defaults()
            .set(T::data_type(), value.into_value());
    }

    /// Overrides the default of a runtime type in this schema.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValueTypeMismatch`] if `value` is not a legal
    /// value of `ty`.
    pub fn set_default_value_for(&self, ty: DataType, value: Value) -> Result<(), ConfigError> {
        if !value.fits(&ty) {
            return Err(ConfigError::ValueTypeMismatch {
                ty,
                value_kind: value.type_name(),
            });
        }
        self.own_layer().defaults().set(ty, value);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Metadata reader
    // ------------------------------------------------------------------

    /// Layer 0's metadata reader, installing an empty [`AttributeStore`] if
    /// there is none.
    pub fn metadata_reader(&self) -> Arc<dyn MetadataReader> {
        self.own_layer()
            .metadata_reader_or_init(|| Arc::new(AttributeStore::new()))
    }

    /// Replaces layer 0's metadata reader.
    pub fn set_metadata_reader(&self, reader: Arc<dyn MetadataReader>) {
        self.own_layer().set_metadata_reader(Some(reader));
    }
}

impl Default for MappingSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MappingSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingSchema")
            .field("configuration", &self.configuration())
            .field("layers", &self.layers.len())
            .finish_non_exhaustive()
    }
}
