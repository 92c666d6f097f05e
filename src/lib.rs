//! # mapping-schema - Layered Type Conversion Resolution
//!
//! A mapping schema answers three questions for a data-mapping layer: how do
//! I turn a value of type `A` into type `B`, what is the "empty" value of a
//! type, and which declarative attributes are attached to a type or member.
//!
//! Schemas are stacked. A schema owns one private layer and inherits the
//! layers of its parents by reference, so rules registered on a shared base
//! schema are visible to every schema derived from it, while each schema's
//! own registrations shadow inherited ones.
//!
//! ## Core Concepts
//!
//! - **DataType**: Runtime type descriptor, with optional lifting for value types
//! - **ConvertExpression**: A rewritable single-parameter conversion tree
//! - **SchemaLayer**: One overlay holding converters, defaults and a metadata reader
//! - **MappingSchema**: The layered view with lookup, lifting and caching
//!
//! ## Usage
//!
//! ```rust
//! use mapping_schema::{ConvertExpression, MappingSchema};
//!
//! let base = MappingSchema::new();
//! base.set_convert_expression::<i32, String>(
//!     ConvertExpression::unary("to_string", |v: i32| v.to_string()),
//!     true,
//! )?;
//!
//! let schema = MappingSchema::with_parents(&[&base]);
//! let convert = schema.get_converter::<Option<i32>, String>()?;
//! assert_eq!(convert.convert(Some(5))?, "5");
//! assert_eq!(convert.convert(None)?, "");
//! # Ok::<(), mapping_schema::MappingError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod builtin;
pub mod error;
pub mod types;
pub mod value;

// Expressions and layers
pub mod expr;
pub mod layer;
pub mod metadata;

// Schema surface
pub mod culture;
pub mod schema;

// Re-export primary types at crate root for convenience
pub use culture::{CultureFormat, FormatProfile};
pub use error::{ConfigError, ConvertError, MappingError, MappingResult};
pub use expr::{ConvertExpression, ConvertFn, Expr, Function, Parameter, ParameterId};
pub use layer::{ConvertRule, ConverterRegistry, DefaultValueRegistry, SchemaLayer};
pub use metadata::{AttributeEntry, AttributeStore, MetadataReader};
pub use schema::{Converter, MappingSchema, SchemaBuilder};
pub use types::{DataType, Mappable};
pub use value::Value;
