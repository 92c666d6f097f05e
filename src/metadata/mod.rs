//! Declarative metadata sources.
//!
//! Each schema layer may carry a [`MetadataReader`] that supplies attributes
//! attached to a type or to one of its members. Attributes are arbitrary
//! `'static` values; a schema picks out the kind it is asked for by
//! downcasting.

mod store;

use std::any::Any;
use std::sync::Arc;

use crate::types::DataType;

pub use store::AttributeStore;

/// A single declarative fact.
pub type AttributeEntry = Arc<dyn Any + Send + Sync>;

/// Source of attributes for one schema layer.
///
/// Implementations should return an empty list, not fail, when they know
/// nothing about the type or member.
pub trait MetadataReader: Send + Sync {
    /// Attributes attached to the type itself.
    fn get_attributes(&self, ty: &DataType) -> Vec<AttributeEntry>;

    /// Attributes attached to a member of the type.
    fn get_member_attributes(&self, ty: &DataType, member: &str) -> Vec<AttributeEntry>;
}

/// Keeps the entries of kind `A`, in order.
pub(crate) fn downcast_all<A>(entries: Vec<AttributeEntry>) -> Vec<Arc<A>>
where
    A: Any + Send + Sync,
{
    entries
        .into_iter()
        .filter_map(|entry| entry.downcast::<A>().ok())
        .collect()
}
