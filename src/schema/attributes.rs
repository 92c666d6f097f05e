//! Attribute aggregation across the layer stack.
//!
//! Unlike conversions and defaults, attributes are not first-hit: every
//! layer's reader contributes, in stack order, and duplicates are kept.

use std::any::Any;
use std::sync::Arc;

use super::MappingSchema;
use crate::metadata::{downcast_all, AttributeEntry, MetadataReader};
use crate::types::DataType;

impl MappingSchema {
    fn collect<F>(&self, read: F) -> Vec<AttributeEntry>
    where
        F: Fn(&dyn MetadataReader) -> Vec<AttributeEntry>,
    {
        self.layers
            .iter()
            .filter_map(|layer| layer.metadata_reader())
            .flat_map(|reader| read(reader.as_ref()))
            .collect()
    }

    /// Keeps attributes whose tag matches a configuration, grouped by
    /// configuration priority. An untagged attribute matches `""`.
    fn filter_by_configuration<A, G>(&self, attrs: &[Arc<A>], config_of: G) -> Vec<Arc<A>>
    where
        G: Fn(&A) -> Option<&str>,
    {
        let mut out = Vec::new();
        for configuration in self.configuration_list() {
            for attr in attrs {
                if config_of(attr.as_ref()).unwrap_or("") == configuration {
                    out.push(Arc::clone(attr));
                }
            }
        }
        out
    }

    /// Every attribute of kind `A` on `ty`, from every layer.
    pub fn get_attributes<A>(&self, ty: &DataType) -> Vec<Arc<A>>
    where
        A: Any + Send + Sync,
    {
        downcast_all(self.collect(|reader| reader.get_attributes(ty)))
    }

    /// Every attribute of kind `A` on `ty`'s `member`, from every layer.
    pub fn get_member_attributes<A>(&self, ty: &DataType, member: &str) -> Vec<Arc<A>>
    where
        A: Any + Send + Sync,
    {
        downcast_all(self.collect(|reader| reader.get_member_attributes(ty, member)))
    }

    /// The first attribute of kind `A` on `ty`.
    pub fn get_attribute<A>(&self, ty: &DataType) -> Option<Arc<A>>
    where
        A: Any + Send + Sync,
    {
        self.get_attributes(ty).into_iter().next()
    }

    /// The first attribute of kind `A` on `ty`'s `member`.
    pub fn get_member_attribute<A>(&self, ty: &DataType, member: &str) -> Option<Arc<A>>
    where
        A: Any + Send + Sync,
    {
        self.get_member_attributes(ty, member).into_iter().next()
    }

    /// Attributes of kind `A` on `ty` that apply to this schema's
    /// configurations, ordered by configuration priority.
    ///
    /// `config_of` extracts an attribute's configuration tag.
    pub fn get_configured_attributes<A, G>(&self, ty: &DataType, config_of: G) -> Vec<Arc<A>>
    where
        A: Any + Send + Sync,
        G: Fn(&A) -> Option<&str>,
    {
        self.filter_by_configuration(&self.get_attributes(ty), config_of)
    }

    /// Member variant of [`MappingSchema::get_configured_attributes`].
    pub fn get_configured_member_attributes<A, G>(
        &self,
        ty: &DataType,
        member: &str,
        config_of: G,
    ) -> Vec<Arc<A>>
    where
        A: Any + Send + Sync,
        G: Fn(&A) -> Option<&str>,
    {
        self.filter_by_configuration(&self.get_member_attributes(ty, member), config_of)
    }

    /// The highest-priority configured attribute of kind `A` on `ty`.
    pub fn get_configured_attribute<A, G>(&self, ty: &DataType, config_of: G) -> Option<Arc<A>>
    where
        A: Any + Send + Sync,
        G: Fn(&A) -> Option<&str>,
    {
        self.get_configured_attributes(ty, config_of).into_iter().next()
    }

    /// The highest-priority configured attribute of kind `A` on `ty`'s
    /// `member`.
    pub fn get_configured_member_attribute<A, G>(
        &self,
        ty: &DataType,
        member: &str,
        config_of: G,
    ) -> Option<Arc<A>>
    where
        A: Any + Send + Sync,
        G: Fn(&A) -> Option<&str>,
    {
        self.get_configured_member_attributes(ty, member, config_of)
            .into_iter()
            .next()
    }
}
