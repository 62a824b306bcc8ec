//! Provenance-tagged relations

use serde::Serialize;

use crate::engine::{RelationDescriptor, PROVENANCE_COLUMN};

/// A relation as discovered for one render pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relation {
    pub name: String,
    pub internal_id: u32,
    /// All attributes in ordinal order, provenance column included
    pub attributes: Vec<String>,
    /// Index of the provenance column in `attributes`, if it has one
    pub provenance_index: Option<usize>,
}

impl Relation {
    /// Combine a discovery record with the relation's attribute list
    ///
    /// The provenance column is found by name. Columns added after tracking
    /// was enabled sit behind it in attribute order.
    pub fn from_descriptor(descriptor: &RelationDescriptor, attributes: Vec<String>) -> Self {
        let provenance_index = attributes
            .iter()
            .position(|name| name.as_str() == PROVENANCE_COLUMN);
        Self {
            name: descriptor.name.clone(),
            internal_id: descriptor.internal_id,
            attributes,
            provenance_index,
        }
    }

    pub fn has_provenance_column(&self) -> bool {
        self.provenance_index.is_some()
    }

    pub fn provenance_column(&self) -> Option<&str> {
        self.provenance_index
            .and_then(|i| self.attributes.get(i))
            .map(String::as_str)
    }

    /// Discovery record to hand back to the engine
    pub fn descriptor(&self) -> RelationDescriptor {
        RelationDescriptor {
            name: self.name.clone(),
            internal_id: self.internal_id,
            visible_columns: self.visible_attributes().len(),
        }
    }

    /// Attributes shown on the page, in ordinal order without the provenance
    /// column
    pub fn visible_attributes(&self) -> Vec<String> {
        self.attributes
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != self.provenance_index)
            .map(|(_, name)| name.clone())
            .collect()
    }

    /// Fields per fetched row: the visible values, then the token
    pub fn fetched_width(&self) -> usize {
        self.visible_attributes().len() + 1
    }
}
