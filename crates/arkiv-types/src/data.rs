//! The hierarchical document value stored by Arkiv.
//!
//! A [`DataGroup`] is a named node with an optional scalar value, an ordered
//! list of child nodes, and a sorted attribute map. Leaf elements are simply
//! groups without children. The store treats documents as opaque trees; only
//! the record-type definition lookup reads into them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A node in a hierarchical document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataGroup {
    /// Name of this node within its parent.
    pub name_in_data: String,
    /// Scalar value (leaf atomics carry one, groups usually do not).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Ordered child nodes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DataGroup>,
    /// Attribute name to value.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    /// Distinguishes repeated children with the same name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_id: Option<String>,
}

impl DataGroup {
    /// Create an empty group.
    pub fn new(name_in_data: impl Into<String>) -> Self {
        Self {
            name_in_data: name_in_data.into(),
            ..Self::default()
        }
    }

    /// Create a leaf node carrying a value.
    pub fn atomic(name_in_data: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name_in_data: name_in_data.into(),
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// Builder-style child append.
    pub fn with_child(mut self, child: DataGroup) -> Self {
        self.children.push(child);
        self
    }

    /// Builder-style attribute insert.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Append a child node.
    pub fn add_child(&mut self, child: DataGroup) {
        self.children.push(child);
    }

    /// First child with the given name.
    pub fn first_child(&self, name_in_data: &str) -> Option<&DataGroup> {
        self.children.iter().find(|c| c.name_in_data == name_in_data)
    }

    /// All children with the given name, in order.
    pub fn children_named<'a>(
        &'a self,
        name_in_data: &'a str,
    ) -> impl Iterator<Item = &'a DataGroup> + 'a {
        self.children
            .iter()
            .filter(move |c| c.name_in_data == name_in_data)
    }

    /// Value of the first child with the given name, if it has one.
    pub fn first_atomic_value(&self, name_in_data: &str) -> Option<&str> {
        self.first_child(name_in_data)?.value.as_deref()
    }

    /// Returns `true` if a child with the given name exists.
    pub fn contains_child(&self, name_in_data: &str) -> bool {
        self.first_child(name_in_data).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_type_definition() -> DataGroup {
        DataGroup::new("recordType")
            .with_child(DataGroup::new("recordInfo").with_child(DataGroup::atomic("id", "book")))
            .with_child(
                DataGroup::new("parentId")
                    .with_child(DataGroup::atomic("linkedRecordType", "recordType"))
                    .with_child(DataGroup::atomic("linkedRecordId", "publication")),
            )
    }

    #[test]
    fn navigate_children() {
        let group = record_type_definition();
        let parent = group.first_child("parentId").expect("parentId present");
        assert_eq!(parent.first_atomic_value("linkedRecordId"), Some("publication"));
        assert!(group.contains_child("recordInfo"));
        assert!(!group.contains_child("missing"));
    }

    #[test]
    fn children_named_keeps_order() {
        let group = DataGroup::new("list")
            .with_child(DataGroup::atomic("item", "a").with_attribute("lang", "sv"))
            .with_child(DataGroup::atomic("other", "x"))
            .with_child(DataGroup::atomic("item", "b"));
        let values: Vec<_> = group
            .children_named("item")
            .filter_map(|c| c.value.as_deref())
            .collect();
        assert_eq!(values, vec!["a", "b"]);
    }

    #[test]
    fn clone_is_independent() {
        let original = record_type_definition();
        let mut copy = original.clone();
        copy.add_child(DataGroup::atomic("extra", "1"));
        assert_ne!(original, copy);
        assert!(!original.contains_child("extra"));
    }

    #[test]
    fn json_omits_empty_fields() {
        let json = serde_json::to_string(&DataGroup::atomic("id", "x")).unwrap();
        assert_eq!(json, r#"{"nameInData":"id","value":"x"}"#);
        let back: DataGroup = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DataGroup::atomic("id", "x"));
    }
}
