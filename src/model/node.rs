//! Graph nodes: closed node-type vocabulary, property bag, and the
//! fallback chain used to resolve a property that is missing from the
//! raw bag (generic-type defaults, then principal-type defaults).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Closed vocabulary of BloodHound node labels CADRA understands.
///
/// Any label outside this set collapses to `Unknown` rather than failing —
/// permission and attribute rules that never reference an unrecognized type
/// simply never match it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    CertTemplate,
    Computer,
    Domain,
    EnterpriseCa,
    Group,
    Gpo,
    Ou,
    RootCa,
    User,
    Unknown,
}

impl NodeKind {
    /// Resolve a node's kind from its raw BloodHound labels.
    ///
    /// Mirrors the source's label-scan: the first label that matches a
    /// known type wins; an empty or entirely-unrecognized label set is
    /// `Unknown`.
    #[must_use]
    pub fn from_labels<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        for label in labels {
            if let Some(kind) = Self::from_label(label) {
                return kind;
            }
        }
        Self::Unknown
    }

    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Some(match label {
            "CertTemplate" => Self::CertTemplate,
            "Computer" => Self::Computer,
            "Domain" => Self::Domain,
            "EnterpriseCA" => Self::EnterpriseCa,
            "Group" => Self::Group,
            "GPO" => Self::Gpo,
            "OU" => Self::Ou,
            "RootCA" => Self::RootCa,
            "User" => Self::User,
            _ => return None,
        })
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::CertTemplate => "CertTemplate",
            Self::Computer => "Computer",
            Self::Domain => "Domain",
            Self::EnterpriseCa => "EnterpriseCA",
            Self::Group => "Group",
            Self::Gpo => "GPO",
            Self::Ou => "OU",
            Self::RootCa => "RootCA",
            Self::User => "User",
            Self::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// A scalar or list-of-strings property value, as read off a BloodHound node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<String>),
}

impl PropertyValue {
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }
}

/// A single BloodHound graph node: stable identity, one closed type, and a
/// case-insensitive property bag.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    props: HashMap<String, PropertyValue>,
}

impl Node {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        kind: NodeKind,
        props: HashMap<String, PropertyValue>,
    ) -> Self {
        let props = props
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();
        Self {
            id: id.into(),
            kind,
            props,
        }
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.props.get("name").and_then(PropertyValue::as_str)
    }

    /// Resolve a property by name, falling through the raw bag to the
    /// closed generic-properties default table. Callers needing the
    /// further principal-properties fallback use [`crate::model::User`]'s
    /// `property` instead.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        let key = name.to_ascii_lowercase();
        self.props
            .get(&key)
            .or_else(|| generic_properties().get(key.as_str()))
    }

    /// Raw bag lookup only, bypassing every default table. Used by the
    /// attribute/permission assessors when they need to know whether a
    /// property was actually observed on the node.
    #[must_use]
    pub fn raw_property(&self, name: &str) -> Option<&PropertyValue> {
        self.props.get(&name.to_ascii_lowercase())
    }
}

/// Closed default values substituted when a property is absent from a
/// node's raw bag, regardless of node type.
#[must_use]
pub fn generic_properties() -> &'static HashMap<&'static str, PropertyValue> {
    use std::sync::OnceLock;
    static TABLE: OnceLock<HashMap<&'static str, PropertyValue>> = OnceLock::new();
    TABLE.get_or_init(|| {
        HashMap::from([
            ("enabled", PropertyValue::Bool(true)),
            ("admincount", PropertyValue::Bool(false)),
            ("highvalue", PropertyValue::Bool(false)),
            ("description", PropertyValue::Str(String::new())),
            ("whencreated", PropertyValue::Int(0)),
            ("lastlogon", PropertyValue::Int(0)),
            ("lastlogontimestamp", PropertyValue::Int(0)),
        ])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_kind_resolves_first_matching_label() {
        let kind = NodeKind::from_labels(["Base", "User"]);
        assert_eq!(kind, NodeKind::User);
    }

    #[test]
    fn node_kind_unrecognized_labels_collapse_to_unknown() {
        let kind = NodeKind::from_labels(["Base", "SomeFutureLabel"]);
        assert_eq!(kind, NodeKind::Unknown);
    }

    #[test]
    fn property_falls_through_to_generic_default() {
        let node = Node::new("1", NodeKind::Computer, HashMap::new());
        assert_eq!(
            node.property("admincount"),
            Some(&PropertyValue::Bool(false))
        );
    }

    #[test]
    fn property_prefers_raw_bag_over_default() {
        let props = HashMap::from([("AdminCount".to_string(), PropertyValue::Bool(true))]);
        let node = Node::new("1", NodeKind::Computer, props);
        assert_eq!(node.property("admincount"), Some(&PropertyValue::Bool(true)));
    }

    #[test]
    fn property_lookup_is_case_insensitive() {
        let props = HashMap::from([("Name".to_string(), PropertyValue::Str("dc01".to_string()))]);
        let node = Node::new("1", NodeKind::Computer, props);
        assert_eq!(node.name(), Some("dc01"));
        assert_eq!(
            node.property("NAME"),
            Some(&PropertyValue::Str("dc01".to_string()))
        );
    }

    #[test]
    fn raw_property_does_not_fall_through() {
        let node = Node::new("1", NodeKind::Computer, HashMap::new());
        assert_eq!(node.raw_property("admincount"), None);
    }

    #[test]
    fn unknown_property_with_no_default_is_none() {
        let node = Node::new("1", NodeKind::Computer, HashMap::new());
        assert_eq!(node.property("totally_unknown_property"), None);
    }
}
