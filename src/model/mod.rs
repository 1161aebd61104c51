//! The graph data model: nodes, edges, paths, and the principal view the
//! driver assembles from a batch of query results.

pub mod edge;
pub mod node;
pub mod path;
pub mod user;

pub use edge::{Edge, EdgeType};
pub use node::{Node, NodeKind, PropertyValue};
pub use path::{Path, PrincipalView};
pub use user::{UacFlag, UserExtras, derive_uac_flags, principal_properties};

/// A `User` node plus its derived extras. Polymorphic graph operations work
/// with plain [`Node`]s; anything that needs UAC flags, group membership,
/// or observed outbound edges goes through this wrapper instead.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub node: Node,
    pub extras: UserExtras,
}

impl User {
    #[must_use]
    pub fn from_node(node: Node) -> Self {
        let uac_flags = derive_uac_flags(&node);
        Self {
            node,
            extras: UserExtras {
                uac_flags,
                memberof: Vec::new(),
                edges: Vec::new(),
            },
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.node.id
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.node.name()
    }

    /// Resolve a property on this user following the full fallback chain:
    /// raw bag → `memberof`/`edges` extras → generic-properties default →
    /// principal-properties default → UAC-flag membership (synthesized as a
    /// bool). Returns an owned value because the synthesized steps don't
    /// borrow from anything.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<PropertyValue> {
        let lower = name.to_ascii_lowercase();
        if let Some(value) = self.node.raw_property(&lower) {
            return Some(value.clone());
        }
        if lower == "memberof" {
            return Some(PropertyValue::List(self.extras.memberof.clone()));
        }
        if lower == "edges" {
            return Some(PropertyValue::List(
                self.extras.edges.iter().map(|e| e.wire_str().to_string()).collect(),
            ));
        }
        if let Some(value) = node::generic_properties().get(lower.as_str()) {
            return Some(value.clone());
        }
        if let Some(value) = principal_properties().get(lower.as_str()) {
            return Some(value.clone());
        }
        uac_flag_named(name).map(|flag| PropertyValue::Bool(self.extras.has_flag(flag)))
    }
}

fn uac_flag_named(name: &str) -> Option<UacFlag> {
    let upper = name.to_ascii_uppercase();
    [
        UacFlag::AccountDisable,
        UacFlag::PasswdNotReqd,
        UacFlag::DontExpirePasswd,
        UacFlag::TrustedForDelegation,
        UacFlag::NotDelegated,
        UacFlag::DontRequirePreauth,
        UacFlag::TrustedToAuthenticateForDelegation,
    ]
    .into_iter()
    .find(|flag| flag.as_str() == upper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn user_property_falls_through_to_principal_default() {
        let node = Node::new("1", NodeKind::User, HashMap::new());
        let user = User::from_node(node);
        assert_eq!(
            user.property("dontreqpreauth"),
            Some(PropertyValue::Bool(false))
        );
    }

    #[test]
    fn user_property_falls_through_to_generic_default_before_uac_flag() {
        let node = Node::new("1", NodeKind::User, HashMap::new());
        let user = User::from_node(node);
        assert_eq!(
            user.property("admincount"),
            Some(PropertyValue::Bool(false))
        );
    }

    #[test]
    fn user_property_synthesizes_uac_flag_membership() {
        let props = HashMap::from([("sensitive".to_string(), PropertyValue::Bool(true))]);
        let node = Node::new("1", NodeKind::User, props);
        let user = User::from_node(node);
        assert_eq!(
            user.property("NOT_DELEGATED"),
            Some(PropertyValue::Bool(true))
        );
        assert_eq!(
            user.property("ACCOUNTDISABLE"),
            Some(PropertyValue::Bool(false))
        );
    }

    #[test]
    fn user_property_reads_memberof_and_edges_from_extras() {
        let node = Node::new("1", NodeKind::User, HashMap::new());
        let mut user = User::from_node(node);
        user.extras.memberof.push("Domain Admins".to_string());
        user.extras.observe_edge(edge::EdgeType::GenericAll);

        assert_eq!(
            user.property("memberof"),
            Some(PropertyValue::List(vec!["Domain Admins".to_string()]))
        );
        assert_eq!(
            user.property("edges"),
            Some(PropertyValue::List(vec!["GenericAll".to_string()]))
        );
    }

    #[test]
    fn user_property_prefers_raw_bag_over_every_default() {
        let props = HashMap::from([(
            "dontreqpreauth".to_string(),
            PropertyValue::Bool(true),
        )]);
        let node = Node::new("1", NodeKind::User, props);
        let user = User::from_node(node);
        assert_eq!(
            user.property("dontreqpreauth"),
            Some(PropertyValue::Bool(true))
        );
    }
}
