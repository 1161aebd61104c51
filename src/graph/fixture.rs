//! An in-memory `GraphAdapter` backed by maps built up front, for tests
//! and for callers who already have a materialized graph in hand.

use std::collections::HashMap;

use crate::core::errors::Result;
use crate::graph::GraphAdapter;
use crate::logger::Sink;
use crate::model::{Node, Path};

/// Fixture graph: principals keyed by `name`, outbound paths keyed by the
/// same name. Never touches the network.
#[derive(Debug, Clone, Default)]
pub struct FixtureGraphAdapter {
    users: HashMap<String, Node>,
    paths: HashMap<String, Vec<Path>>,
}

impl FixtureGraphAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a principal so `find_user` can resolve it by name.
    #[must_use]
    pub fn with_user(mut self, name: impl Into<String>, node: Node) -> Self {
        self.users.insert(name.into(), node);
        self
    }

    /// Register the outbound paths a principal's `name` should resolve to.
    #[must_use]
    pub fn with_paths(mut self, name: impl Into<String>, paths: Vec<Path>) -> Self {
        self.paths.insert(name.into(), paths);
        self
    }
}

impl GraphAdapter for FixtureGraphAdapter {
    fn find_user(&self, name: &str) -> Result<Option<Node>> {
        Ok(self.users.get(name).cloned())
    }

    fn outbound_paths(&self, name: &str, _sink: &mut dyn Sink) -> Result<Vec<Path>> {
        Ok(self.paths.get(name).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::ConsoleSink;
    use crate::model::{Edge, EdgeType, NodeKind, PropertyValue};
    use std::collections::HashMap as Map;

    #[test]
    fn find_user_resolves_registered_name() {
        let node = Node::new("1", NodeKind::User, Map::new());
        let adapter = FixtureGraphAdapter::new().with_user("alice", node.clone());
        assert_eq!(adapter.find_user("alice").unwrap(), Some(node));
    }

    #[test]
    fn find_user_returns_none_for_unknown_name() {
        let adapter = FixtureGraphAdapter::new();
        assert_eq!(adapter.find_user("nobody").unwrap(), None);
    }

    #[test]
    fn outbound_paths_defaults_to_empty() {
        let adapter = FixtureGraphAdapter::new();
        let mut sink = ConsoleSink::new(true);
        assert!(adapter.outbound_paths("alice", &mut sink).unwrap().is_empty());
    }

    #[test]
    fn outbound_paths_returns_registered_paths() {
        let start = Node::new("1", NodeKind::User, Map::new());
        let end_props = Map::from([("name".to_string(), PropertyValue::Str("Domain Admins".to_string()))]);
        let end = Node::new("2", NodeKind::Group, end_props);
        let relationship = Edge::new(EdgeType::MemberOf, "1", "2");
        let path = Path::new(relationship, start.clone(), end).unwrap();

        let adapter = FixtureGraphAdapter::new()
            .with_user("alice", start)
            .with_paths("alice", vec![path]);

        let mut sink = ConsoleSink::new(true);
        let paths = adapter.outbound_paths("alice", &mut sink).unwrap();
        assert_eq!(paths.len(), 1);
    }
}
