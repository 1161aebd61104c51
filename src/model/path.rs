//! Validated paths from a principal to a reachable node, and the
//! aggregated view the driver builds from a whole query result set.

use crate::core::errors::{CadraError, Result};
use crate::model::edge::Edge;
use crate::model::node::Node;
use crate::model::user::UserExtras;

/// A single relationship between two graph nodes, with the endpoint nodes
/// carried alongside it for convenient downstream lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub relationship: Edge,
    pub start_node: Node,
    pub end_node: Node,
}

impl Path {
    /// Construct a path, rejecting it if the relationship's endpoint ids
    /// don't agree with the start/end nodes actually supplied.
    pub fn new(relationship: Edge, start_node: Node, end_node: Node) -> Result<Self> {
        if start_node.id != relationship.start_node_id {
            return Err(CadraError::InconsistentPath {
                start_id: start_node.id.clone(),
                reason: format!(
                    "start node id {:?} does not match relationship start id {:?}",
                    start_node.id, relationship.start_node_id
                ),
            });
        }
        if end_node.id != relationship.end_node_id {
            return Err(CadraError::InconsistentPath {
                start_id: start_node.id.clone(),
                reason: format!(
                    "end node id {:?} does not match relationship end id {:?}",
                    end_node.id, relationship.end_node_id
                ),
            });
        }
        Ok(Self {
            relationship,
            start_node,
            end_node,
        })
    }
}

/// The derived `User` extras (group membership, observed edge types)
/// accumulated from a principal's whole batch of outbound paths.
#[derive(Debug, Clone)]
pub struct PrincipalView {
    pub principal_id: String,
    pub extras: UserExtras,
}

impl PrincipalView {
    /// Fold a batch of paths into a view, rejecting the whole batch if any
    /// path's start node id disagrees with an earlier one.
    pub fn from_paths(principal_id: impl Into<String>, paths: &[Path]) -> Result<Self> {
        let principal_id = principal_id.into();
        let mut extras = UserExtras::default();

        for path in paths {
            if path.start_node.id != principal_id {
                return Err(CadraError::InconsistentPath {
                    start_id: principal_id.clone(),
                    reason: format!(
                        "path start node id {:?} does not match principal id {:?}",
                        path.start_node.id, principal_id
                    ),
                });
            }
            if let crate::model::edge::EdgeType::MemberOf = path.relationship.edge_type
                && let Some(name) = path.end_node.name()
            {
                let name = name.to_string();
                if !extras.memberof.contains(&name) {
                    extras.memberof.push(name);
                }
            }
            extras.observe_edge(path.relationship.edge_type);
        }

        Ok(Self { principal_id, extras })
    }
}
