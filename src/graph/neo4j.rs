//! `neo4rs`-backed `GraphAdapter`: drives the async client on a single
//! confined current-thread Tokio runtime and presents a synchronous
//! interface to the rest of the crate.

use neo4rs::{query, Graph, Node as Neo4jNode, Relation};
use tokio::runtime::{Builder, Runtime};

use crate::core::errors::{CadraError, Result};
use crate::graph::GraphAdapter;
use crate::logger::{LogEvent, Severity, Sink};
use crate::model::node::PropertyValue;
use crate::model::{Edge, EdgeType, Node, NodeKind, Path};

/// Live connection to a Neo4j/BloodHound graph store.
pub struct Neo4jGraphAdapter {
    graph: Graph,
    runtime: Runtime,
}

impl Neo4jGraphAdapter {
    /// Connect and run a connectivity probe (`RETURN 1`), matching the
    /// teacher's startup-time `vertify_connection` check.
    pub fn connect(uri: &str, user: &str, password: &str) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| CadraError::GraphConnection {
                uri: uri.to_string(),
                details: format!("failed to start runtime: {e}"),
            })?;

        let graph = runtime.block_on(async {
            let graph = Graph::new(uri, user, password)
                .await
                .map_err(|e| CadraError::GraphConnection {
                    uri: uri.to_string(),
                    details: e.to_string(),
                })?;
            probe(&graph).await.map_err(|e| CadraError::GraphConnection {
                uri: uri.to_string(),
                details: e.to_string(),
            })?;
            Ok::<_, CadraError>(graph)
        })?;

        Ok(Self { graph, runtime })
    }
}

async fn probe(graph: &Graph) -> std::result::Result<(), String> {
    let mut result = graph
        .execute(query("RETURN 1 AS number"))
        .await
        .map_err(|e| e.to_string())?;
    let row = result.next().await.map_err(|e| e.to_string())?;
    let value: i64 = row
        .and_then(|r| r.get("number").ok())
        .ok_or_else(|| "connectivity probe returned no rows".to_string())?;
    if value == 1 {
        Ok(())
    } else {
        Err(format!("unexpected probe result: {value}"))
    }
}

impl GraphAdapter for Neo4jGraphAdapter {
    fn find_user(&self, name: &str) -> Result<Option<Node>> {
        self.runtime.block_on(async {
            let q = query("MATCH (n:User {name: $name}) RETURN n LIMIT 1").param("name", name);
            let mut result = self
                .graph
                .execute(q)
                .await
                .map_err(|e| CadraError::GraphQuery { details: e.to_string() })?;
            let Some(row) = result
                .next()
                .await
                .map_err(|e| CadraError::GraphQuery { details: e.to_string() })?
            else {
                return Ok(None);
            };
            let raw: Neo4jNode = row
                .get("n")
                .map_err(|e| CadraError::GraphQuery { details: e.to_string() })?;
            Ok(Some(node_from_neo4j(&raw)))
        })
    }

    fn outbound_paths(&self, name: &str, sink: &mut dyn Sink) -> Result<Vec<Path>> {
        self.runtime.block_on(async {
            let q = query("MATCH (n:User {name: $name})-[r]->(m) RETURN n, r, m").param("name", name);
            let mut result = self
                .graph
                .execute(q)
                .await
                .map_err(|e| CadraError::GraphQuery { details: e.to_string() })?;

            let mut paths = Vec::new();
            while let Some(row) = result
                .next()
                .await
                .map_err(|e| CadraError::GraphQuery { details: e.to_string() })?
            {
                let start_raw: Neo4jNode = row
                    .get("n")
                    .map_err(|e| CadraError::GraphQuery { details: e.to_string() })?;
                let end_raw: Neo4jNode = row
                    .get("m")
                    .map_err(|e| CadraError::GraphQuery { details: e.to_string() })?;
                let rel_raw: Relation = row
                    .get("r")
                    .map_err(|e| CadraError::GraphQuery { details: e.to_string() })?;

                let start_node = node_from_neo4j(&start_raw);
                let end_node = node_from_neo4j(&end_raw);
                let Some(edge_type) = EdgeType::parse(rel_raw.typ()) else {
                    let _ = sink.log(&LogEvent::new(
                        Severity::Warn,
                        format!("skipping outbound edge with unknown relationship type '{}'", rel_raw.typ()),
                    ).with_principal(name));
                    continue;
                };
                let relationship = Edge::new(edge_type, start_node.id.clone(), end_node.id.clone());
                match Path::new(relationship, start_node, end_node) {
                    Ok(path) => paths.push(path),
                    Err(e) => {
                        let _ = sink.log(&LogEvent::new(
                            Severity::Warn,
                            format!("rejecting inconsistent outbound path: {e}"),
                        ).with_principal(name));
                    }
                }
            }
            Ok(paths)
        })
    }
}

/// Properties the rule engine ever reads off a node. The schema adapter only
/// needs to carry these across the wire; anything else BloodHound attaches
/// to a node is irrelevant to CADRA's rules and is left behind.
const KNOWN_PROPERTIES: &[&str] = &[
    "name",
    "enabled",
    "admincount",
    "highvalue",
    "description",
    "whencreated",
    "lastlogon",
    "lastlogontimestamp",
    "sensitive",
    "dontreqpreauth",
    "passwordnotreqd",
    "pwdneverexpires",
    "unconstraineddelegation",
    "trustedtoauth",
    "serviceprincipalnames",
];

fn node_from_neo4j(raw: &Neo4jNode) -> Node {
    let id = raw.id().to_string();
    let kind = NodeKind::from_labels(raw.labels().iter().map(String::as_str));
    let mut props = std::collections::HashMap::new();
    for key in KNOWN_PROPERTIES {
        if let Some(value) = property_value(raw, key) {
            props.insert((*key).to_string(), value);
        }
    }
    Node::new(id, kind, props)
}

fn property_value(raw: &Neo4jNode, key: &str) -> Option<PropertyValue> {
    if let Ok(v) = raw.get::<bool>(key) {
        return Some(PropertyValue::Bool(v));
    }
    if let Ok(v) = raw.get::<i64>(key) {
        return Some(PropertyValue::Int(v));
    }
    if let Ok(v) = raw.get::<Vec<String>>(key) {
        return Some(PropertyValue::List(v));
    }
    raw.get::<String>(key).ok().map(PropertyValue::Str)
}
