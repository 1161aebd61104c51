//! Orchestration: load rules, fetch the principal and its outbound paths,
//! score both assessments, and assemble the final report. One top-to-bottom
//! pass, synchronous throughout except for the graph adapter's own read.

use crate::core::config::Config;
use crate::core::errors::{CadraError, Result};
use crate::engine::{
    assess_permissions, assess_user_attributes, PermissionRuleTable, RuleEngine,
};
use crate::graph::GraphAdapter;
use crate::logger::{LogEvent, Severity, Sink};
use crate::model::{PrincipalView, User};
use crate::report::{EdgeSummary, Report};

/// Run one end-to-end assessment for `principal_name`.
///
/// `now_epoch_secs` is captured once by the caller and threaded through
/// every rule evaluation so a run is internally consistent even if it
/// straddles a clock tick.
pub fn assess(
    config: &Config,
    graph: &dyn GraphAdapter,
    sink: &mut dyn Sink,
    principal_name: &str,
    now_epoch_secs: i64,
) -> Result<Report> {
    let mut attribute_engine = RuleEngine::new();
    attribute_engine.load_rules_from_directory(&config.attributes_rules_dir_path, sink)?;
    let permission_rules =
        PermissionRuleTable::load_from_directory(&config.permissions_rules_dir_path, sink)?;

    let Some(node) = graph.find_user(principal_name)? else {
        sink.log(
            &LogEvent::new(Severity::Error, "principal not found").with_principal(principal_name),
        )?;
        return Err(CadraError::PrincipalNotFound {
            name: principal_name.to_string(),
        });
    };
    let mut user = User::from_node(node);

    let paths = graph.outbound_paths(principal_name, sink)?;
    match PrincipalView::from_paths(user.id().to_string(), &paths) {
        Ok(view) => {
            user.extras.memberof = view.extras.memberof;
            user.extras.edges = view.extras.edges;
        }
        Err(e) => {
            sink.log(
                &LogEvent::new(Severity::Warn, format!("discarding inconsistent outbound paths: {e}"))
                    .with_principal(principal_name),
            )?;
        }
    }

    let (attributes, warnings) = assess_user_attributes(&mut attribute_engine, &user, now_epoch_secs, sink);
    for warning in &warnings {
        sink.log(&LogEvent::new(Severity::Warn, warning.clone()).with_principal(principal_name))?;
    }
    sink.log(
        &LogEvent::new(
            Severity::Info,
            format!("ADASS score {:.1} [{}]", attributes.score.score, attributes.metric_vector),
        )
        .with_principal(principal_name),
    )?;

    let permission_assessment = assess_permissions(
        &paths,
        &permission_rules,
        &mut attribute_engine,
        attributes.score.score,
        &config.event_monitoring,
        now_epoch_secs,
        sink,
    );

    let per_edge: Vec<EdgeSummary> = permission_assessment
        .per_path
        .iter()
        .map(|assessed| EdgeSummary {
            edge_type: assessed.path.relationship.edge_type,
            end_node_name: assessed.path.end_node.name().map(str::to_string),
            likelihood: assessed.likelihood,
            impact: assessed.impact,
            risk_bucket: assessed.risk_bucket,
        })
        .collect();
    let worst_edge = permission_assessment.worst.as_ref().map(|assessed| EdgeSummary {
        edge_type: assessed.path.relationship.edge_type,
        end_node_name: assessed.path.end_node.name().map(str::to_string),
        likelihood: assessed.likelihood,
        impact: assessed.impact,
        risk_bucket: assessed.risk_bucket,
    });

    let permission_risk = permission_assessment.qualitative_risk();
    if permission_risk > 0 {
        sink.log(
            &LogEvent::new(Severity::Info, format!("permission risk bucket {permission_risk}"))
                .with_principal(principal_name),
        )?;
    }

    Ok(Report {
        principal_name: principal_name.to_string(),
        principal_id: user.id().to_string(),
        principal_kind: user.node.kind,
        adass_score: attributes.score,
        metric_vector: attributes.metric_vector,
        matched_attribute_rules: attributes.matched_rule_names,
        permission_risk,
        worst_edge,
        per_edge,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::FixtureGraphAdapter;
    use crate::logger::ConsoleSink;
    use crate::model::{Edge, EdgeType, Node, NodeKind, PropertyValue};
    use std::collections::HashMap;
    use std::io::Write;

    fn write_rule(dir: &std::path::Path, filename: &str, body: &serde_json::Value) {
        let mut f = std::fs::File::create(dir.join(filename)).unwrap();
        write!(f, "{body}").unwrap();
    }

    #[test]
    fn missing_principal_is_an_error() {
        let attr_dir = tempfile::tempdir().unwrap();
        let perm_dir = tempfile::tempdir().unwrap();
        let config = Config {
            attributes_rules_dir_path: attr_dir.path().to_path_buf(),
            permissions_rules_dir_path: perm_dir.path().to_path_buf(),
            ..Config::default()
        };
        let graph = FixtureGraphAdapter::new();
        let mut sink = ConsoleSink::new(true);

        let err = assess(&config, &graph, &mut sink, "nobody", 0).expect_err("expected not-found");
        assert!(matches!(err, CadraError::PrincipalNotFound { .. }));
    }

    #[test]
    fn principal_with_no_outbound_paths_still_scores_adass() {
        let attr_dir = tempfile::tempdir().unwrap();
        let perm_dir = tempfile::tempdir().unwrap();
        write_rule(
            attr_dir.path(),
            "tier_zero.json",
            &serde_json::json!({
                "Name": "Tier Zero Object",
                "Prerequisite Criteria": {},
                "Criteria": {"admincount": {"Property": "admincount", "Operator": "==", "Value": true}}
            }),
        );
        let config = Config {
            attributes_rules_dir_path: attr_dir.path().to_path_buf(),
            permissions_rules_dir_path: perm_dir.path().to_path_buf(),
            ..Config::default()
        };

        let props = HashMap::from([
            ("name".to_string(), PropertyValue::Str("alice".to_string())),
            ("admincount".to_string(), PropertyValue::Bool(true)),
        ]);
        let node = Node::new("1", NodeKind::User, props);
        let graph = FixtureGraphAdapter::new().with_user("alice", node);
        let mut sink = ConsoleSink::new(true);

        let report = assess(&config, &graph, &mut sink, "alice", 0).unwrap();
        assert!(report.adass_score.score > 0.0);
        assert_eq!(report.permission_risk, 0);
        assert!(report.worst_edge.is_none());
    }

    #[test]
    fn principal_with_outbound_path_gets_permission_risk() {
        let attr_dir = tempfile::tempdir().unwrap();
        let perm_dir = tempfile::tempdir().unwrap();
        write_rule(
            perm_dir.path(),
            "genericall.json",
            &serde_json::json!({
                "Name": "GenericAll",
                "Events": [],
                "Predisposing Conditions": 0,
                "Threat Occurrence": 1,
                "Traversable": true
            }),
        );
        let config = Config {
            attributes_rules_dir_path: attr_dir.path().to_path_buf(),
            permissions_rules_dir_path: perm_dir.path().to_path_buf(),
            ..Config::default()
        };

        let start = Node::new(
            "1",
            NodeKind::User,
            HashMap::from([("name".to_string(), PropertyValue::Str("alice".to_string()))]),
        );
        let end = Node::new(
            "2",
            NodeKind::Group,
            HashMap::from([("name".to_string(), PropertyValue::Str("Domain Admins".to_string()))]),
        );
        let path = Edge::new(EdgeType::GenericAll, "1", "2");
        let path = crate::model::Path::new(path, start.clone(), end).unwrap();

        let graph = FixtureGraphAdapter::new()
            .with_user("alice", start)
            .with_paths("alice", vec![path]);
        let mut sink = ConsoleSink::new(true);

        let report = assess(&config, &graph, &mut sink, "alice", 0).unwrap();
        assert!(report.permission_risk > 0);
        assert_eq!(
            report.worst_edge.as_ref().unwrap().end_node_name.as_deref(),
            Some("Domain Admins")
        );
    }
}
