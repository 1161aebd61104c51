//! Permission assessment: scores each outbound path by combining the
//! principal's ADASS score, a per-relationship-type likelihood rule, event
//! monitoring coverage, and an impact tier derived from the path's
//! end-node.

use std::collections::HashMap;
use std::fs;
use std::path::Path as FsPath;

use serde::Deserialize;

use crate::core::errors::{CadraError, Result};
use crate::engine::rules::RuleEngine;
use crate::logger::{LogEvent, Severity, Sink};
use crate::model::Path;

/// Rule names that bind the "Very High" impact tier.
const TIER_ZERO_NAMES: &[&str] = &["Tier Zero Object"];
/// Rule names that bind the "High" impact tier.
const TIER_ONE_NAMES: &[&str] = &["Tier One Object"];
/// Rule names that bind the "Medium" impact tier.
const PRIVILEGED_NAMES: &[&str] = &["Privileged Account", "Service Account"];

/// A per-relationship-type likelihood/impact rule, one JSON file per type.
#[derive(Debug, Clone, Deserialize)]
pub struct PermissionRule {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Events", default)]
    pub events: Vec<i64>,
    #[serde(rename = "Predisposing Conditions")]
    pub predisposing_conditions: i64,
    #[serde(rename = "Threat Occurrence")]
    pub threat_occurrence: i64,
    #[serde(rename = "Traversable", default)]
    pub traversable: bool,
}

/// Loads the permission rule table, one rule keyed by the BloodHound edge
/// wire string it applies to.
#[derive(Debug, Default)]
pub struct PermissionRuleTable {
    rules: HashMap<String, PermissionRule>,
}

impl PermissionRuleTable {
    /// A missing directory is fatal; a file that fails to parse as a
    /// `PermissionRule` is logged as a warning and skipped.
    pub fn load_from_directory(dir: &FsPath, sink: &mut dyn Sink) -> Result<Self> {
        if !dir.is_dir() {
            return Err(CadraError::MissingRulesDirectory {
                path: dir.to_path_buf(),
            });
        }
        let mut rules = HashMap::new();
        let entries = fs::read_dir(dir).map_err(|source| CadraError::io(dir, source))?;
        for entry in entries {
            let entry = entry.map_err(|source| CadraError::io(dir, source))?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let raw = fs::read_to_string(&path).map_err(|source| CadraError::io(&path, source))?;
            match serde_json::from_str::<PermissionRule>(&raw) {
                Ok(rule) => {
                    rules.insert(rule.name.clone(), rule);
                }
                Err(e) => {
                    let _ = sink.log(&LogEvent::new(
                        Severity::Warn,
                        format!("skipping malformed permission rule file {}: {e}", path.display()),
                    ));
                }
            }
        }
        Ok(Self { rules })
    }
}

/// One path's scored likelihood/impact/risk, kept alongside its source path
/// so the report can name which edge produced the worst-case rating.
#[derive(Debug, Clone)]
pub struct PathAssessment<'a> {
    pub path: &'a Path,
    pub likelihood: i64,
    pub impact: i64,
    pub risk_bucket: i64,
}

/// The overall permission-assessment outcome: the worst-scoring path (if
/// any path's relationship type had a matching rule) plus every path's
/// individual result, for a `--verbose` breakdown.
#[derive(Debug, Clone, Default)]
pub struct PermissionAssessment<'a> {
    pub worst: Option<PathAssessment<'a>>,
    pub per_path: Vec<PathAssessment<'a>>,
}

impl PermissionAssessment<'_> {
    /// The qualitative risk rating (1-5), or 0 if no path was assessable.
    #[must_use]
    pub fn qualitative_risk(&self) -> i64 {
        self.worst.as_ref().map_or(0, |w| {
            bucket(bucket(w.likelihood) * w.impact)
        })
    }
}

/// Assess every outbound path, returning the worst-scoring one (per the
/// `likelihood > highest.likelihood && impact >= highest.impact` tie-break)
/// plus every path's individual score.
pub fn assess_permissions<'a>(
    paths: &'a [Path],
    rule_table: &PermissionRuleTable,
    attribute_rule_engine: &mut RuleEngine,
    adass_score: f64,
    event_monitoring: &HashMap<u32, bool>,
    now_epoch_secs: i64,
    sink: &mut dyn Sink,
) -> PermissionAssessment<'a> {
    let mut per_path = Vec::new();
    let mut worst: Option<PathAssessment<'a>> = None;

    for path in paths {
        let Some(rule) = rule_table.rules.get(path.relationship.edge_type.wire_str()) else {
            let _ = sink.log(&LogEvent::new(
                Severity::Warn,
                format!(
                    "no permission rule for relationship type '{}', skipping path",
                    path.relationship.edge_type
                ),
            ));
            continue;
        };

        let likelihood = assess_permission_likelihood(rule, adass_score, event_monitoring);
        let impact = assess_permission_impact(path, rule, attribute_rule_engine, now_epoch_secs, sink);
        let risk_bucket = bucket(bucket(likelihood) * impact);

        let assessment = PathAssessment {
            path,
            likelihood,
            impact,
            risk_bucket,
        };

        let replaces = match &worst {
            None => true,
            Some(current) => likelihood > current.likelihood && impact >= current.impact,
        };
        if replaces {
            worst = Some(assessment.clone());
        }
        per_path.push(assessment);
    }

    PermissionAssessment { worst, per_path }
}

fn assess_permission_likelihood(
    rule: &PermissionRule,
    adass_score: f64,
    event_monitoring: &HashMap<u32, bool>,
) -> i64 {
    let threat_initiation: i64 = if adass_score >= 9.0 {
        5
    } else if adass_score >= 7.0 {
        4
    } else if adass_score >= 4.0 {
        3
    } else if adass_score > 0.0 {
        2
    } else {
        1
    };

    let mut predisposing = rule.predisposing_conditions;
    let any_monitored = rule.events.iter().any(|event_id| {
        u32::try_from(*event_id)
            .ok()
            .and_then(|id| event_monitoring.get(&id))
            .copied()
            .unwrap_or(false)
    });
    if any_monitored {
        predisposing = -predisposing;
    }

    threat_initiation * rule.threat_occurrence + predisposing
}

/// Re-evaluates attribute rules against `path.end_node`, forcing a fresh
/// evaluation past the rule engine's cache, then checks tiers in severity
/// order. Checking every tier before falling back to the traversable-only
/// tiers means a later, lower-severity tier can no longer mask an earlier
/// match.
fn assess_permission_impact(
    path: &Path,
    rule: &PermissionRule,
    attribute_rule_engine: &mut RuleEngine,
    now_epoch_secs: i64,
    sink: &mut dyn Sink,
) -> i64 {
    attribute_rule_engine.evaluate_all(&path.end_node, now_epoch_secs, true, sink);
    let matched: Vec<String> = attribute_rule_engine
        .get_matching_rules(&path.end_node, now_epoch_secs, sink)
        .into_iter()
        .map(|m| m.rule_name.clone())
        .collect();

    let matches_any = |names: &[&str]| matched.iter().any(|m| names.contains(&m.as_str()));

    if matches_any(TIER_ZERO_NAMES) {
        return if rule.traversable { 5 } else { 1 };
    }
    if matches_any(TIER_ONE_NAMES) {
        return if rule.traversable { 4 } else { 1 };
    }
    if matches_any(PRIVILEGED_NAMES) {
        return if rule.traversable { 3 } else { 1 };
    }
    if rule.traversable { 2 } else { 1 }
}

fn bucket(value: i64) -> i64 {
    if value >= 20 {
        5
    } else if value >= 15 {
        4
    } else if value >= 10 {
        3
    } else if value >= 5 {
        2
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::ConsoleSink;
    use crate::model::{Edge, EdgeType, Node, NodeKind, PropertyValue};
    use serde_json::json;
    use std::io::Write;

    fn write_rule(dir: &std::path::Path, filename: &str, body: &serde_json::Value) {
        let mut f = fs::File::create(dir.join(filename)).unwrap();
        write!(f, "{body}").unwrap();
    }

    fn tier_zero_attribute_engine() -> RuleEngine {
        let tmp = tempfile::tempdir().unwrap();
        write_rule(
            tmp.path(),
            "tier_zero.json",
            &json!({
                "Name": "Tier Zero Object",
                "Prerequisite Criteria": {},
                "Criteria": {
                    "admincount": {"Property": "admincount", "Operator": "==", "Value": true}
                }
            }),
        );
        let mut sink = ConsoleSink::new(true);
        let mut engine = RuleEngine::new();
        engine.load_rules_from_directory(tmp.path(), &mut sink).unwrap();
        engine
    }

    #[test]
    fn worked_example_genericall_tier_zero_traversable() {
        let tmp = tempfile::tempdir().unwrap();
        write_rule(
            tmp.path(),
            "genericall.json",
            &json!({
                "Name": "GenericAll",
                "Events": [4624],
                "Predisposing Conditions": 3,
                "Threat Occurrence": 2,
                "Traversable": true
            }),
        );
        let mut sink = ConsoleSink::new(true);
        let table = PermissionRuleTable::load_from_directory(tmp.path(), &mut sink).unwrap();
        let mut engine = tier_zero_attribute_engine();

        let end_props = HashMap::from([("admincount".to_string(), PropertyValue::Bool(true))]);
        let end_node = Node::new("B", NodeKind::Group, end_props);
        let relationship = Edge::new(EdgeType::GenericAll, "A", "B");
        let path = Path::new(relationship, Node::new("A", NodeKind::User, HashMap::new()), end_node).unwrap();

        let monitoring = HashMap::from([(4624u32, true)]);
        let assessment = assess_permissions(&[path], &table, &mut engine, 8.8, &monitoring, 0, &mut sink);

        let worst = assessment.worst.expect("one assessable path");
        assert_eq!(worst.likelihood, 5);
        assert_eq!(worst.impact, 5);
        assert_eq!(assessment.qualitative_risk(), 3);
    }

    #[test]
    fn unmonitored_event_does_not_flip_predisposing_sign() {
        let tmp = tempfile::tempdir().unwrap();
        write_rule(
            tmp.path(),
            "genericall.json",
            &json!({
                "Name": "GenericAll",
                "Events": [4624],
                "Predisposing Conditions": 3,
                "Threat Occurrence": 2,
                "Traversable": true
            }),
        );
        let mut sink = ConsoleSink::new(true);
        let table = PermissionRuleTable::load_from_directory(tmp.path(), &mut sink).unwrap();
        let mut engine = tier_zero_attribute_engine();

        let end_node = Node::new("B", NodeKind::Group, HashMap::new());
        let relationship = Edge::new(EdgeType::GenericAll, "A", "B");
        let path = Path::new(relationship, Node::new("A", NodeKind::User, HashMap::new()), end_node).unwrap();

        let assessment = assess_permissions(&[path], &table, &mut engine, 8.8, &HashMap::new(), 0, &mut sink);
        let worst = assessment.worst.expect("one assessable path");
        // threat_initiation=4 (ADASS 8.8 falls in the >=7 bucket), threat_occurrence=2,
        // predisposing stays +3 since no event in this rule is monitored.
        assert_eq!(worst.likelihood, 11);
    }

    #[test]
    fn non_traversable_tier_zero_match_caps_impact_at_very_low() {
        let tmp = tempfile::tempdir().unwrap();
        write_rule(
            tmp.path(),
            "writedacl.json",
            &json!({
                "Name": "WriteDacl",
                "Events": [],
                "Predisposing Conditions": 0,
                "Threat Occurrence": 1,
                "Traversable": false
            }),
        );
        let mut sink = ConsoleSink::new(true);
        let table = PermissionRuleTable::load_from_directory(tmp.path(), &mut sink).unwrap();
        let mut engine = tier_zero_attribute_engine();

        let end_props = HashMap::from([("admincount".to_string(), PropertyValue::Bool(true))]);
        let end_node = Node::new("B", NodeKind::Group, end_props);
        let relationship = Edge::new(EdgeType::WriteDacl, "A", "B");
        let path = Path::new(relationship, Node::new("A", NodeKind::User, HashMap::new()), end_node).unwrap();

        let assessment = assess_permissions(&[path], &table, &mut engine, 8.8, &HashMap::new(), 0, &mut sink);
        assert_eq!(assessment.worst.unwrap().impact, 1);
    }

    #[test]
    fn no_matching_relationship_type_yields_no_assessable_path() {
        let mut recorder = crate::logger::RecordingSink::default();
        let table = PermissionRuleTable { rules: HashMap::new() };
        let mut engine = tier_zero_attribute_engine();
        let end_node = Node::new("B", NodeKind::Group, HashMap::new());
        let relationship = Edge::new(EdgeType::GenericAll, "A", "B");
        let path = Path::new(relationship, Node::new("A", NodeKind::User, HashMap::new()), end_node).unwrap();

        let assessment = assess_permissions(&[path], &table, &mut engine, 8.8, &HashMap::new(), 0, &mut recorder);
        assert!(assessment.worst.is_none());
        assert_eq!(assessment.qualitative_risk(), 0);
        assert!(recorder.events.iter().any(|e| e.message.contains("GenericAll")));
    }

    #[test]
    fn strictly_greater_likelihood_with_equal_impact_replaces_worst() {
        let tmp = tempfile::tempdir().unwrap();
        write_rule(
            tmp.path(),
            "genericall.json",
            &json!({
                "Name": "GenericAll",
                "Events": [],
                "Predisposing Conditions": 0,
                "Threat Occurrence": 1,
                "Traversable": true
            }),
        );
        write_rule(
            tmp.path(),
            "genericwrite.json",
            &json!({
                "Name": "GenericWrite",
                "Events": [],
                "Predisposing Conditions": 5,
                "Threat Occurrence": 1,
                "Traversable": true
            }),
        );
        let mut sink = ConsoleSink::new(true);
        let table = PermissionRuleTable::load_from_directory(tmp.path(), &mut sink).unwrap();
        let mut engine = RuleEngine::new();

        let weak_end = Node::new("B", NodeKind::Group, HashMap::new());
        let strong_end = Node::new("C", NodeKind::Group, HashMap::new());
        let weak_path = Path::new(
            Edge::new(EdgeType::GenericAll, "A", "B"),
            Node::new("A", NodeKind::User, HashMap::new()),
            weak_end,
        )
        .unwrap();
        let strong_path = Path::new(
            Edge::new(EdgeType::GenericWrite, "A", "C"),
            Node::new("A", NodeKind::User, HashMap::new()),
            strong_end,
        )
        .unwrap();

        let assessment = assess_permissions(
            &[weak_path, strong_path],
            &table,
            &mut engine,
            1.0,
            &HashMap::new(),
            0,
            &mut sink,
        );
        let worst = assessment.worst.expect("assessable paths");
        assert_eq!(worst.path.relationship.edge_type, EdgeType::GenericWrite);
    }

    #[test]
    fn malformed_permission_rule_file_is_skipped_with_warning() {
        let tmp = tempfile::tempdir().unwrap();
        let mut f = fs::File::create(tmp.path().join("broken.json")).unwrap();
        write!(f, "{{ not valid json").unwrap();
        write_rule(
            tmp.path(),
            "genericall.json",
            &json!({
                "Name": "GenericAll",
                "Events": [],
                "Predisposing Conditions": 0,
                "Threat Occurrence": 1,
                "Traversable": true
            }),
        );
        let mut recorder = crate::logger::RecordingSink::default();
        let table = PermissionRuleTable::load_from_directory(tmp.path(), &mut recorder)
            .expect("a malformed file should be skipped, not abort the load");
        assert_eq!(table.rules.len(), 1);
        assert!(recorder.events.iter().any(|e| e.message.contains("broken.json")));
    }
}
