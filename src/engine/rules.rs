//! The declarative rule engine: loads `*.json` rule files, evaluates their
//! Prerequisite/Criteria clauses against a node, and caches the result for
//! the lifetime of one driver run.

use std::collections::HashMap;
use std::fs;
use std::path::Path as FsPath;

use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::core::errors::{CadraError, Result};
use crate::engine::operators::{Operator, compare};
use crate::logger::{LogEvent, Severity, Sink};
use crate::model::PropertyValue;

/// Resolves a named property on something rule criteria can be evaluated
/// against. Implemented by both plain `Node`s (raw bag → generic defaults)
/// and `User`s (raw bag → generic → principal defaults → UAC-flag
/// membership) — the rule engine itself is agnostic to which.
pub trait PropertyResolver {
    fn resolver_id(&self) -> &str;
    fn resolve(&self, name: &str) -> Option<PropertyValue>;
}

impl PropertyResolver for crate::model::Node {
    fn resolver_id(&self) -> &str {
        &self.id
    }

    fn resolve(&self, name: &str) -> Option<PropertyValue> {
        self.property(name).cloned()
    }
}

impl PropertyResolver for crate::model::User {
    fn resolver_id(&self) -> &str {
        self.id()
    }

    fn resolve(&self, name: &str) -> Option<PropertyValue> {
        self.property(name)
    }
}

/// A single `{Property, Operator, Value}` leaf criterion.
#[derive(Debug, Clone, Deserialize)]
pub struct CriterionClause {
    #[serde(rename = "Property")]
    pub property: String,
    #[serde(rename = "Operator")]
    pub operator: String,
    #[serde(rename = "Value")]
    pub value: JsonValue,
}

/// A criteria-map entry: either one clause, or a list of clauses reduced by
/// ANY (disjunction).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CriteriaEntry {
    Single(CriterionClause),
    Group(Vec<CriterionClause>),
}

/// A single attribute-assessment rule file.
#[derive(Debug, Clone, Deserialize)]
pub struct Rule {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Metric", default)]
    pub metric: Option<String>,
    #[serde(rename = "Value", default)]
    pub value: Option<JsonValue>,
    #[serde(rename = "Prerequisite Criteria", default)]
    pub prerequisite_criteria: HashMap<String, CriteriaEntry>,
    #[serde(rename = "Criteria", default)]
    pub criteria: HashMap<String, CriteriaEntry>,
}

/// The outcome of evaluating one [`Rule`] against one node.
#[derive(Debug, Clone)]
pub struct RuleEvaluation {
    pub rule_name: String,
    pub metric: Option<String>,
    pub value: Option<JsonValue>,
    pub prerequisites_met: bool,
    pub criteria_met: bool,
    pub matches: bool,
}

/// Loads rule files once and evaluates them against nodes, caching results
/// per node id for the lifetime of one run.
#[derive(Debug, Default)]
pub struct RuleEngine {
    rules: Vec<Rule>,
    cache: HashMap<String, Vec<RuleEvaluation>>,
}

impl RuleEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.json` file in `dir` as a rule. A missing directory is
    /// fatal (`MissingRulesDirectory`); a file that fails to parse as a
    /// `Rule` is logged as a warning and skipped — the rest of the
    /// directory still loads.
    pub fn load_rules_from_directory(&mut self, dir: &FsPath, sink: &mut dyn Sink) -> Result<()> {
        if !dir.is_dir() {
            return Err(CadraError::MissingRulesDirectory {
                path: dir.to_path_buf(),
            });
        }

        let mut rules = Vec::new();
        let entries = fs::read_dir(dir).map_err(|source| CadraError::io(dir, source))?;
        for entry in entries {
            let entry = entry.map_err(|source| CadraError::io(dir, source))?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let raw = fs::read_to_string(&path).map_err(|source| CadraError::io(&path, source))?;
            match serde_json::from_str::<Rule>(&raw) {
                Ok(rule) => rules.push(rule),
                Err(e) => {
                    let _ = sink.log(&LogEvent::new(
                        Severity::Warn,
                        format!("skipping malformed rule file {}: {e}", path.display()),
                    ));
                }
            }
        }

        self.rules = rules;
        Ok(())
    }

    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Evaluate every loaded rule against `resolver`, storing the result
    /// under its id. A cache hit is reused unless `force` bypasses it —
    /// permission-impact assessment re-evaluates a path's end node this way
    /// rather than mutating the cache through a side door.
    pub fn evaluate_all(
        &mut self,
        resolver: &dyn PropertyResolver,
        now_epoch_secs: i64,
        force: bool,
        sink: &mut dyn Sink,
    ) {
        let id = resolver.resolver_id().to_string();
        if !force && self.cache.contains_key(&id) {
            return;
        }
        let evaluations = self
            .rules
            .iter()
            .map(|rule| evaluate_rule(rule, resolver, now_epoch_secs, sink))
            .collect();
        self.cache.insert(id, evaluations);
    }

    /// Cache-on-miss; return every rule evaluation whose `matches` is true.
    pub fn get_matching_rules(
        &mut self,
        resolver: &dyn PropertyResolver,
        now_epoch_secs: i64,
        sink: &mut dyn Sink,
    ) -> Vec<&RuleEvaluation> {
        self.evaluate_all(resolver, now_epoch_secs, false, sink);
        self.cache
            .get(resolver.resolver_id())
            .into_iter()
            .flatten()
            .filter(|e| e.matches)
            .collect()
    }
}

fn evaluate_rule(
    rule: &Rule,
    resolver: &dyn PropertyResolver,
    now_epoch_secs: i64,
    sink: &mut dyn Sink,
) -> RuleEvaluation {
    let prerequisites_met = if rule.prerequisite_criteria.is_empty() {
        true
    } else {
        rule.prerequisite_criteria
            .values()
            .all(|entry| check_entry(entry, resolver, now_epoch_secs, &mut *sink))
    };

    let criteria_met = prerequisites_met
        && !rule.criteria.is_empty()
        && rule
            .criteria
            .values()
            .any(|entry| check_entry(entry, resolver, now_epoch_secs, &mut *sink));

    RuleEvaluation {
        rule_name: rule.name.clone(),
        metric: rule.metric.clone(),
        value: rule.value.clone(),
        prerequisites_met,
        criteria_met,
        matches: prerequisites_met && criteria_met,
    }
}

fn check_entry(
    entry: &CriteriaEntry,
    resolver: &dyn PropertyResolver,
    now_epoch_secs: i64,
    sink: &mut dyn Sink,
) -> bool {
    match entry {
        CriteriaEntry::Single(clause) => check_clause(clause, resolver, now_epoch_secs, sink),
        CriteriaEntry::Group(clauses) => clauses
            .iter()
            .any(|clause| check_clause(clause, resolver, now_epoch_secs, &mut *sink)),
    }
}

/// Missing property, unknown operator, and coercion failure all degrade to
/// false here rather than propagating — they are evaluation anomalies, not
/// fatal errors (§7) — but each is logged so the anomaly is visible.
fn check_clause(
    clause: &CriterionClause,
    resolver: &dyn PropertyResolver,
    now_epoch_secs: i64,
    sink: &mut dyn Sink,
) -> bool {
    let Some(actual) = resolver.resolve(&clause.property) else {
        let _ = sink.log(&LogEvent::new(
            Severity::Warn,
            format!(
                "rule criterion references unknown property '{}' on {}",
                clause.property,
                resolver.resolver_id()
            ),
        ));
        return false;
    };
    let Some(op) = Operator::parse(&clause.operator) else {
        let _ = sink.log(&LogEvent::new(
            Severity::Warn,
            format!(
                "rule criterion uses unknown operator '{}' on {}",
                clause.operator,
                resolver.resolver_id()
            ),
        ));
        return false;
    };
    match compare(op, &actual, &clause.value, now_epoch_secs) {
        Ok(result) => result,
        Err(e) => {
            let _ = sink.log(&LogEvent::new(
                Severity::Warn,
                format!(
                    "rule criterion on '{}' failed to evaluate for {}: {e}",
                    clause.property,
                    resolver.resolver_id()
                ),
            ));
            false
        }
    }
}
