//! The final assessment report: what the driver hands to the CLI for
//! rendering, as colorized text or as JSON.

use serde::Serialize;
use serde_json::{json, Value};

use crate::engine::AdassScore;
use crate::model::{EdgeType, NodeKind};

/// One outbound path's scored result, kept for the `--verbose` breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct EdgeSummary {
    pub edge_type: EdgeType,
    pub end_node_name: Option<String>,
    pub likelihood: i64,
    pub impact: i64,
    pub risk_bucket: i64,
}

/// The full report for one principal: its attribute (ADASS) assessment and,
/// if it has any outbound paths with a matching permission rule, its
/// permission risk assessment.
#[derive(Debug, Clone)]
pub struct Report {
    pub principal_name: String,
    pub principal_id: String,
    pub principal_kind: NodeKind,
    pub adass_score: AdassScore,
    pub metric_vector: String,
    pub matched_attribute_rules: Vec<String>,
    pub permission_risk: i64,
    pub worst_edge: Option<EdgeSummary>,
    pub per_edge: Vec<EdgeSummary>,
    pub warnings: Vec<String>,
}

impl Report {
    /// Serialize the report to a JSON value, for `--json`/non-TTY output.
    #[must_use]
    pub fn to_json(&self, verbose: bool) -> Value {
        let mut payload = json!({
            "principal": {
                "name": self.principal_name,
                "id": self.principal_id,
                "type": self.principal_kind.to_string(),
            },
            "adass": {
                "score": self.adass_score.score,
                "isc": self.adass_score.isc,
                "exploitability": self.adass_score.exploitability,
                "metric_vector": self.metric_vector,
            },
            "matched_attribute_rules": self.matched_attribute_rules,
            "permission_risk": self.permission_risk,
            "worst_edge": self.worst_edge.as_ref().map(edge_json),
        });
        if verbose {
            if let Value::Object(ref mut map) = payload {
                map.insert(
                    "per_edge".to_string(),
                    Value::Array(self.per_edge.iter().map(edge_json).collect()),
                );
                map.insert("warnings".to_string(), json!(self.warnings));
            }
        }
        payload
    }

    /// Render the report as colorized human-readable text.
    #[must_use]
    pub fn render_human(&self, verbose: bool) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "{} ({}, {})\n",
            bold(&self.principal_name),
            self.principal_id,
            self.principal_kind
        ));
        out.push_str(&format!(
            "  ADASS score: {}  [{}]\n",
            severity_colored(self.adass_score.score),
            self.metric_vector
        ));
        if self.matched_attribute_rules.is_empty() {
            out.push_str("  matched attribute rules: none\n");
        } else {
            out.push_str(&format!(
                "  matched attribute rules: {}\n",
                self.matched_attribute_rules.join(", ")
            ));
        }
        if self.permission_risk == 0 {
            out.push_str("  permission risk: n/a (no assessable outbound path)\n");
        } else {
            out.push_str(&format!(
                "  permission risk: {}\n",
                risk_colored(self.permission_risk)
            ));
            if let Some(edge) = &self.worst_edge {
                out.push_str(&format!(
                    "    via {} -> {}\n",
                    edge.edge_type,
                    edge.end_node_name.as_deref().unwrap_or("<unnamed>")
                ));
            }
        }
        if verbose && !self.per_edge.is_empty() {
            out.push_str("  per-edge breakdown:\n");
            for edge in &self.per_edge {
                out.push_str(&format!(
                    "    {} -> {}: likelihood={} impact={} risk={}\n",
                    edge.edge_type,
                    edge.end_node_name.as_deref().unwrap_or("<unnamed>"),
                    edge.likelihood,
                    edge.impact,
                    edge.risk_bucket
                ));
            }
        }
        if verbose {
            for warning in &self.warnings {
                out.push_str(&format!("  warning: {warning}\n"));
            }
        }
        out
    }
}

fn edge_json(edge: &EdgeSummary) -> Value {
    json!({
        "edge_type": edge.edge_type.to_string(),
        "end_node_name": edge.end_node_name,
        "likelihood": edge.likelihood,
        "impact": edge.impact,
        "risk_bucket": edge.risk_bucket,
    })
}

#[cfg(feature = "cli")]
fn bold(text: &str) -> String {
    use colored::Colorize;
    text.bold().to_string()
}

#[cfg(not(feature = "cli"))]
fn bold(text: &str) -> String {
    text.to_string()
}

#[cfg(feature = "cli")]
fn severity_colored(score: f64) -> String {
    use colored::Colorize;
    let text = format!("{score:.1}");
    if score >= 9.0 {
        text.red().bold().to_string()
    } else if score >= 7.0 {
        text.red().to_string()
    } else if score >= 4.0 {
        text.yellow().to_string()
    } else {
        text.green().to_string()
    }
}

#[cfg(not(feature = "cli"))]
fn severity_colored(score: f64) -> String {
    format!("{score:.1}")
}

#[cfg(feature = "cli")]
fn risk_colored(bucket: i64) -> String {
    use colored::Colorize;
    match bucket {
        5 => "Very High".red().bold().to_string(),
        4 => "High".red().to_string(),
        3 => "Medium".yellow().to_string(),
        2 => "Low".green().to_string(),
        _ => "Very Low".normal().to_string(),
    }
}

#[cfg(not(feature = "cli"))]
fn risk_colored(bucket: i64) -> String {
    match bucket {
        5 => "Very High",
        4 => "High",
        3 => "Medium",
        2 => "Low",
        _ => "Very Low",
    }
    .to_string()
}
