//! Attribute assessment: folds matched attribute rules into a CVSS-style
//! metric vector and scores it with the ADASS calculator.

use std::collections::HashMap;

use crate::engine::adass::{self, AdassScore};
use crate::engine::rules::{PropertyResolver, RuleEngine};
use crate::logger::Sink;

/// Rule names that bind a "High" CIA value when matched.
const HIGH_CIA_RULES: &[&str] = &["Tier Zero Object"];
/// Rule names that bind a "Low"/"None" CIA value when matched.
const LOW_CIA_RULES: &[&str] = &["Service Account"];

/// The outcome of assessing one principal's attributes: the rule names that
/// matched, the metric vector built from them, and the resulting score.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeAssessment {
    pub matched_rule_names: Vec<String>,
    pub metric_vector: String,
    pub score: AdassScore,
}

/// Evaluate every loaded rule against `resolver` and fold the matches into
/// an ADASS score.
///
/// S/AC/PR bindings come from the matched rules' `Metric`/`Value` pairs
/// (last writer wins, logging a warning on a conflicting overwrite via the
/// returned warning list). C/I/A are always appended afterward from the
/// fixed CIA rule-name lists, independent of whether any rule happened to
/// target those keys directly.
pub fn assess_user_attributes(
    engine: &mut RuleEngine,
    resolver: &dyn PropertyResolver,
    now_epoch_secs: i64,
    sink: &mut dyn Sink,
) -> (AttributeAssessment, Vec<String>) {
    let matches = engine.get_matching_rules(resolver, now_epoch_secs, sink);
    let matched_rule_names: Vec<String> = matches.iter().map(|m| m.rule_name.clone()).collect();

    let mut metric_map: HashMap<String, String> = HashMap::new();
    let mut warnings = Vec::new();

    for matched in &matches {
        let (Some(key), Some(value)) = (&matched.metric, &matched.value) else {
            continue;
        };
        if !matches!(key.as_str(), "S" | "AC" | "PR") {
            continue;
        }
        let value_str = value.as_str().map_or_else(|| value.to_string(), str::to_string);
        if let Some(existing) = metric_map.get(key)
            && existing != &value_str
        {
            warnings.push(format!(
                "attribute rule '{}' overwrites metric {key} ({existing} -> {value_str})",
                matched.rule_name
            ));
        }
        metric_map.insert(key.clone(), value_str);
    }

    let cia = check_cia_rules(&matched_rule_names);
    for (key, value) in cia {
        metric_map.insert(key.to_string(), value.to_string());
    }

    let mut tokens: Vec<String> = metric_map.into_iter().map(|(k, v)| format!("{k}:{v}")).collect();
    tokens.sort();
    let metric_vector = tokens.join("/");

    let (score, adass_warnings) = adass::calculate_score(&metric_vector);
    warnings.extend(adass_warnings);

    (
        AttributeAssessment {
            matched_rule_names,
            metric_vector,
            score,
        },
        warnings,
    )
}

/// Each of C/I/A independently checks matched rule names against the
/// "high" list, then the "low" list, then falls back to its own default.
fn check_cia_rules(matched_rule_names: &[String]) -> [(&'static str, &'static str); 3] {
    let matches_any = |names: &[&str]| {
        matched_rule_names
            .iter()
            .any(|m| names.contains(&m.as_str()))
    };

    let high = matches_any(HIGH_CIA_RULES);
    let low = matches_any(LOW_CIA_RULES);

    let c = if high { "H" } else { "L" };
    let i = if high { "H" } else { "L" };
    let a = if high {
        "H"
    } else if low {
        "L"
    } else {
        "N"
    };

    [("C", c), ("I", i), ("A", a)]
}
