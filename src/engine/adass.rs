//! The ADASS calculator: decodes a CVSS-style metric vector string into a
//! 0.0-10.0 severity score.

use std::collections::HashMap;

/// The six metric keys ADASS reads from a vector string. `C`, `I`, and `A`
/// are mandatory; `S` defaults to `U` (unchanged) and `AC`/`PR` default to
/// `NA` (not applicable) when the vector omits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Metrics {
    scope_changed: bool,
    ac: &'static str,
    pr: &'static str,
    c: &'static str,
    i: &'static str,
    a: &'static str,
}

/// The decoded score plus the intermediate sub-scores, kept around for
/// reporting (`--verbose` shows the ISC/exploitability breakdown).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdassScore {
    pub isc: f64,
    pub exploitability: f64,
    pub score: f64,
}

/// Parse a metric vector of the form `S:U/AC:L/PR:N/C:H/I:H/A:H` and compute
/// its ADASS score.
///
/// A malformed or missing token is an evaluation anomaly, not a fatal error:
/// the offending slot defaults (mandatory `C`/`I`/`A` fall back to their
/// no-matching-rule defaults of `L`/`L`/`N`; `AC`/`PR` fall back to `NA` as
/// they already do when simply absent) and a warning describing the
/// substitution is returned alongside the score for the caller to log.
#[must_use]
pub fn calculate_score(vector: &str) -> (AdassScore, Vec<String>) {
    let (metrics, warnings) = decode_metrics(vector);
    (score_metrics(&metrics), warnings)
}

fn decode_metrics(vector: &str) -> (Metrics, Vec<String>) {
    let mut raw: HashMap<&str, &str> = HashMap::new();
    let mut warnings = Vec::new();
    for token in vector.split('/') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let mut parts = token.splitn(2, ':');
        let key = parts.next().unwrap_or_default().trim();
        match parts.next() {
            Some(value) => {
                raw.insert(key, value.trim());
            }
            None => warnings.push(format!("malformed metric token '{token}', ignoring")),
        }
    }

    let scope_changed = matches!(raw.get("S").copied().unwrap_or("U"), "C");

    let c = mandatory_metric(&raw, "C", &["L", "H"], "L", &mut warnings);
    let i = mandatory_metric(&raw, "I", &["L", "H"], "L", &mut warnings);
    let a = mandatory_metric(&raw, "A", &["N", "L", "H"], "N", &mut warnings);
    let ac = optional_metric(&raw, "AC", &["NA", "L", "H"], "NA", &mut warnings);
    let pr = optional_metric(&raw, "PR", &["NA", "L", "H"], "NA", &mut warnings);

    (
        Metrics {
            scope_changed,
            ac,
            pr,
            c,
            i,
            a,
        },
        warnings,
    )
}

/// A mandatory metric (`C`/`I`/`A`) that is missing or carries a value
/// outside `allowed` defaults to `default`, logging why.
fn mandatory_metric(
    raw: &HashMap<&str, &str>,
    key: &'static str,
    allowed: &[&'static str],
    default: &'static str,
    warnings: &mut Vec<String>,
) -> &'static str {
    match raw.get(key).copied() {
        None => {
            warnings.push(format!("mandatory metric {key} is missing, defaulting to {key}:{default}"));
            default
        }
        Some(value) => allowed.iter().copied().find(|candidate| *candidate == value).unwrap_or_else(|| {
            warnings.push(format!("malformed metric token {key}:{value}, defaulting to {key}:{default}"));
            default
        }),
    }
}

/// An optional metric (`AC`/`PR`) is silently `default` when absent — that's
/// the documented fallback, not an anomaly — but still logs if present with
/// a value outside `allowed`.
fn optional_metric(
    raw: &HashMap<&str, &str>,
    key: &'static str,
    allowed: &[&'static str],
    default: &'static str,
    warnings: &mut Vec<String>,
) -> &'static str {
    match raw.get(key).copied() {
        None => default,
        Some(value) => allowed.iter().copied().find(|candidate| *candidate == value).unwrap_or_else(|| {
            warnings.push(format!("malformed metric token {key}:{value}, defaulting to {key}:{default}"));
            default
        }),
    }
}

fn ac_value(ac: &str, scope_changed: bool) -> f64 {
    match (ac, scope_changed) {
        ("NA", false) => 0.61,
        ("L", false) => 0.77,
        ("H", false) => 0.44,
        ("NA", true) => 0.67,
        ("L", true) => 0.68,
        ("H", true) => 0.50,
        _ => unreachable!("AC is validated to one of NA/L/H during decode"),
    }
}

fn pr_value(pr: &str, scope_changed: bool) -> f64 {
    match (pr, scope_changed) {
        ("NA", false) => 0.58,
        ("L", false) => 0.62,
        ("H", false) => 0.27,
        ("NA", true) => 0.67,
        ("L", true) => 0.68,
        ("H", true) => 0.50,
        _ => unreachable!("PR is validated to one of NA/L/H during decode"),
    }
}

fn cia_value(level: &str) -> f64 {
    match level {
        "N" => 0.0,
        "L" => 0.22,
        "H" => 0.56,
        _ => unreachable!("C/I/A are validated to one of N/L/H during decode"),
    }
}

fn score_metrics(metrics: &Metrics) -> AdassScore {
    // Scope change silently upgrades AC/PR to their `_S` variants; C/I/A have
    // no scope-specific variant and are read the same either way.
    let ac = ac_value(metrics.ac, metrics.scope_changed);
    let pr = pr_value(metrics.pr, metrics.scope_changed);
    let c = cia_value(metrics.c);
    let i = cia_value(metrics.i);
    let a = cia_value(metrics.a);

    let isc_base = 1.0 - (1.0 - c) * (1.0 - i) * (1.0 - a);
    let isc = if metrics.scope_changed {
        7.52 * (isc_base - 0.029) - 3.25 * (isc_base - 0.02).powf(15.0)
    } else {
        6.42 * isc_base
    };
    let exploitability = 5.94 * ac * pr;

    let score = if metrics.scope_changed {
        round_up(f64::min(1.08 * (isc + exploitability), 10.0), 1)
    } else {
        round_up(f64::min(isc + exploitability, 10.0), 1)
    };

    AdassScore {
        isc,
        exploitability,
        score,
    }
}

fn round_up(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).ceil() / factor
}
