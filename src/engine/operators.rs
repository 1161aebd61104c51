//! Value coercion and the `compare(op, lhs, rhs)` operator algebra used by
//! every criterion clause in the rule engine.

use serde_json::Value as JsonValue;

use crate::core::errors::{CadraError, Result};
use crate::model::PropertyValue;

/// Closed operator vocabulary a rule criterion may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    In,
    NotIn,
    Any,
    OlderThan,
    NewerThan,
    Set,
    NotSet,
    StartsWith,
    EndsWith,
}

impl Operator {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Some(match raw {
            "==" => Self::Eq,
            "!=" => Self::Ne,
            "<" => Self::Lt,
            ">" => Self::Gt,
            "<=" => Self::Le,
            ">=" => Self::Ge,
            "in" => Self::In,
            "not in" => Self::NotIn,
            "any" => Self::Any,
            "older_than" => Self::OlderThan,
            "newer_than" => Self::NewerThan,
            "set" => Self::Set,
            "notset" => Self::NotSet,
            "startswith" => Self::StartsWith,
            "endswith" => Self::EndsWith,
            _ => return None,
        })
    }
}

/// Evaluate `lhs <op> rhs`.
///
/// `now_epoch_secs` is the wall-clock time captured once at the start of the
/// driver run; it is the cutoff basis for `older_than`/`newer_than` so a
/// single run stays internally consistent.
///
/// Any coercion failure (e.g. a non-numeric string compared with `<`) is an
/// evaluation anomaly: it is returned as `Err`, and callers are expected to
/// log it and degrade the owning criterion to false rather than propagate
/// a hard failure.
pub fn compare(op: Operator, lhs: &PropertyValue, rhs: &JsonValue, now_epoch_secs: i64) -> Result<bool> {
    match op {
        Operator::Eq => Ok(equals(lhs, rhs)?),
        Operator::Ne => Ok(!equals(lhs, rhs)?),
        Operator::Lt | Operator::Gt | Operator::Le | Operator::Ge => {
            let a = property_to_int(lhs)?;
            let b = json_to_int(rhs)?;
            Ok(match op {
                Operator::Lt => a < b,
                Operator::Gt => a > b,
                Operator::Le => a <= b,
                Operator::Ge => a >= b,
                _ => unreachable!(),
            })
        }
        Operator::In => in_all(lhs, rhs),
        Operator::NotIn => in_any(lhs, rhs).map(|matched| !matched),
        Operator::Any => in_any(lhs, rhs),
        Operator::OlderThan => {
            let ts = property_to_int(lhs)?;
            let cutoff = now_epoch_secs - duration_to_seconds(json_as_str(rhs)?);
            Ok(ts < cutoff)
        }
        Operator::NewerThan => {
            let ts = property_to_int(lhs)?;
            let cutoff = now_epoch_secs - duration_to_seconds(json_as_str(rhs)?);
            Ok(ts > cutoff)
        }
        Operator::Set => Ok(is_set(lhs)),
        Operator::NotSet => Ok(!is_set(lhs) || is_blank_json(rhs)),
        Operator::StartsWith => Ok(property_to_string(lhs).starts_with(&json_to_string(rhs))),
        Operator::EndsWith => Ok(property_to_string(lhs).ends_with(&json_to_string(rhs))),
    }
}

fn equals(lhs: &PropertyValue, rhs: &JsonValue) -> Result<bool> {
    Ok(match lhs {
        PropertyValue::Bool(b) => *b == json_to_bool(rhs)?,
        PropertyValue::Int(i) => *i == json_to_int(rhs)?,
        PropertyValue::Str(s) => *s == json_to_string(rhs),
        PropertyValue::List(items) => items.as_slice() == json_to_list(rhs).as_slice(),
    })
}

fn is_set(value: &PropertyValue) -> bool {
    match value {
        PropertyValue::List(items) => !items.is_empty(),
        PropertyValue::Str(s) => !s.is_empty() && !matches!(s.as_str(), "null" | "None"),
        PropertyValue::Bool(_) | PropertyValue::Int(_) => true,
    }
}

fn is_blank_json(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::String(s) => s.is_empty() || matches!(s.as_str(), "null" | "None"),
        _ => false,
    }
}

fn in_all(lhs: &PropertyValue, rhs: &JsonValue) -> Result<bool> {
    match lhs {
        PropertyValue::List(items) => {
            let needles = json_to_list(rhs);
            Ok(needles.iter().all(|n| items.contains(n)))
        }
        PropertyValue::Str(s) => Ok(json_to_list(rhs).iter().any(|n| n == s)),
        _ => Err(CadraError::MalformedMetricToken {
            token: format!("'in' operator not supported for {lhs:?}"),
        }),
    }
}

fn in_any(lhs: &PropertyValue, rhs: &JsonValue) -> Result<bool> {
    match (lhs, rhs) {
        (PropertyValue::List(items), JsonValue::Array(arr)) => {
            let needles = json_to_list(rhs);
            let _ = arr;
            Ok(needles.iter().any(|n| items.contains(n)))
        }
        (PropertyValue::Str(s), JsonValue::Array(_)) => Ok(json_to_list(rhs).iter().any(|n| n == s)),
        (PropertyValue::List(items), JsonValue::String(s)) => Ok(items.contains(s)),
        (PropertyValue::Str(a), JsonValue::String(b)) => Ok(a.contains(b.as_str()) || b.contains(a.as_str())),
        _ => Err(CadraError::MalformedMetricToken {
            token: format!("'any' operator not supported for {lhs:?} vs {rhs:?}"),
        }),
    }
}

fn property_to_int(value: &PropertyValue) -> Result<i64> {
    match value {
        PropertyValue::Int(i) => Ok(*i),
        PropertyValue::Bool(b) => Ok(i64::from(*b)),
        PropertyValue::Str(s) => parse_int_str(s),
        PropertyValue::List(_) => Err(CadraError::MalformedMetricToken {
            token: "cannot convert list property to integer".to_string(),
        }),
    }
}

fn property_to_string(value: &PropertyValue) -> String {
    match value {
        PropertyValue::Str(s) => s.clone(),
        PropertyValue::Bool(b) => b.to_string(),
        PropertyValue::Int(i) => i.to_string(),
        PropertyValue::List(items) => items.join(","),
    }
}

fn json_to_bool(value: &JsonValue) -> Result<bool> {
    match value {
        JsonValue::Bool(b) => Ok(*b),
        JsonValue::String(s) => match s.to_ascii_lowercase().trim() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(CadraError::MalformedMetricToken {
                token: format!("cannot convert {other:?} to boolean"),
            }),
        },
        other => Err(CadraError::MalformedMetricToken {
            token: format!("cannot convert {other} to boolean"),
        }),
    }
}

fn json_to_int(value: &JsonValue) -> Result<i64> {
    match value {
        JsonValue::Number(n) => n.as_i64().ok_or_else(|| CadraError::MalformedMetricToken {
            token: format!("cannot represent {n} as i64"),
        }),
        JsonValue::String(s) => parse_int_str(s),
        JsonValue::Bool(b) => Ok(i64::from(*b)),
        other => Err(CadraError::MalformedMetricToken {
            token: format!("cannot convert {other} to integer"),
        }),
    }
}

fn parse_int_str(raw: &str) -> Result<i64> {
    let trimmed = raw.trim();
    let (body, radix) = if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        (hex, 16)
    } else {
        (trimmed, 10)
    };
    i64::from_str_radix(body, radix).map_err(|_| CadraError::MalformedMetricToken {
        token: format!("cannot convert {raw:?} to integer"),
    })
}

fn json_to_string(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn json_to_list(value: &JsonValue) -> Vec<String> {
    match value {
        JsonValue::Array(items) => items.iter().map(json_to_string).collect(),
        other => vec![json_to_string(other)],
    }
}

fn json_as_str(value: &JsonValue) -> Result<&str> {
    value.as_str().ok_or_else(|| CadraError::MalformedMetricToken {
        token: format!("expected a duration string, got {value}"),
    })
}

/// Parse a duration string like `"90 days"`, `"1 year"`, or `"6 months 3 days"`
/// into seconds, using the source's approximations (365-day years, 30-day
/// months, literal days).
#[must_use]
pub fn duration_to_seconds(raw: &str) -> i64 {
    let mut total_days: i64 = 0;
    let mut chars = raw.char_indices().peekable();
    let mut digits_start: Option<usize> = None;

    while let Some((i, c)) = chars.next() {
        if c.is_ascii_digit() {
            if digits_start.is_none() {
                digits_start = Some(i);
            }
            continue;
        }
        if let Some(start) = digits_start.take() {
            let amount: i64 = raw[start..i].parse().unwrap_or(0);
            let rest = raw[i..].trim_start();
            let unit_end = rest
                .find(|ch: char| !ch.is_alphabetic())
                .unwrap_or(rest.len());
            let unit = &rest[..unit_end];
            total_days += amount
                * match unit {
                    u if u.starts_with("year") => 365,
                    u if u.starts_with("month") => 30,
                    u if u.starts_with("day") => 1,
                    _ => 0,
                };
        }
    }

    total_days * 86_400
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn eq_coerces_rhs_to_bool_lhs_type() {
        let result = compare(Operator::Eq, &PropertyValue::Bool(true), &json!("true"), 0).unwrap();
        assert!(result);
    }

    #[test]
    fn eq_coerces_hex_string_rhs_to_int_lhs() {
        let result = compare(Operator::Eq, &PropertyValue::Int(255), &json!("0xFF"), 0).unwrap();
        assert!(result);
    }

    #[test]
    fn startswith_and_endswith_work_on_string_form() {
        let lhs = PropertyValue::Str("krbtgt".to_string());
        assert!(compare(Operator::StartsWith, &lhs, &json!("krb"), 0).unwrap());
        assert!(compare(Operator::EndsWith, &lhs, &json!("tgt"), 0).unwrap());
    }

    #[test]
    fn in_requires_every_rhs_element_present_in_lhs_list() {
        let lhs = PropertyValue::List(vec!["a".to_string(), "b".to_string(), "c".to_string()]);
        assert!(compare(Operator::In, &lhs, &json!(["a", "b"]), 0).unwrap());
        assert!(!compare(Operator::In, &lhs, &json!(["a", "z"]), 0).unwrap());
    }

    #[test]
    fn any_matches_substring_overlap_for_strings() {
        let lhs = PropertyValue::Str("Domain Admins".to_string());
        assert!(compare(Operator::Any, &lhs, &json!("Admins"), 0).unwrap());
    }

    #[test]
    fn not_in_is_negation_of_any() {
        let lhs = PropertyValue::List(vec!["x".to_string()]);
        assert!(compare(Operator::NotIn, &lhs, &json!(["y"]), 0).unwrap());
        assert!(!compare(Operator::NotIn, &lhs, &json!(["x"]), 0).unwrap());
    }

    #[test]
    fn set_is_false_for_empty_list_and_empty_string() {
        assert!(!is_set(&PropertyValue::List(vec![])));
        assert!(!is_set(&PropertyValue::Str(String::new())));
        assert!(is_set(&PropertyValue::Str("x".to_string())));
    }

    #[test]
    fn duration_parses_compound_expressions() {
        assert_eq!(duration_to_seconds("1 year"), 365 * 86_400);
        assert_eq!(duration_to_seconds("2 years"), 2 * 365 * 86_400);
        assert_eq!(duration_to_seconds("90 days"), 90 * 86_400);
        assert_eq!(duration_to_seconds("6 months 3 days"), (6 * 30 + 3) * 86_400);
    }

    #[test]
    fn older_than_true_when_timestamp_predates_cutoff() {
        let now = 2_000_000_000_i64;
        let lhs = PropertyValue::Int(now - 400 * 86_400);
        assert!(compare(Operator::OlderThan, &lhs, &json!("1 year"), now).unwrap());
        assert!(!compare(Operator::OlderThan, &lhs, &json!("2 years"), now).unwrap());
    }

    #[test]
    fn newer_than_true_when_timestamp_postdates_cutoff() {
        let now = 2_000_000_000_i64;
        let lhs = PropertyValue::Int(now - 10 * 86_400);
        assert!(compare(Operator::NewerThan, &lhs, &json!("1 year"), now).unwrap());
        assert!(!compare(Operator::NewerThan, &lhs, &json!("1 day"), now).unwrap());
    }

    #[test]
    fn comparison_operators_coerce_bool_property_to_int() {
        let lhs = PropertyValue::Bool(true);
        assert!(compare(Operator::Ge, &lhs, &json!(1), 0).unwrap());
    }

    #[test]
    fn unknown_operator_string_is_rejected_by_parse() {
        assert!(Operator::parse("frobnicate").is_none());
    }
}
