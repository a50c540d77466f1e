//! Assertion evaluation. `evaluate` is total: every malformed input (missing
//! header, bad dot path, invalid regex, non-numeric comparison) becomes a
//! failed outcome with a message, never a panic or an error.

use std::collections::BTreeMap;

use serde_json::{Value, json};

use crate::document::{AssertOp, Assertion, AssertionKind};

/// The response shape assertions run against. Execution layers fill this
/// from a live response or a mock.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct HttpResponse {
    pub status: u16,
    #[serde(default)]
    pub status_text: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Value,
}

/// Result of one assertion.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AssertionOutcome {
    pub passed: bool,
    pub message: String,
}

impl AssertionOutcome {
    fn pass(message: String) -> Self {
        Self {
            passed: true,
            message,
        }
    }

    fn fail(message: String) -> Self {
        Self {
            passed: false,
            message,
        }
    }
}

/// Evaluate one assertion against a response. Never panics.
#[must_use]
pub fn evaluate(assertion: &Assertion, response: &HttpResponse) -> AssertionOutcome {
    match assertion.kind {
        AssertionKind::Status => {
            let actual = json!(response.status);
            verdict("status", &actual, assertion, true)
        }
        AssertionKind::Header => {
            let wanted = assertion.target.to_lowercase();
            let found = response
                .headers
                .iter()
                .find(|(name, _)| name.to_lowercase() == wanted)
                .map(|(_, value)| value.clone());
            match found {
                Some(actual) => verdict(
                    &format!("header '{}'", assertion.target),
                    &Value::String(actual),
                    assertion,
                    true,
                ),
                None => AssertionOutcome::fail(format!(
                    "header '{}' not present",
                    assertion.target
                )),
            }
        }
        AssertionKind::Body => match dig(&response.body, &assertion.target) {
            Some(actual) => verdict(
                &format!("body.{}", assertion.target),
                actual,
                assertion,
                false,
            ),
            None => AssertionOutcome::fail(format!(
                "body path not found: '{}'",
                assertion.target
            )),
        },
        AssertionKind::Schema => match jsonschema::validator_for(&assertion.value) {
            Ok(validator) => match validator.validate(&response.body) {
                Ok(()) => AssertionOutcome::pass("body matches schema".to_string()),
                Err(error) => {
                    AssertionOutcome::fail(format!("body does not match schema: {error}"))
                }
            },
            Err(error) => AssertionOutcome::fail(format!("invalid schema: {error}")),
        },
    }
}

fn verdict(
    subject: &str,
    actual: &Value,
    assertion: &Assertion,
    numeric_strings: bool,
) -> AssertionOutcome {
    match compare(assertion.operator, actual, &assertion.value, numeric_strings) {
        Ok(true) => AssertionOutcome::pass(format!(
            "{subject} {} {}",
            assertion.operator, assertion.value
        )),
        Ok(false) => AssertionOutcome::fail(format!(
            "expected {subject} {} {}, got {actual}",
            assertion.operator, assertion.value
        )),
        Err(message) => AssertionOutcome::fail(format!("{subject}: {message}")),
    }
}

fn compare(
    op: AssertOp,
    actual: &Value,
    expected: &Value,
    numeric_strings: bool,
) -> Result<bool, String> {
    match op {
        AssertOp::Eq => Ok(deep_eq(actual, expected, numeric_strings)),
        AssertOp::Ne => Ok(!deep_eq(actual, expected, numeric_strings)),
        AssertOp::Gt | AssertOp::Lt => {
            let a = as_number(actual).ok_or_else(|| format!("'{actual}' is not numeric"))?;
            let e = as_number(expected).ok_or_else(|| format!("'{expected}' is not numeric"))?;
            Ok(if op == AssertOp::Gt { a > e } else { a < e })
        }
        AssertOp::Contains => {
            let haystack = text_form(actual);
            let needle = text_form(expected);
            Ok(haystack.contains(&needle))
        }
        AssertOp::Matches => {
            let pattern = expected
                .as_str()
                .ok_or_else(|| "matches needs a string pattern".to_string())?;
            let re = regex::Regex::new(pattern)
                .map_err(|e| format!("invalid pattern '{pattern}': {e}"))?;
            Ok(re.is_match(&text_form(actual)))
        }
    }
}

/// Structural equality, with cross-representation numbers (1 vs 1.0)
/// compared by value. With `numeric_strings`, strings parse as numbers too
/// ("200" equals 200); body values keep strings as strings, so "1e3" stays
/// distinct from "1000". Object key order never matters: `serde_json::Map`
/// equality is key-wise.
fn deep_eq(actual: &Value, expected: &Value, numeric_strings: bool) -> bool {
    let numeric: fn(&Value) -> Option<f64> = if numeric_strings {
        as_number
    } else {
        plain_number
    };
    match (numeric(actual), numeric(expected)) {
        (Some(a), Some(e)) => (a - e).abs() < f64::EPSILON,
        _ => actual == expected,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        // Headers arrive as strings; "200" compares numerically.
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn plain_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// String form for contains/matches: raw for strings, JSON text otherwise.
fn text_form(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Dot-path traversal into a body. Numeric segments index arrays. An empty
/// path addresses the whole body.
fn dig<'a>(body: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(body);
    }
    let mut current = body;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(arr) => arr.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}
