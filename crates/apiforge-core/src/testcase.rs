//! Baseline test case synthesis: one case per endpoint, asserting the
//! declared success status and whatever the document promises about the
//! response body.

use rand::Rng;

use serde_json::Value;

use crate::document::{
    AssertOp, Assertion, Endpoint, ParsedDocument, TestCase,
};
use crate::mockgen::{MockDataOptions, schema_gen};

/// One baseline test case per endpoint of the document.
pub fn synthesize(
    doc: &ParsedDocument,
    options: &MockDataOptions,
    rng: &mut impl Rng,
) -> Vec<TestCase> {
    doc.endpoints
        .iter()
        .map(|endpoint| case_for(endpoint, options, rng))
        .collect()
}

/// Fill `endpoint.test_cases` in place for every endpoint.
pub fn populate(doc: &mut ParsedDocument, options: &MockDataOptions, rng: &mut impl Rng) {
    for endpoint in &mut doc.endpoints {
        let case = case_for(endpoint, options, rng);
        endpoint.test_cases = vec![case];
    }
}

fn case_for(endpoint: &Endpoint, options: &MockDataOptions, rng: &mut impl Rng) -> TestCase {
    let status = expected_status(endpoint);
    let mut assertions = vec![Assertion::status(AssertOp::Eq, status)];

    // Body assertions only from an example for the expected status (or one
    // carrying no status at all); an example for some other status says
    // nothing about the success body.
    let status_key = status.to_string();
    let example = endpoint
        .response_examples
        .iter()
        .find(|e| e.status_code.as_deref() == Some(&status_key))
        .or_else(|| {
            endpoint
                .response_examples
                .iter()
                .find(|e| e.status_code.is_none())
        });
    if let Some(example) = example {
        assertions.extend(body_assertions(&example.value));
    } else if let Some(schema) = endpoint.response_schemas.get(&status_key) {
        assertions.push(Assertion::schema(schema.to_json_schema()));
    }

    let mut headers = std::collections::BTreeMap::new();
    let body = request_body(endpoint, options, rng);
    if body.is_some() {
        headers.insert(
            "Content-Type".to_string(),
            endpoint
                .request_content_type
                .clone()
                .unwrap_or_else(|| "application/json".to_string()),
        );
    }

    TestCase {
        id: slug(&endpoint.label()),
        description: endpoint
            .summary
            .clone()
            .unwrap_or_else(|| format!("Baseline check for {}", endpoint.label())),
        endpoint: endpoint.path.clone(),
        method: endpoint.method.clone(),
        headers,
        body,
        assertions,
    }
}

/// First declared 2xx status; falling back to the method's conventional
/// success code.
fn expected_status(endpoint: &Endpoint) -> u16 {
    let declared = endpoint
        .response_schemas
        .keys()
        .chain(endpoint.response_examples.iter().filter_map(|e| e.status_code.as_ref()))
        .filter_map(|s| s.parse::<u16>().ok())
        .find(|code| (200..300).contains(code));
    declared.unwrap_or(match endpoint.method.as_str() {
        "POST" => 201,
        "DELETE" => 204,
        _ => 200,
    })
}

/// Mutating methods get a body when the document declares one: the first
/// request example verbatim, else a schema-directed mock.
fn request_body(
    endpoint: &Endpoint,
    options: &MockDataOptions,
    rng: &mut impl Rng,
) -> Option<Value> {
    if !matches!(endpoint.method.as_str(), "POST" | "PUT" | "PATCH") {
        return None;
    }
    if let Some(example) = endpoint.request_examples.first() {
        return Some(example.value.clone());
    }
    endpoint
        .request_schema
        .as_ref()
        .map(|schema| schema_gen::generate(schema, options, rng))
}

/// One assertion per top-level scalar key of an example body: `contains`
/// for strings (tolerates server-side decoration), `=` otherwise.
fn body_assertions(example: &Value) -> Vec<Assertion> {
    let Some(obj) = example.as_object() else {
        return Vec::new();
    };
    obj.iter()
        .filter_map(|(key, value)| match value {
            Value::String(_) => Some(Assertion::body(key, AssertOp::Contains, value.clone())),
            Value::Number(_) | Value::Bool(_) => {
                Some(Assertion::body(key, AssertOp::Eq, value.clone()))
            }
            _ => None,
        })
        .collect()
}

/// Lowercase, non-alphanumerics collapsed to single dashes.
fn slug(input: &str) -> String {
    let mut out = String::new();
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    out.trim_end_matches('-').to_string()
}
