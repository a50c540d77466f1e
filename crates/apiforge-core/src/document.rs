//! Canonical document model — the format-agnostic representation every
//! parser produces and every downstream stage consumes.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A normalized API description, independent of the source format.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ParsedDocument {
    pub title: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
    /// Named schemas from the source document (resolved, for reference output).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub schemas: BTreeMap<String, Schema>,
}

impl ParsedDocument {
    /// Add an endpoint, keeping the `(path, method)` pair unique.
    /// First occurrence wins; later duplicates are dropped.
    pub fn push_endpoint(&mut self, endpoint: Endpoint) {
        let exists = self
            .endpoints
            .iter()
            .any(|e| e.path == endpoint.path && e.method == endpoint.method);
        if !exists {
            self.endpoints.push(endpoint);
        }
    }
}

/// One operation discovered in the source document.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Endpoint {
    pub path: String,
    /// Uppercase HTTP method ("GET", "POST", ...)
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Parameters grouped by location, then by name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<ParamLocation, BTreeMap<String, ParamSpec>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_schema: Option<Schema>,
    /// Media type the request body was declared under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_content_type: Option<String>,
    /// Response schemas keyed by status code string or "default".
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub response_schemas: BTreeMap<String, Schema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub request_examples: Vec<Example>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub response_examples: Vec<Example>,
    /// Populated by the test case synthesizer, in place.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub test_cases: Vec<TestCase>,
}

impl Endpoint {
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: method.into(),
            summary: None,
            description: None,
            parameters: BTreeMap::new(),
            request_schema: None,
            request_content_type: None,
            response_schemas: BTreeMap::new(),
            request_examples: Vec::new(),
            response_examples: Vec::new(),
            test_cases: Vec::new(),
        }
    }

    /// Operation label, e.g. "GET /pets/{id}".
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// Where a parameter lives in the request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Cookie,
}

/// A declared request parameter.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ParamSpec {
    #[serde(default)]
    pub required: bool,
    pub schema: Schema,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

/// A concrete example payload plus provenance metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Example {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<String>,
    pub value: Value,
}

/// Closed schema variant. After resolution, no `Ref` remains reachable from
/// a `ParsedDocument`'s endpoints; dangling refs degrade to an empty
/// `Object` rather than failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Schema {
    Object {
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        properties: BTreeMap<String, Schema>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        required: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        example: Option<Value>,
    },
    Array {
        items: Box<Schema>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_items: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_items: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        example: Option<Value>,
    },
    String {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
        enum_values: Option<Vec<Value>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        example: Option<Value>,
    },
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        maximum: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        example: Option<Value>,
    },
    Integer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        maximum: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        example: Option<Value>,
    },
    Boolean {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        example: Option<Value>,
    },
    Null,
    /// Unresolved `$ref` pointer. Only exists between parsing and resolution.
    Ref { pointer: String },
}

impl Schema {
    /// Empty object schema — the degraded form for dangling refs and cycles.
    #[must_use]
    pub fn empty_object() -> Self {
        Self::Object {
            properties: BTreeMap::new(),
            required: Vec::new(),
            title: None,
            example: None,
        }
    }

    #[must_use]
    pub fn string() -> Self {
        Self::String {
            format: None,
            title: None,
            enum_values: None,
            example: None,
        }
    }

    /// Example value carried by the schema, if any.
    #[must_use]
    pub fn example(&self) -> Option<&Value> {
        match self {
            Self::Object { example, .. }
            | Self::Array { example, .. }
            | Self::String { example, .. }
            | Self::Number { example, .. }
            | Self::Integer { example, .. }
            | Self::Boolean { example } => example.as_ref(),
            Self::Null | Self::Ref { .. } => None,
        }
    }

    /// Declared title, if any.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        match self {
            Self::Object { title, .. } | Self::String { title, .. } => title.as_deref(),
            _ => None,
        }
    }

    /// True if any `Ref` variant is reachable from this schema.
    #[must_use]
    pub fn contains_ref(&self) -> bool {
        match self {
            Self::Ref { .. } => true,
            Self::Object { properties, .. } => properties.values().any(Schema::contains_ref),
            Self::Array { items, .. } => items.contains_ref(),
            _ => false,
        }
    }

    /// Render as a plain JSON Schema value, suitable for the `jsonschema`
    /// validator. `Ref` renders as an empty (accept-anything) schema since a
    /// resolved document should not contain one.
    #[must_use]
    pub fn to_json_schema(&self) -> Value {
        match self {
            Self::Object {
                properties,
                required,
                ..
            } => {
                let mut obj = serde_json::Map::new();
                obj.insert("type".into(), Value::String("object".into()));
                if !properties.is_empty() {
                    let props: serde_json::Map<String, Value> = properties
                        .iter()
                        .map(|(k, v)| (k.clone(), v.to_json_schema()))
                        .collect();
                    obj.insert("properties".into(), Value::Object(props));
                }
                if !required.is_empty() {
                    obj.insert(
                        "required".into(),
                        Value::Array(
                            required.iter().map(|r| Value::String(r.clone())).collect(),
                        ),
                    );
                }
                Value::Object(obj)
            }
            Self::Array { items, .. } => serde_json::json!({
                "type": "array",
                "items": items.to_json_schema(),
            }),
            Self::String {
                format,
                enum_values,
                ..
            } => {
                let mut obj = serde_json::Map::new();
                obj.insert("type".into(), Value::String("string".into()));
                if let Some(f) = format {
                    obj.insert("format".into(), Value::String(f.clone()));
                }
                if let Some(ev) = enum_values {
                    obj.insert("enum".into(), Value::Array(ev.clone()));
                }
                Value::Object(obj)
            }
            Self::Number { minimum, maximum, .. } => {
                let mut obj = serde_json::Map::new();
                obj.insert("type".into(), Value::String("number".into()));
                if let Some(min) = minimum {
                    obj.insert("minimum".into(), serde_json::json!(min));
                }
                if let Some(max) = maximum {
                    obj.insert("maximum".into(), serde_json::json!(max));
                }
                Value::Object(obj)
            }
            Self::Integer { minimum, maximum, .. } => {
                let mut obj = serde_json::Map::new();
                obj.insert("type".into(), Value::String("integer".into()));
                if let Some(min) = minimum {
                    obj.insert("minimum".into(), serde_json::json!(min));
                }
                if let Some(max) = maximum {
                    obj.insert("maximum".into(), serde_json::json!(max));
                }
                Value::Object(obj)
            }
            Self::Boolean { .. } => serde_json::json!({"type": "boolean"}),
            Self::Null => serde_json::json!({"type": "null"}),
            Self::Ref { .. } => serde_json::json!({}),
        }
    }
}

/// A synthesized request plus its expected outcomes.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TestCase {
    pub id: String,
    pub description: String,
    /// Request path (may contain `{param}` templates).
    pub endpoint: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    pub assertions: Vec<Assertion>,
}

/// What part of the response an assertion inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AssertionKind {
    Status,
    Header,
    Body,
    /// Structural validation of the whole body against a carried schema.
    Schema,
}

/// Comparison operator applied between the extracted actual and the
/// assertion's expected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum AssertOp {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "matches")]
    Matches,
}

impl std::fmt::Display for AssertOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Contains => "contains",
            Self::Matches => "matches",
        };
        f.write_str(s)
    }
}

/// A typed check evaluated against an actual response.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Assertion {
    pub kind: AssertionKind,
    /// Header name or dot path into the body; empty for status/schema.
    #[serde(default)]
    pub target: String,
    pub operator: AssertOp,
    pub value: Value,
}

impl Assertion {
    #[must_use]
    pub fn status(operator: AssertOp, code: u16) -> Self {
        Self {
            kind: AssertionKind::Status,
            target: String::new(),
            operator,
            value: Value::Number(code.into()),
        }
    }

    #[must_use]
    pub fn body(target: impl Into<String>, operator: AssertOp, value: Value) -> Self {
        Self {
            kind: AssertionKind::Body,
            target: target.into(),
            operator,
            value,
        }
    }

    #[must_use]
    pub fn header(name: impl Into<String>, operator: AssertOp, value: Value) -> Self {
        Self {
            kind: AssertionKind::Header,
            target: name.into(),
            operator,
            value,
        }
    }

    /// Schema assertion carrying a plain JSON Schema value.
    #[must_use]
    pub fn schema(json_schema: Value) -> Self {
        Self {
            kind: AssertionKind::Schema,
            target: String::new(),
            operator: AssertOp::Eq,
            value: json_schema,
        }
    }
}
