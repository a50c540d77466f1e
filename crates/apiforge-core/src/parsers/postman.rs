//! Postman collection parser.
//!
//! Collections carry no schemas, so request and response shapes are inferred
//! structurally from the example bodies they do carry.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::document::{
    Endpoint, Example, ParamLocation, ParamSpec, ParsedDocument, Schema,
};
use crate::error::ParseError;
use crate::parsers::{ApiParser, Format};

pub struct PostmanParser;

impl ApiParser for PostmanParser {
    fn format(&self) -> Format {
        Format::Postman
    }

    fn parse_document(&self, raw: &Value) -> Result<ParsedDocument, ParseError> {
        let info = raw
            .get("info")
            .ok_or_else(|| ParseError::missing("document", "info"))?;
        let items = raw
            .get("item")
            .and_then(Value::as_array)
            .ok_or_else(|| ParseError::missing("document", "item"))?;

        let mut doc = ParsedDocument {
            title: info
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("Untitled Collection")
                .to_string(),
            version: info
                .get("version")
                .and_then(Value::as_str)
                .unwrap_or("1.0.0")
                .to_string(),
            description: info
                .get("description")
                .and_then(Value::as_str)
                .map(String::from),
            ..ParsedDocument::default()
        };

        walk_items(items, &mut doc);
        if doc.base_url.is_none() {
            doc.base_url = first_request(items).and_then(request_origin);
        }
        Ok(doc)
    }
}

/// Depth-first walk: folders hold a nested `item` array, leaves hold a
/// `request`.
fn walk_items(items: &[Value], doc: &mut ParsedDocument) {
    for item in items {
        if let Some(children) = item.get("item").and_then(Value::as_array) {
            walk_items(children, doc);
        } else if item.get("request").is_some() {
            if let Some(endpoint) = parse_item(item) {
                doc.push_endpoint(endpoint);
            }
        }
    }
}

fn first_request(items: &[Value]) -> Option<&Value> {
    for item in items {
        if let Some(children) = item.get("item").and_then(Value::as_array) {
            if let Some(found) = first_request(children) {
                return Some(found);
            }
        } else if let Some(request) = item.get("request") {
            return Some(request);
        }
    }
    None
}

fn parse_item(item: &Value) -> Option<Endpoint> {
    let request = item.get("request")?;
    let method = request
        .get("method")
        .and_then(Value::as_str)
        .unwrap_or("GET")
        .to_uppercase();
    let url = request.get("url")?;
    let path = request_path(url)?;

    let mut endpoint = Endpoint::new(method, path);
    endpoint.summary = item.get("name").and_then(Value::as_str).map(String::from);
    endpoint.description = request
        .get("description")
        .and_then(Value::as_str)
        .map(String::from);

    collect_query_params(url, &mut endpoint);
    collect_path_variables(url, &mut endpoint);
    collect_headers(request, &mut endpoint);

    if let Some(raw_body) = request
        .get("body")
        .and_then(|b| b.get("raw"))
        .and_then(Value::as_str)
    {
        if let Ok(parsed) = serde_json::from_str::<Value>(raw_body) {
            endpoint.request_schema = Some(infer_schema(&parsed));
            endpoint.request_examples.push(Example {
                name: "request".to_string(),
                content_type: Some("application/json".to_string()),
                status_code: None,
                value: parsed,
            });
            endpoint.request_content_type = Some("application/json".to_string());
        }
    }

    if let Some(responses) = item.get("response").and_then(Value::as_array) {
        for response in responses {
            let status = response
                .get("code")
                .and_then(Value::as_u64)
                .unwrap_or(200)
                .to_string();
            let Some(body) = response.get("body").and_then(Value::as_str) else {
                continue;
            };
            let Ok(parsed) = serde_json::from_str::<Value>(body) else {
                continue;
            };
            endpoint
                .response_schemas
                .entry(status.clone())
                .or_insert_with(|| infer_schema(&parsed));
            endpoint.response_examples.push(Example {
                name: response
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or("response")
                    .to_string(),
                content_type: Some("application/json".to_string()),
                status_code: Some(status),
                value: parsed,
            });
        }
    }

    Some(endpoint)
}

/// Path from the parsed `path` array when present, else from the raw URL
/// with the origin stripped. Postman `:var` segments become `{var}`.
fn request_path(url: &Value) -> Option<String> {
    if let Some(segments) = url.get("path").and_then(Value::as_array) {
        let joined: Vec<String> = segments
            .iter()
            .filter_map(Value::as_str)
            .map(|s| match s.strip_prefix(':') {
                Some(name) => format!("{{{name}}}"),
                None => s.to_string(),
            })
            .collect();
        return Some(format!("/{}", joined.join("/")));
    }
    let raw = url.as_str().or_else(|| url.get("raw").and_then(Value::as_str))?;
    let after_scheme = raw.split_once("://").map_or(raw, |(_, rest)| rest);
    let path = after_scheme
        .split_once('/')
        .map_or("/", |(_, p)| p.trim_end_matches('?'));
    let path = path.split('?').next().unwrap_or(path);
    Some(if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    })
}

/// `protocol://host` of a request, used as the collection base URL.
fn request_origin(request: &Value) -> Option<String> {
    let url = request.get("url")?;
    if let Some(host) = url.get("host").and_then(Value::as_array) {
        let host: Vec<&str> = host.iter().filter_map(Value::as_str).collect();
        if host.is_empty() {
            return None;
        }
        let protocol = url
            .get("protocol")
            .and_then(Value::as_str)
            .unwrap_or("https");
        return Some(format!("{protocol}://{}", host.join(".")));
    }
    let raw = url.as_str().or_else(|| url.get("raw").and_then(Value::as_str))?;
    let (scheme, rest) = raw.split_once("://")?;
    let host = rest.split('/').next()?;
    Some(format!("{scheme}://{host}"))
}

fn collect_query_params(url: &Value, endpoint: &mut Endpoint) {
    let Some(query) = url.get("query").and_then(Value::as_array) else {
        return;
    };
    for entry in query {
        let Some(key) = entry.get("key").and_then(Value::as_str) else {
            continue;
        };
        let example = entry.get("value").cloned();
        endpoint
            .parameters
            .entry(ParamLocation::Query)
            .or_default()
            .insert(
                key.to_string(),
                ParamSpec {
                    required: false,
                    schema: Schema::string(),
                    description: entry
                        .get("description")
                        .and_then(Value::as_str)
                        .map(String::from),
                    example,
                },
            );
    }
}

fn collect_path_variables(url: &Value, endpoint: &mut Endpoint) {
    let Some(variables) = url.get("variable").and_then(Value::as_array) else {
        return;
    };
    for entry in variables {
        let Some(key) = entry.get("key").and_then(Value::as_str) else {
            continue;
        };
        endpoint
            .parameters
            .entry(ParamLocation::Path)
            .or_default()
            .insert(
                key.to_string(),
                ParamSpec {
                    required: true,
                    schema: Schema::string(),
                    description: None,
                    example: entry.get("value").cloned(),
                },
            );
    }
}

fn collect_headers(request: &Value, endpoint: &mut Endpoint) {
    let Some(headers) = request.get("header").and_then(Value::as_array) else {
        return;
    };
    for entry in headers {
        let Some(key) = entry.get("key").and_then(Value::as_str) else {
            continue;
        };
        endpoint
            .parameters
            .entry(ParamLocation::Header)
            .or_default()
            .insert(
                key.to_string(),
                ParamSpec {
                    required: false,
                    schema: Schema::string(),
                    description: None,
                    example: entry.get("value").cloned(),
                },
            );
    }
}

/// Structural schema inference over an example value. Object keys become
/// properties, the array element type comes from the first element, and
/// scalars keep their original value as the schema example.
pub fn infer_schema(value: &Value) -> Schema {
    match value {
        Value::Object(map) => {
            let mut properties = BTreeMap::new();
            for (key, entry) in map {
                properties.insert(key.clone(), infer_schema(entry));
            }
            Schema::Object {
                required: properties.keys().cloned().collect(),
                properties,
                title: None,
                example: None,
            }
        }
        Value::Array(arr) => Schema::Array {
            items: Box::new(arr.first().map_or_else(Schema::string, infer_schema)),
            min_items: None,
            max_items: None,
            example: None,
        },
        Value::String(_) => Schema::String {
            format: None,
            title: None,
            enum_values: None,
            example: Some(value.clone()),
        },
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                Schema::Integer {
                    minimum: None,
                    maximum: None,
                    example: Some(value.clone()),
                }
            } else {
                Schema::Number {
                    minimum: None,
                    maximum: None,
                    example: Some(value.clone()),
                }
            }
        }
        Value::Bool(_) => Schema::Boolean {
            example: Some(value.clone()),
        },
        Value::Null => Schema::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collection() -> Value {
        json!({
            "info": {"name": "Pets", "schema":
                "https://schema.getpostman.com/json/collection/v2.1.0/collection.json"},
            "item": [
                {"name": "Admin", "item": [
                    {"name": "Get pet", "request": {
                        "method": "GET",
                        "url": {
                            "raw": "https://api.example.com/pets/1?verbose=true",
                            "protocol": "https",
                            "host": ["api", "example", "com"],
                            "path": ["pets", ":id"],
                            "query": [{"key": "verbose", "value": "true"}],
                            "variable": [{"key": "id", "value": "1"}]
                        }
                    },
                    "response": [{
                        "name": "ok", "code": 200,
                        "body": "{\"id\": 1, \"name\": \"Rex\", \"tags\": [\"dog\"]}"
                    }]}
                ]},
                {"name": "Create pet", "request": {
                    "method": "POST",
                    "url": {"raw": "https://api.example.com/pets",
                            "host": ["api", "example", "com"],
                            "path": ["pets"]},
                    "body": {"mode": "raw", "raw": "{\"name\": \"Rex\"}"}
                }}
            ]
        })
    }

    #[test]
    fn nested_folders_flatten_to_endpoints() {
        let doc = PostmanParser.parse_document(&collection()).unwrap();
        assert_eq!(doc.title, "Pets");
        assert_eq!(doc.endpoints.len(), 2);
        assert_eq!(doc.endpoints[0].label(), "GET /pets/{id}");
        assert_eq!(doc.endpoints[1].label(), "POST /pets");
    }

    #[test]
    fn base_url_from_first_request() {
        let doc = PostmanParser.parse_document(&collection()).unwrap();
        assert_eq!(doc.base_url.as_deref(), Some("https://api.example.com"));
    }

    #[test]
    fn query_and_path_parameters_collected() {
        let doc = PostmanParser.parse_document(&collection()).unwrap();
        let get = &doc.endpoints[0];
        assert!(get.parameters[&ParamLocation::Query].contains_key("verbose"));
        let id = &get.parameters[&ParamLocation::Path]["id"];
        assert!(id.required);
        assert_eq!(id.example, Some(json!("1")));
    }

    #[test]
    fn response_schema_inferred_from_body() {
        let doc = PostmanParser.parse_document(&collection()).unwrap();
        let get = &doc.endpoints[0];
        match &get.response_schemas["200"] {
            Schema::Object { properties, .. } => {
                assert!(matches!(properties["id"], Schema::Integer { .. }));
                assert!(matches!(properties["name"], Schema::String { .. }));
                match &properties["tags"] {
                    Schema::Array { items, .. } => {
                        assert!(matches!(**items, Schema::String { .. }));
                    }
                    other => panic!("expected array, got {other:?}"),
                }
            }
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn request_body_inferred_and_kept_as_example() {
        let doc = PostmanParser.parse_document(&collection()).unwrap();
        let post = &doc.endpoints[1];
        assert!(matches!(post.request_schema, Some(Schema::Object { .. })));
        assert_eq!(post.request_examples[0].value, json!({"name": "Rex"}));
    }

    #[test]
    fn infer_scalars_by_json_type() {
        assert!(matches!(infer_schema(&json!(1.5)), Schema::Number { .. }));
        assert!(matches!(infer_schema(&json!(true)), Schema::Boolean { .. }));
        assert_eq!(infer_schema(&json!(null)), Schema::Null);
    }
}
