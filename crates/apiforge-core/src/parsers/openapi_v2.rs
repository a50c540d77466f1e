//! OpenAPI 2.0 (Swagger) parser.

use serde_json::Value;

use crate::document::{Endpoint, Example, ParamLocation, ParamSpec, ParsedDocument, Schema};
use crate::error::ParseError;
use crate::parsers::{ApiParser, Format};
use crate::resolve::resolve;

const METHODS: [&str; 7] = ["get", "post", "put", "delete", "patch", "head", "options"];

pub struct OpenApiV2Parser;

impl ApiParser for OpenApiV2Parser {
    fn format(&self) -> Format {
        Format::Swagger
    }

    fn parse_document(&self, raw: &Value) -> Result<ParsedDocument, ParseError> {
        raw.get("swagger")
            .and_then(Value::as_str)
            .filter(|v| v.starts_with("2."))
            .ok_or_else(|| ParseError::missing("document", "swagger"))?;

        let info = raw.get("info").cloned().unwrap_or_default();
        let mut doc = ParsedDocument {
            title: info
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or("Untitled API")
                .to_string(),
            version: info
                .get("version")
                .and_then(Value::as_str)
                .unwrap_or("0.0.0")
                .to_string(),
            description: info
                .get("description")
                .and_then(Value::as_str)
                .map(String::from),
            base_url: base_url(raw),
            ..ParsedDocument::default()
        };

        if let Some(paths) = raw.get("paths").and_then(Value::as_object) {
            for (path, item) in paths {
                for method in METHODS {
                    if let Some(op) = item.get(method) {
                        doc.push_endpoint(parse_operation(method, path, op, raw));
                    }
                }
            }
        }

        if let Some(definitions) = raw.get("definitions").and_then(Value::as_object) {
            for (name, node) in definitions {
                doc.schemas.insert(name.clone(), resolve(node, raw));
            }
        }

        Ok(doc)
    }
}

/// `schemes[0]://host + basePath`. No `host` means no base URL.
fn base_url(raw: &Value) -> Option<String> {
    let host = raw.get("host")?.as_str()?;
    let scheme = raw
        .get("schemes")
        .and_then(Value::as_array)
        .and_then(|s| s.first())
        .and_then(Value::as_str)
        .unwrap_or("https");
    let base_path = raw
        .get("basePath")
        .and_then(Value::as_str)
        .unwrap_or("");
    Some(format!("{scheme}://{host}{base_path}"))
}

fn parse_operation(method: &str, path: &str, op: &Value, root: &Value) -> Endpoint {
    let mut endpoint = Endpoint::new(method.to_uppercase(), path);
    endpoint.summary = op.get("summary").and_then(Value::as_str).map(String::from);
    endpoint.description = op
        .get("description")
        .and_then(Value::as_str)
        .map(String::from);

    if let Some(params) = op.get("parameters").and_then(Value::as_array) {
        for param in params {
            add_parameter(&mut endpoint, param, op, root);
        }
    }

    if let Some(responses) = op.get("responses").and_then(Value::as_object) {
        for (status, response) in responses {
            if let Some(schema) = response.get("schema") {
                endpoint
                    .response_schemas
                    .insert(status.clone(), resolve(schema, root));
            }
            // v2 response examples are a media-type map.
            if let Some(examples) = response.get("examples").and_then(Value::as_object) {
                for (content_type, value) in examples {
                    endpoint.response_examples.push(Example {
                        name: "example".to_string(),
                        content_type: Some(content_type.clone()),
                        status_code: Some(status.clone()),
                        value: value.clone(),
                    });
                }
            }
        }
    }

    endpoint
}

fn add_parameter(endpoint: &mut Endpoint, param: &Value, op: &Value, root: &Value) {
    let Some(name) = param.get("name").and_then(Value::as_str) else {
        return;
    };
    let location = match param.get("in").and_then(Value::as_str) {
        // The body parameter carries the request schema instead.
        Some("body") => {
            endpoint.request_schema = param.get("schema").map(|s| resolve(s, root));
            endpoint.request_content_type = op
                .get("consumes")
                .and_then(Value::as_array)
                .and_then(|c| c.first())
                .and_then(Value::as_str)
                .map(String::from)
                .or_else(|| Some("application/json".to_string()));
            return;
        }
        Some("path") => ParamLocation::Path,
        Some("query") => ParamLocation::Query,
        Some("header") => ParamLocation::Header,
        _ => return,
    };

    // v2 inlines type/format on the parameter itself.
    let schema = param
        .get("schema")
        .map(|s| resolve(s, root))
        .unwrap_or_else(|| resolve(param, root));
    let schema = match schema {
        Schema::Object { ref properties, .. } if properties.is_empty() => Schema::string(),
        other => other,
    };
    endpoint.parameters.entry(location).or_default().insert(
        name.to_string(),
        ParamSpec {
            required: param
                .get("required")
                .and_then(Value::as_bool)
                .unwrap_or(location == ParamLocation::Path),
            schema,
            description: param
                .get("description")
                .and_then(Value::as_str)
                .map(String::from),
            example: param.get("example").cloned(),
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn swagger_doc() -> Value {
        json!({
            "swagger": "2.0",
            "info": {"title": "Legacy", "version": "2.1"},
            "host": "api.example.com",
            "basePath": "/v2",
            "schemes": ["http"],
            "paths": {
                "/users": {
                    "post": {
                        "consumes": ["application/json"],
                        "parameters": [
                            {"name": "payload", "in": "body",
                             "schema": {"$ref": "#/definitions/User"}},
                            {"name": "dryRun", "in": "query", "type": "boolean"}
                        ],
                        "responses": {
                            "201": {
                                "schema": {"$ref": "#/definitions/User"},
                                "examples": {"application/json": {"id": 7, "name": "Ada"}}
                            }
                        }
                    }
                }
            },
            "definitions": {"User": {
                "type": "object",
                "properties": {"id": {"type": "integer"}, "name": {"type": "string"}},
                "required": ["id"]
            }}
        })
    }

    #[test]
    fn base_url_from_scheme_host_basepath() {
        let doc = OpenApiV2Parser.parse_document(&swagger_doc()).unwrap();
        assert_eq!(doc.base_url.as_deref(), Some("http://api.example.com/v2"));
    }

    #[test]
    fn body_parameter_becomes_request_schema() {
        let doc = OpenApiV2Parser.parse_document(&swagger_doc()).unwrap();
        let post = &doc.endpoints[0];
        assert_eq!(post.method, "POST");
        let schema = post.request_schema.as_ref().unwrap();
        assert!(!schema.contains_ref());
        assert_eq!(
            post.request_content_type.as_deref(),
            Some("application/json")
        );
        // The body parameter must not also appear as a regular parameter.
        assert!(post.parameters.get(&ParamLocation::Query).is_some());
        assert_eq!(post.parameters.len(), 1);
    }

    #[test]
    fn inline_typed_parameter_resolves() {
        let doc = OpenApiV2Parser.parse_document(&swagger_doc()).unwrap();
        let query = &doc.endpoints[0].parameters[&ParamLocation::Query];
        assert!(matches!(query["dryRun"].schema, Schema::Boolean { .. }));
    }

    #[test]
    fn response_examples_carry_status_and_media_type() {
        let doc = OpenApiV2Parser.parse_document(&swagger_doc()).unwrap();
        let examples = &doc.endpoints[0].response_examples;
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].status_code.as_deref(), Some("201"));
        assert_eq!(examples[0].value["name"], "Ada");
    }

    #[test]
    fn non_swagger_document_rejected() {
        let raw = json!({"openapi": "3.0.0"});
        assert!(OpenApiV2Parser.parse_document(&raw).is_err());
    }
}
