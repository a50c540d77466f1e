//! Apifox vendor dialect parser.
//!
//! Apifox exports are OpenAPI 3 documents with extra `*Extension` keys at
//! every level (document, operation, content, response, schema). Stripping
//! those in memory yields a plain v3 document, which the v3 parser handles.

use serde_json::Value;

use crate::document::ParsedDocument;
use crate::error::ParseError;
use crate::parsers::{ApiParser, Format, OpenApiV3Parser};

pub struct ApifoxParser;

impl ApiParser for ApifoxParser {
    fn format(&self) -> Format {
        Format::Apifox
    }

    fn parse_document(&self, raw: &Value) -> Result<ParsedDocument, ParseError> {
        let stripped = strip_extensions(raw);
        OpenApiV3Parser.parse_document(&stripped)
    }
}

/// Recursively drop every object key ending in `Extension`.
fn strip_extensions(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, _)| !key.ends_with("Extension"))
                .map(|(key, entry)| (key.clone(), strip_extensions(entry)))
                .collect(),
        ),
        Value::Array(arr) => Value::Array(arr.iter().map(strip_extensions).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_extension_keys_at_every_level() {
        let raw = json!({
            "openapi": "3.0.0",
            "apifoxExtension": {"project": 42},
            "info": {"title": "t", "version": "1"},
            "paths": {"/a": {"get": {
                "operationExtension": {"folder": "x"},
                "responses": {"200": {
                    "description": "ok",
                    "responseExtension": {"id": 1},
                    "content": {"application/json": {
                        "schema": {
                            "type": "object",
                            "schemaExtension": {"orders": [1]},
                            "properties": {"id": {"type": "integer"}}
                        }
                    }}
                }}
            }}}
        });
        let stripped = strip_extensions(&raw);
        assert!(stripped.get("apifoxExtension").is_none());
        assert!(stripped["paths"]["/a"]["get"].get("operationExtension").is_none());
        let schema = &stripped["paths"]["/a"]["get"]["responses"]["200"]["content"]
            ["application/json"]["schema"];
        assert!(schema.get("schemaExtension").is_none());
        assert_eq!(schema["properties"]["id"]["type"], "integer");
    }

    #[test]
    fn delegates_to_v3_after_stripping() {
        let raw = json!({
            "openapi": "3.1.0",
            "documentExtension": {"exportedAt": "2024-01-01"},
            "info": {"title": "Vendor", "version": "1.0"},
            "paths": {"/ping": {"get": {
                "pingExtension": true,
                "responses": {"200": {"description": "ok"}}
            }}}
        });
        let doc = ApifoxParser.parse_document(&raw).unwrap();
        assert_eq!(doc.title, "Vendor");
        assert_eq!(doc.endpoints.len(), 1);
        assert_eq!(doc.endpoints[0].label(), "GET /ping");
    }
}
