//! Format parsers, detection, and the parser registry.
//!
//! Each source format (OpenAPI v3, Swagger v2, Postman collections, and the
//! apifox vendor dialect) gets its own [`ApiParser`] implementation that
//! normalizes into the canonical [`ParsedDocument`]. Detection is structural
//! so `--format auto` works without trusting file extensions.

pub mod apifox;
pub mod openapi_v2;
pub mod openapi_v3;
pub mod postman;

use std::path::Path;
use std::str::FromStr;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::{ParsedDocument, TestCase};
use crate::error::ParseError;
use crate::mockgen::MockDataOptions;

pub use apifox::ApifoxParser;
pub use openapi_v2::OpenApiV2Parser;
pub use openapi_v3::OpenApiV3Parser;
pub use postman::PostmanParser;

/// Source document format, as selected on the command line or detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// OpenAPI 3.x
    OpenApi,
    /// OpenAPI 2.0 (Swagger)
    Swagger,
    Postman,
    Apifox,
    /// Detect from structure.
    Auto,
}

impl Format {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenApi => "openapi",
            Self::Swagger => "swagger",
            Self::Postman => "postman",
            Self::Apifox => "apifox",
            Self::Auto => "auto",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openapi" => Ok(Self::OpenApi),
            "swagger" => Ok(Self::Swagger),
            "postman" => Ok(Self::Postman),
            "apifox" => Ok(Self::Apifox),
            "auto" => Ok(Self::Auto),
            other => Err(ParseError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// A parser for one source format.
pub trait ApiParser {
    fn format(&self) -> Format;

    /// Normalize an already-decoded document into the canonical model.
    fn parse_document(&self, raw: &Value) -> Result<ParsedDocument, ParseError>;

    /// Baseline test cases for every endpoint of a parsed document.
    /// Formats with richer native test metadata may override this.
    fn generate_test_cases(&self, doc: &ParsedDocument) -> Vec<TestCase> {
        let mut rng = SmallRng::from_entropy();
        crate::testcase::synthesize(doc, &MockDataOptions::default(), &mut rng)
    }
}

/// Read a document file and decode it to a raw JSON value.
///
/// `.yaml`/`.yml` decode as YAML, `.json` as JSON; any other extension is
/// sniffed: a leading `{` means JSON, everything else is tried as YAML
/// (JSON is a YAML subset, so YAML is the safe fallback).
pub fn load_document(path: &Path) -> Result<Value, ParseError> {
    let text = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.display().to_string(),
        source,
    })?;
    decode_text(&path.display().to_string(), path.extension().and_then(|e| e.to_str()), &text)
}

fn decode_text(path: &str, extension: Option<&str>, text: &str) -> Result<Value, ParseError> {
    let as_json = |text: &str| {
        serde_json::from_str::<Value>(text).map_err(|e| ParseError::InvalidJson {
            path: path.to_string(),
            message: e.to_string(),
        })
    };
    let as_yaml = |text: &str| {
        serde_yml::from_str::<Value>(text).map_err(|e| ParseError::InvalidYaml {
            path: path.to_string(),
            message: e.to_string(),
        })
    };
    match extension {
        Some("json") => as_json(text),
        Some("yaml") | Some("yml") => as_yaml(text),
        _ => {
            if text.trim_start().starts_with('{') {
                as_json(text)
            } else {
                as_yaml(text)
            }
        }
    }
}

/// Classify a decoded document by structure.
///
/// The vendor-extension check runs before the OpenAPI check: apifox exports
/// are valid OpenAPI 3 documents plus `*Extension` keys, so version sniffing
/// alone would misclassify them.
pub fn detect(raw: &Value) -> Result<Format, ParseError> {
    if raw.get("openapi").is_some() && has_vendor_extensions(raw) {
        return Ok(Format::Apifox);
    }
    if let Some(version) = raw.get("openapi").and_then(Value::as_str) {
        if version.starts_with("3.") {
            return Ok(Format::OpenApi);
        }
    }
    if let Some(version) = raw.get("swagger").and_then(Value::as_str) {
        if version.starts_with("2.") {
            return Ok(Format::Swagger);
        }
    }
    if raw.get("info").is_some() && raw.get("item").is_some() {
        return Ok(Format::Postman);
    }
    Err(ParseError::UnsupportedFormat(
        "unrecognized document structure".to_string(),
    ))
}

fn has_vendor_extensions(raw: &Value) -> bool {
    match raw {
        Value::Object(obj) => obj
            .iter()
            .any(|(key, value)| key.ends_with("Extension") || has_vendor_extensions(value)),
        Value::Array(arr) => arr.iter().any(has_vendor_extensions),
        _ => false,
    }
}

/// Holds the registered parsers. A plain value, so multiple registries with
/// different parser sets can coexist.
pub struct ParserRegistry {
    parsers: Vec<Box<dyn ApiParser>>,
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self {
            parsers: vec![
                Box::new(OpenApiV3Parser),
                Box::new(OpenApiV2Parser),
                Box::new(PostmanParser),
                Box::new(ApifoxParser),
            ],
        }
    }
}

impl ParserRegistry {
    /// Registry with no parsers. Use [`ParserRegistry::default`] for the
    /// full set.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    pub fn register(&mut self, parser: Box<dyn ApiParser>) {
        self.parsers.push(parser);
    }

    #[must_use]
    pub fn get(&self, format: Format) -> Option<&dyn ApiParser> {
        self.parsers
            .iter()
            .find(|p| p.format() == format)
            .map(Box::as_ref)
    }

    /// Detect (if `Auto`) and parse a decoded document.
    pub fn parse(&self, raw: &Value, format: Format) -> Result<ParsedDocument, ParseError> {
        let format = match format {
            Format::Auto => detect(raw)?,
            explicit => explicit,
        };
        let parser = self
            .get(format)
            .ok_or_else(|| ParseError::UnsupportedFormat(format.to_string()))?;
        parser.parse_document(raw)
    }

    /// Load a file from disk, detect its format, and parse it.
    pub fn parse_file(&self, path: &Path, format: Format) -> Result<ParsedDocument, ParseError> {
        let raw = load_document(path)?;
        self.parse(&raw, format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detect_openapi_v3() {
        let raw = json!({"openapi": "3.0.1", "info": {"title": "t"}, "paths": {}});
        assert_eq!(detect(&raw).unwrap(), Format::OpenApi);
    }

    #[test]
    fn detect_swagger_v2() {
        let raw = json!({"swagger": "2.0", "info": {"title": "t"}, "paths": {}});
        assert_eq!(detect(&raw).unwrap(), Format::Swagger);
    }

    #[test]
    fn detect_postman_collection() {
        let raw = json!({"info": {"name": "c"}, "item": []});
        assert_eq!(detect(&raw).unwrap(), Format::Postman);
    }

    #[test]
    fn vendor_extensions_win_over_openapi_version() {
        let raw = json!({
            "openapi": "3.0.0",
            "info": {"title": "t"},
            "paths": {"/a": {"get": {"apiElementExtension": {"folder": "x"}}}}
        });
        assert_eq!(detect(&raw).unwrap(), Format::Apifox);
    }

    #[test]
    fn detect_rejects_unknown_shapes() {
        let raw = json!({"hello": "world"});
        assert!(matches!(
            detect(&raw),
            Err(ParseError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn decode_sniffs_json_without_extension() {
        let value = decode_text("spec", None, r#"{"openapi": "3.0.0"}"#).unwrap();
        assert_eq!(value["openapi"], "3.0.0");
    }

    #[test]
    fn decode_falls_back_to_yaml() {
        let value = decode_text("spec", None, "openapi: 3.0.0\ninfo:\n  title: t\n").unwrap();
        assert_eq!(value["info"]["title"], "t");
    }

    #[test]
    fn decode_reports_invalid_json() {
        let err = decode_text("bad.json", Some("json"), "{not json").unwrap_err();
        assert!(matches!(err, ParseError::InvalidJson { .. }));
    }

    #[test]
    fn format_round_trips_through_str() {
        for format in [
            Format::OpenApi,
            Format::Swagger,
            Format::Postman,
            Format::Apifox,
            Format::Auto,
        ] {
            assert_eq!(format.as_str().parse::<Format>().unwrap(), format);
        }
        assert!("grpc".parse::<Format>().is_err());
    }

    #[test]
    fn registry_dispatches_by_format() {
        let registry = ParserRegistry::default();
        assert!(registry.get(Format::OpenApi).is_some());
        assert!(registry.get(Format::Auto).is_none());

        let raw = json!({
            "openapi": "3.0.0",
            "info": {"title": "t", "version": "1"},
            "paths": {}
        });
        let doc = registry.parse(&raw, Format::Auto).unwrap();
        assert_eq!(doc.title, "t");
    }
}
