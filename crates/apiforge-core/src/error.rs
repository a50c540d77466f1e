//! Error taxonomy for document loading and parsing.
//!
//! Only document-level problems are fatal. Dangling refs, cycles, and
//! unrecognized generation inputs degrade to defaults and never surface
//! here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Detector could not classify the document, or no parser is registered
    /// for the requested format.
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("{path}: invalid JSON: {message}")]
    InvalidJson { path: String, message: String },

    #[error("{path}: invalid YAML: {message}")]
    InvalidYaml { path: String, message: String },

    /// A required field check failed (e.g. missing `openapi`/`swagger`
    /// version discriminator).
    #[error("{path}: missing or invalid field '{field}'")]
    MissingField { path: String, field: String },
}

impl ParseError {
    pub(crate) fn missing(path: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            path: path.into(),
            field: field.into(),
        }
    }
}
