//! Project configuration for parsing and running API test suites

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::parsers::Format;

/// Project configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API document path (local file)
    pub spec: PathBuf,

    /// Source format; `auto` detects from structure
    #[serde(default = "default_format")]
    pub format: Format,

    /// Base URL of the server to test; overrides the document's `servers`
    #[serde(default)]
    pub base_url: Option<String>,

    /// HTTP headers (Auth, API keys, etc.)
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Path parameters (entity IDs, etc.)
    #[serde(default)]
    pub path_params: HashMap<String, String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Pause between test cases in milliseconds
    #[serde(default)]
    pub settle_delay_ms: u64,

    /// Emit document-carried examples verbatim instead of generating
    #[serde(default = "default_true")]
    pub use_examples: bool,

    /// Word-list locale for generated values ("en", "zh")
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Fixed mock values keyed by field name
    #[serde(default)]
    pub templates: HashMap<String, serde_json::Value>,
}

fn default_format() -> Format {
    Format::Auto
}

fn default_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_locale() -> String {
    "en".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spec: PathBuf::from("openapi.yaml"),
            format: Format::Auto,
            base_url: None,
            headers: HashMap::new(),
            path_params: HashMap::new(),
            timeout_secs: 30,
            settle_delay_ms: 0,
            use_examples: true,
            locale: "en".to_string(),
            templates: HashMap::new(),
        }
    }
}

impl Config {
    /// Load config from file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        }
    }

    /// Load from default location (.apiforge.toml)
    pub fn load_default() -> Result<Self, ConfigError> {
        let candidates = [".apiforge.toml", ".apiforge.json", "apiforge.toml"];

        for name in candidates {
            let path = Path::new(name);
            if path.exists() {
                return Self::load(path);
            }
        }

        // No config file, return default
        Ok(Self::default())
    }

    /// Mock data options derived from this config.
    #[must_use]
    pub fn mock_options(&self) -> crate::mockgen::MockDataOptions {
        let mut options = crate::mockgen::MockDataOptions::new()
            .with_examples(self.use_examples)
            .with_locale(crate::mockgen::Locale::parse(&self.locale));
        for (field, value) in &self.templates {
            options = options.with_template(field.clone(), value.clone());
        }
        options
    }

    /// Create example config file
    pub fn example() -> &'static str {
        r#"# apiforge configuration

# API document (OpenAPI v2/v3, Postman collection, or apifox export)
spec = "openapi.yaml"

# Source format: "auto", "openapi", "swagger", "postman", "apifox"
format = "auto"

# Server to test (overrides the document's own servers)
# base_url = "http://localhost:8080"

# Per-request timeout in seconds
timeout_secs = 30

# Pause between test cases in milliseconds
# settle_delay_ms = 100

# Use document-carried examples verbatim instead of generating
use_examples = true

# Word-list locale for generated values: "en" or "zh"
locale = "en"

# HTTP headers (auth, api keys)
[headers]
Authorization = "Bearer your-token-here"
# X-API-Key = "your-api-key"

# Path parameters (entity IDs for testing)
[path_params]
id = "1"
# user_id = "100"

# Fixed mock values by field name
[templates]
# region = "eu-west-1"
# plan = "starter"
"#
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Parse error: {0}")]
    Parse(String),
}
