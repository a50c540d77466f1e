//! Sequential test execution over a blocking HTTP client.
//!
//! Mocked endpoints short-circuit before any network I/O, so suites run
//! offline when every case has a registered mock. A transport error or
//! timeout fails the case and the run continues.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde_json::Value;
use thiserror::Error;

use apiforge_core::assertion::{self, HttpResponse};
use apiforge_core::document::{ParamLocation, ParsedDocument, TestCase};
use apiforge_core::mockgen::{MockDataOptions, schema_gen};
use apiforge_core::report::{ApiTestResult, CaseResult};
use apiforge_core::Config;

use crate::mock::MockRegistry;

const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("no base URL: set base_url in config or in the document")]
    MissingBaseUrl,
    #[error("http client: {0}")]
    Client(String),
}

pub struct TestExecutor {
    base_url: String,
    headers: HashMap<String, String>,
    path_params: HashMap<String, String>,
    settle_delay: Duration,
    client: reqwest::blocking::Client,
    mocks: MockRegistry,
}

impl TestExecutor {
    /// Build from config. `document_base_url` is the fallback when the
    /// config does not pin a server.
    pub fn new(config: &Config, document_base_url: Option<&str>) -> Result<Self, ExecError> {
        let base_url = config
            .base_url
            .clone()
            .or_else(|| document_base_url.map(String::from))
            .ok_or(ExecError::MissingBaseUrl)?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ExecError::Client(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            headers: config.headers.clone(),
            path_params: config.path_params.clone(),
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            client,
            mocks: MockRegistry::new(),
        })
    }

    #[must_use]
    pub fn with_mocks(mut self, mocks: MockRegistry) -> Self {
        self.mocks = mocks;
        self
    }

    pub fn mocks_mut(&mut self) -> &mut MockRegistry {
        &mut self.mocks
    }

    /// Run cases sequentially, sleeping the settle delay between them.
    /// Residual path parameters with no configured value are filled with
    /// `"1"`.
    pub fn run(&self, cases: &[TestCase]) -> ApiTestResult {
        let results = self.run_inner(cases, |_, name| self.configured_param(name));
        ApiTestResult::from_cases(results)
    }

    /// Run a parsed document's populated cases. Path parameters missing from
    /// the config are generated from their declared schemas.
    pub fn run_document(&self, doc: &ParsedDocument) -> ApiTestResult {
        let mut results = Vec::new();
        for endpoint in &doc.endpoints {
            let schemas = endpoint
                .parameters
                .get(&ParamLocation::Path)
                .cloned()
                .unwrap_or_default();
            let batch = self.run_inner(&endpoint.test_cases, |_case, name| {
                self.configured_param(name).or_else(|| {
                    schemas.get(name).map(|spec| {
                        let mut rng = SmallRng::from_entropy();
                        let options = MockDataOptions::default();
                        param_text(&schema_gen::generate(&spec.schema, &options, &mut rng))
                    })
                })
            });
            results.extend(batch);
        }
        ApiTestResult::from_cases(results)
    }

    fn run_inner(
        &self,
        cases: &[TestCase],
        param_value: impl Fn(&TestCase, &str) -> Option<String>,
    ) -> Vec<CaseResult> {
        let mut results = Vec::with_capacity(cases.len());
        for (index, case) in cases.iter().enumerate() {
            if index > 0 && !self.settle_delay.is_zero() {
                std::thread::sleep(self.settle_delay);
            }
            let path = substitute_path(&case.endpoint, |name| param_value(case, name));
            results.push(self.execute_case(case, &path));
        }
        results
    }

    fn configured_param(&self, name: &str) -> Option<String> {
        self.path_params.get(name).cloned()
    }

    fn execute_case(&self, case: &TestCase, path: &str) -> CaseResult {
        let start = Instant::now();
        let response = match self.mocks.lookup(&case.method, path) {
            Some(mock) => Ok(HttpResponse {
                status: mock.status,
                status_text: String::new(),
                headers: mock.headers.clone(),
                body: mock.body.clone(),
            }),
            None => self.send(case, path),
        };

        let (passed, failed_assertions) = match response {
            Ok(response) => {
                let failed: Vec<String> = case
                    .assertions
                    .iter()
                    .map(|a| assertion::evaluate(a, &response))
                    .filter(|outcome| !outcome.passed)
                    .map(|outcome| outcome.message)
                    .collect();
                (failed.is_empty(), failed)
            }
            Err(message) => (false, vec![message]),
        };

        CaseResult {
            id: case.id.clone(),
            description: case.description.clone(),
            endpoint: format!("{} {}", case.method, path),
            passed,
            failed_assertions,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    fn send(&self, case: &TestCase, path: &str) -> Result<HttpResponse, String> {
        let url = format!("{}{}", self.base_url, path);
        let method = reqwest::Method::from_bytes(case.method.as_bytes())
            .map_err(|_| format!("invalid method '{}'", case.method))?;

        let mut request = self.client.request(method, &url);
        for (name, value) in self.headers.iter().chain(case.headers.iter()) {
            // Headers with values reqwest cannot represent are skipped, not
            // fatal.
            if let Ok(value) = reqwest::header::HeaderValue::from_str(value) {
                if let Ok(name) = reqwest::header::HeaderName::from_bytes(name.as_bytes()) {
                    request = request.header(name, value);
                }
            }
        }
        if let Some(body) = &case.body {
            request = request.json(body);
        }

        let response = request
            .send()
            .map_err(|e| format!("transport error: {e}"))?;
        let status = response.status();
        let mut headers = std::collections::BTreeMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(name.to_string(), value.to_string());
            }
        }
        let text = response
            .text()
            .map_err(|e| format!("failed to read body: {e}"))?;
        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            headers,
            body: body_value(&text),
        })
    }
}

/// Replace `{name}` segments; anything without a value falls back to `"1"`.
fn substitute_path(template: &str, value_for: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let Some(close) = rest[open..].find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let name = &rest[open + 1..open + close];
        match value_for(name) {
            Some(value) => out.push_str(&value),
            None => out.push('1'),
        }
        rest = &rest[open + close + 1..];
    }
    out.push_str(rest);
    out
}

/// JSON body when it parses, else the raw text truncated on a char boundary.
fn body_value(text: &str) -> Value {
    if let Ok(parsed) = serde_json::from_str(text) {
        return parsed;
    }
    let mut end = text.len().min(MAX_BODY_BYTES);
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    Value::String(text[..end].to_string())
}

fn param_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
