//! Persisted output shapes: generated test suites and run results, plus the
//! JSON Schema export for the interchange format.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::document::{ParsedDocument, TestCase};

/// A generated suite, self-contained enough to run later.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TestSuite {
    pub title: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub cases: Vec<TestCase>,
}

impl TestSuite {
    #[must_use]
    pub fn from_document(doc: &ParsedDocument, cases: Vec<TestCase>) -> Self {
        Self {
            title: doc.title.clone(),
            version: doc.version.clone(),
            base_url: doc.base_url.clone(),
            cases,
        }
    }
}

/// Outcome of one executed test case.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CaseResult {
    pub id: String,
    pub description: String,
    /// "METHOD /path" of the executed request.
    pub endpoint: String,
    pub passed: bool,
    /// Messages of the assertions that failed, empty when `passed`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_assertions: Vec<String>,
    pub duration_ms: u64,
}

/// Aggregated outcome of a run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ApiTestResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub cases: Vec<CaseResult>,
}

impl ApiTestResult {
    #[must_use]
    pub fn from_cases(cases: Vec<CaseResult>) -> Self {
        let passed = cases.iter().filter(|c| c.passed).count();
        Self {
            total: cases.len(),
            passed,
            failed: cases.len() - passed,
            cases,
        }
    }

    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Generate JSON Schema for the run result interchange format.
#[must_use]
pub fn generate_schema() -> String {
    let schema = schemars::schema_for!(ApiTestResult);
    serde_json::to_string_pretty(&schema).expect("schema serialization should not fail")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(id: &str, passed: bool) -> CaseResult {
        CaseResult {
            id: id.to_string(),
            description: String::new(),
            endpoint: format!("GET /{id}"),
            passed,
            failed_assertions: if passed {
                vec![]
            } else {
                vec!["expected status = 200, got 500".to_string()]
            },
            duration_ms: 12,
        }
    }

    #[test]
    fn result_counts_from_cases() {
        let result = ApiTestResult::from_cases(vec![
            case("a", true),
            case("b", false),
            case("c", true),
        ]);
        assert_eq!(result.total, 3);
        assert_eq!(result.passed, 2);
        assert_eq!(result.failed, 1);
        assert!(!result.all_passed());
    }

    #[test]
    fn schema_generation_produces_valid_json() {
        let schema = generate_schema();
        let parsed: serde_json::Value = serde_json::from_str(&schema).unwrap();
        assert!(parsed.get("$schema").is_some() || parsed.get("type").is_some());
        assert_eq!(
            parsed.get("title").and_then(|v| v.as_str()),
            Some("ApiTestResult")
        );
    }

    #[test]
    fn suite_round_trips_through_json() {
        let mut doc = ParsedDocument::default();
        doc.title = "Petstore".to_string();
        doc.version = "1.0".to_string();
        let suite = TestSuite::from_document(&doc, vec![]);
        let json = serde_json::to_string(&suite).unwrap();
        let back: TestSuite = serde_json::from_str(&json).unwrap();
        assert_eq!(back.title, "Petstore");
    }
}
