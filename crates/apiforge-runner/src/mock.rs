//! Mock response registry for offline test execution.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A canned response served instead of a live request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockedResponse {
    pub status: u16,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Value,
}

impl Default for MockedResponse {
    fn default() -> Self {
        Self {
            status: 200,
            headers: BTreeMap::new(),
            body: Value::Null,
        }
    }
}

impl MockedResponse {
    #[must_use]
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body,
        }
    }
}

/// Keyed by exact `"METHOD:path"`. A plain value owned by its executor;
/// registering the same key twice keeps the last response.
#[derive(Debug, Default)]
pub struct MockRegistry {
    responses: HashMap<String, MockedResponse>,
}

impl MockRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn key(method: &str, path: &str) -> String {
        format!("{}:{}", method.to_uppercase(), path)
    }

    pub fn mock(&mut self, method: &str, path: &str, response: MockedResponse) {
        self.responses.insert(Self::key(method, path), response);
    }

    #[must_use]
    pub fn lookup(&self, method: &str, path: &str) -> Option<&MockedResponse> {
        self.responses.get(&Self::key(method, path))
    }

    pub fn clear(&mut self) {
        self.responses.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn exact_key_hit_and_miss() {
        let mut registry = MockRegistry::new();
        registry.mock("get", "/pets/1", MockedResponse::new(200, json!({"id": 1})));

        // Method casing normalizes; the path does not.
        assert!(registry.lookup("GET", "/pets/1").is_some());
        assert!(registry.lookup("GET", "/pets/2").is_none());
        assert!(registry.lookup("POST", "/pets/1").is_none());
        assert!(registry.lookup("GET", "/pets/{id}").is_none());
    }

    #[test]
    fn last_registration_wins() {
        let mut registry = MockRegistry::new();
        registry.mock("GET", "/a", MockedResponse::new(200, json!(1)));
        registry.mock("GET", "/a", MockedResponse::new(404, json!(2)));
        assert_eq!(registry.lookup("GET", "/a").unwrap().status, 404);
    }

    #[test]
    fn clear_removes_everything() {
        let mut registry = MockRegistry::new();
        registry.mock("GET", "/a", MockedResponse::default());
        registry.clear();
        assert!(registry.is_empty());
    }
}
