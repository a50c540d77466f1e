//! apiforge-core: API document normalization, mock data synthesis, and
//! assertion evaluation.
//!
//! The pipeline: a format parser normalizes an OpenAPI v2/v3, Postman, or
//! apifox document into the canonical [`document::ParsedDocument`]; the
//! resolver closes every `$ref`; the mock generator synthesizes request
//! bodies; the test case synthesizer derives one baseline case per endpoint;
//! the assertion engine evaluates typed checks against responses. Execution
//! lives in `apiforge-runner`.

pub mod assertion;
pub mod config;
pub mod document;
pub mod error;
pub mod mockgen;
pub mod parsers;
pub mod report;
pub mod resolve;
pub mod testcase;

pub use assertion::{AssertionOutcome, HttpResponse, evaluate};
pub use config::{Config, ConfigError};
pub use document::{
    AssertOp, Assertion, AssertionKind, Endpoint, Example, ParamLocation, ParamSpec,
    ParsedDocument, Schema, TestCase,
};
pub use error::ParseError;
pub use mockgen::{FieldPattern, Locale, MockDataOptions, Rule};
pub use parsers::{ApiParser, Format, ParserRegistry, detect, load_document};
pub use report::{ApiTestResult, CaseResult, TestSuite};
pub use resolve::resolve;
