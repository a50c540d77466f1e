//! apiforge-runner: sequential test execution with a mock registry.
//!
//! The executor takes the test cases `apiforge-core` synthesizes and runs
//! them against a live server over blocking HTTP, or against registered
//! mocks when offline.

pub mod executor;
pub mod mock;

pub use executor::{ExecError, TestExecutor};
pub use mock::{MockRegistry, MockedResponse};
