//! # Testing & Assertions
//!
//! Hard and soft response assertions, the per-test context, hooks, and the
//! sequential runner that turns registered cases into a `RunReport`.

pub mod assertions;
pub mod context;
pub mod fixtures;
pub mod hooks;
pub mod runner;
pub mod soft;

use thiserror::Error;

use crate::error::HttpError;

pub use assertions::{
    AssertionFailure, AssertionTarget, ResponseExpectation, ensure, ensure_status_in,
    validate_api_response,
};
pub use context::TestContext;
pub use fixtures::Fixtures;
pub use runner::{Runner, Selection, TestCase, TestFn, TestFuture};

/// Why a test body stopped early.
#[derive(Error, Debug)]
pub enum TestError {
    #[error(transparent)]
    Assertion(#[from] AssertionFailure),

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("Invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("skipped: {0}")]
    Skipped(String),
}

pub type TestResult = Result<(), TestError>;

/// Turn an `async fn(&mut TestContext) -> TestResult` into a [`TestFn`].
macro_rules! test_fn {
    ($body:path) => {{
        fn run(ctx: &mut $crate::testing::TestContext) -> $crate::testing::TestFuture<'_> {
            Box::pin($body(ctx))
        }
        run as $crate::testing::TestFn
    }};
}

pub(crate) use test_fn;
