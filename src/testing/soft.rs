//! Soft assertions: record a failed check and keep going.

use std::fmt::Debug;

use serde::Serialize;

use super::assertions::AssertionTarget;

/// Result of evaluating one soft check.
#[derive(Debug, Clone, Serialize)]
pub struct AssertionResult {
    pub target: AssertionTarget,
    pub passed: bool,
    pub expected: String,
    pub actual: String,
    pub message: String,
}

impl AssertionResult {
    pub fn describe(&self) -> String {
        format!(
            "{}: {} (expected {}, got {})",
            self.target, self.message, self.expected, self.actual
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct SoftAssert {
    results: Vec<AssertionResult>,
}

impl SoftAssert {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn equal<T>(&mut self, actual: T, expected: T, message: impl Into<String>) -> bool
    where
        T: PartialEq + Debug,
    {
        let passed = actual == expected;
        self.record(
            AssertionTarget::Condition,
            passed,
            format!("{expected:?}"),
            format!("{actual:?}"),
            message,
        )
    }

    pub fn is_true(&mut self, condition: bool, message: impl Into<String>) -> bool {
        self.record(
            AssertionTarget::Condition,
            condition,
            "true".to_string(),
            condition.to_string(),
            message,
        )
    }

    pub fn is_in<T>(&mut self, actual: T, allowed: &[T], message: impl Into<String>) -> bool
    where
        T: PartialEq + Debug,
    {
        let passed = allowed.contains(&actual);
        self.record(
            AssertionTarget::Condition,
            passed,
            format!("one of {allowed:?}"),
            format!("{actual:?}"),
            message,
        )
    }

    /// Soft variant of a status check, attributed to the status target.
    pub fn status(&mut self, actual: u16, expected: u16, message: impl Into<String>) -> bool {
        self.record(
            AssertionTarget::StatusCode,
            actual == expected,
            expected.to_string(),
            actual.to_string(),
            message,
        )
    }

    fn record(
        &mut self,
        target: AssertionTarget,
        passed: bool,
        expected: String,
        actual: String,
        message: impl Into<String>,
    ) -> bool {
        self.results.push(AssertionResult {
            target,
            passed,
            expected,
            actual,
            message: message.into(),
        });
        passed
    }

    pub fn failures(&self) -> impl Iterator<Item = &AssertionResult> {
        self.results.iter().filter(|r| !r.passed)
    }
}
