//! Run reports and their renderings.

mod junit;

use std::fmt::{self, Display, Write as _};
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::history::HistoryEntry;

pub use junit::render_junit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Passed,
    Failed,
    Skipped,
}

impl Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Outcome::Passed => "PASSED",
            Outcome::Failed => "FAILED",
            Outcome::Skipped => "SKIPPED",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TestReport {
    pub nodeid: String,
    pub suite: String,
    pub name: String,
    pub marks: Vec<String>,
    pub outcome: Outcome,
    #[serde(rename = "duration_secs", serialize_with = "as_secs")]
    pub duration: Duration,
    pub failures: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    pub exchanges: Vec<HistoryEntry>,
    pub artifacts: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub title: String,
    pub base_url: String,
    pub started_at: DateTime<Utc>,
    #[serde(rename = "duration_secs", serialize_with = "as_secs")]
    pub duration: Duration,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub deselected: usize,
    pub tests: Vec<TestReport>,
}

impl RunReport {
    pub fn new(title: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            base_url: base_url.into(),
            started_at: Utc::now(),
            duration: Duration::ZERO,
            passed: 0,
            failed: 0,
            skipped: 0,
            deselected: 0,
            tests: Vec::new(),
        }
    }

    pub fn push(&mut self, test: TestReport) {
        match test.outcome {
            Outcome::Passed => self.passed += 1,
            Outcome::Failed => self.failed += 1,
            Outcome::Skipped => self.skipped += 1,
        }
        self.tests.push(test);
    }

    pub fn total(&self) -> usize {
        self.tests.len()
    }

    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

fn as_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

pub fn render_text(report: &RunReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", report.title);
    let _ = writeln!(out, "target: {}", report.base_url);
    let _ = writeln!(out);

    for test in &report.tests {
        let _ = writeln!(
            out,
            "{:<8} {} ({:.2}s)",
            test.outcome.to_string(),
            test.nodeid,
            test.duration.as_secs_f64()
        );
        for failure in &test.failures {
            let _ = writeln!(out, "         - {failure}");
        }
        if let Some(reason) = &test.skip_reason {
            let _ = writeln!(out, "         - {reason}");
        }
        for artifact in &test.artifacts {
            let _ = writeln!(out, "         artifact: {}", artifact.display());
        }
    }

    let _ = writeln!(out);
    let _ = write!(
        out,
        "{} passed, {} failed, {} skipped",
        report.passed, report.failed, report.skipped
    );
    if report.deselected > 0 {
        let _ = write!(out, ", {} deselected", report.deselected);
    }
    let _ = writeln!(out, " in {:.2}s", report.duration.as_secs_f64());
    out
}

pub fn render_json(report: &RunReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

#[cfg(test)]
pub(crate) fn sample_test(nodeid: &str, outcome: Outcome, failures: &[&str]) -> TestReport {
    let mut parts = nodeid.rsplitn(3, "::");
    let name = parts.next().unwrap_or_default().to_string();
    let suite = parts.next().unwrap_or_default().to_string();
    TestReport {
        nodeid: nodeid.to_string(),
        suite,
        name,
        marks: vec!["get".to_string()],
        outcome,
        duration: Duration::from_millis(250),
        failures: failures.iter().map(|f| f.to_string()).collect(),
        skip_reason: None,
        exchanges: Vec::new(),
        artifacts: Vec::new(),
    }
}
