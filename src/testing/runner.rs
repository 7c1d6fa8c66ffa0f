use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::config::DEFAULT_REPORT_TITLE;
use crate::http::ApiClient;
use crate::report::{Outcome, RunReport, TestReport};

use super::context::TestContext;
use super::fixtures::Fixtures;
use super::hooks::{FailureCaptureHook, LogReportHook, RunHook, ScreenCapture};
use super::soft::AssertionResult;
use super::{TestError, TestResult};

pub type TestFuture<'a> = Pin<Box<dyn Future<Output = TestResult> + Send + 'a>>;
pub type TestFn = for<'a> fn(&'a mut TestContext) -> TestFuture<'a>;

/// A registered test. The node id is `module::suite::name`.
#[derive(Clone, Copy)]
pub struct TestCase {
    pub module: &'static str,
    pub suite: &'static str,
    pub name: &'static str,
    pub marks: &'static [&'static str],
    pub run: TestFn,
}

impl TestCase {
    pub fn nodeid(&self) -> String {
        format!("{}::{}::{}", self.module, self.suite, self.name)
    }

    pub fn has_mark(&self, mark: &str) -> bool {
        self.marks.iter().any(|m| *m == mark)
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("nodeid", &self.nodeid())
            .field("marks", &self.marks)
            .finish()
    }
}

/// Which registered cases to run.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Run only cases carrying at least one of these marks. Empty means all.
    pub marks: Vec<String>,
    pub exclude_marks: Vec<String>,
    /// Substring the node id must contain.
    pub keyword: Option<String>,
}

impl Selection {
    pub fn matches(&self, case: &TestCase) -> bool {
        if !self.marks.is_empty() && !self.marks.iter().any(|m| case.has_mark(m)) {
            return false;
        }
        if self.exclude_marks.iter().any(|m| case.has_mark(m)) {
            return false;
        }
        match &self.keyword {
            Some(keyword) => case.nodeid().contains(keyword.as_str()),
            None => true,
        }
    }
}

/// Runs cases one after another against a single service.
pub struct Runner {
    fixtures: Fixtures,
    client: ApiClient,
    reports_dir: PathBuf,
    title: String,
    driver: Option<Arc<dyn ScreenCapture>>,
    hooks: Vec<Box<dyn RunHook>>,
}

impl Runner {
    pub fn new(fixtures: Fixtures, client: ApiClient, reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            fixtures,
            client,
            reports_dir: reports_dir.into(),
            title: DEFAULT_REPORT_TITLE.to_string(),
            driver: None,
            hooks: Vec::new(),
        }
    }

    /// Failure capture first so the log hook sees the final report.
    pub fn with_default_hooks(self) -> Self {
        self.with_hook(FailureCaptureHook).with_hook(LogReportHook)
    }

    pub fn with_hook(mut self, hook: impl RunHook + 'static) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_driver(mut self, driver: Arc<dyn ScreenCapture>) -> Self {
        self.driver = Some(driver);
        self
    }

    pub async fn run(&self, cases: &[TestCase], selection: &Selection) -> RunReport {
        let started = Instant::now();
        let mut run = RunReport::new(&self.title, self.fixtures.base_url());

        let selected: Vec<&TestCase> = cases.iter().filter(|c| selection.matches(c)).collect();
        run.deselected = cases.len() - selected.len();
        info!(
            "collected {} tests ({} deselected) against {}",
            cases.len(),
            run.deselected,
            self.fixtures.base_url()
        );

        for case in selected {
            let report = self.run_case(case).await;
            run.push(report);
        }

        run.duration = started.elapsed();
        info!(
            "{} passed, {} failed, {} skipped in {:.2}s",
            run.passed,
            run.failed,
            run.skipped,
            run.duration.as_secs_f64()
        );
        run
    }

    async fn run_case(&self, case: &TestCase) -> TestReport {
        let nodeid = case.nodeid();
        let api_url = self.fixtures.api_url(case.name);
        let mut ctx = TestContext::new(
            case.name,
            nodeid.clone(),
            api_url,
            self.client.clone(),
            self.reports_dir.clone(),
            self.driver.clone(),
        );

        let started = Instant::now();
        let result = (case.run)(&mut ctx).await;
        let duration = started.elapsed();

        // Soft failures come first, in the order they were recorded.
        let mut failures: Vec<String> = ctx.check.failures().map(AssertionResult::describe).collect();
        let mut skip_reason = None;
        let outcome = match result {
            Ok(()) if failures.is_empty() => Outcome::Passed,
            Ok(()) => Outcome::Failed,
            Err(TestError::Skipped(reason)) if failures.is_empty() => {
                skip_reason = Some(reason);
                Outcome::Skipped
            }
            Err(err) => {
                failures.push(err.to_string());
                Outcome::Failed
            }
        };

        let mut report = TestReport {
            nodeid,
            suite: case.suite.to_string(),
            name: case.name.to_string(),
            marks: case.marks.iter().map(|m| m.to_string()).collect(),
            outcome,
            duration,
            failures,
            skip_reason,
            exchanges: ctx.history().entries().iter().cloned().collect(),
            artifacts: Vec::new(),
        };

        for hook in &self.hooks {
            hook.after_call(&ctx, &mut report);
        }
        report
    }
}
