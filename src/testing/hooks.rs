use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, error, info, warn};

use crate::error::CaptureError;
use crate::report::{Outcome, TestReport};
use crate::storage;

use super::context::TestContext;

/// A driver able to capture the screen it controls.
pub trait ScreenCapture: Send + Sync {
    fn save_screenshot(&self, path: &Path) -> Result<(), CaptureError>;
}

/// Captures the screen by running an external program. Every `{path}` in its
/// arguments becomes the target file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandCapture {
    program: String,
    args: Vec<String>,
}

impl CommandCapture {
    /// `None` when `argv` is empty.
    pub fn new(argv: Vec<String>) -> Option<Self> {
        let mut argv = argv.into_iter();
        let program = argv.next()?;
        Some(Self {
            program,
            args: argv.collect(),
        })
    }
}

impl ScreenCapture for CommandCapture {
    fn save_screenshot(&self, path: &Path) -> Result<(), CaptureError> {
        if let Some(parent) = path.parent() {
            storage::ensure_dir(parent)?;
        }

        let target = path.display().to_string();
        debug!("capturing screenshot with `{}` into {target}", self.program);
        let output = Command::new(&self.program)
            .args(self.args.iter().map(|arg| arg.replace("{path}", &target)))
            .stdin(Stdio::null())
            .output()
            .map_err(|source| CaptureError::Command {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CaptureError::Driver(format!(
                "`{}` exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// Called once per executed test, after the body finished, in registration order.
pub trait RunHook: Send + Sync {
    fn after_call(&self, ctx: &TestContext, report: &mut TestReport);
}

/// Writes one line per test outcome to the log.
#[derive(Debug, Default)]
pub struct LogReportHook;

impl RunHook for LogReportHook {
    fn after_call(&self, _ctx: &TestContext, report: &mut TestReport) {
        let secs = report.duration.as_secs_f64();
        match report.outcome {
            Outcome::Passed => info!("Test '{}' PASSED in {secs:.2}s", report.nodeid),
            Outcome::Failed => {
                error!("Test '{}' FAILED in {secs:.2}s", report.nodeid);
                for failure in &report.failures {
                    error!("  {failure}");
                }
            }
            Outcome::Skipped => warn!("Test '{}' SKIPPED", report.nodeid),
        }
    }
}

/// Saves a screenshot of a failed test when a capture driver is attached.
#[derive(Debug, Default)]
pub struct FailureCaptureHook;

impl RunHook for FailureCaptureHook {
    fn after_call(&self, ctx: &TestContext, report: &mut TestReport) {
        if report.outcome != Outcome::Failed {
            return;
        }
        let Some(driver) = ctx.driver() else {
            return;
        };

        let path = storage::artifact_path(ctx.reports_dir(), ctx.name(), "png");
        match driver.save_screenshot(&path) {
            Ok(()) => report.artifacts.push(path),
            Err(err) => warn!("Could not capture screenshot for '{}': {err}", report.nodeid),
        }
    }
}
