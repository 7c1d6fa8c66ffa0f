//! # Command Line
//!
//! `apiprobe --env staging -m get --report reports/report.json`
//!
//! Exit code 0 when every selected test passed, 1 when any failed, 2 on
//! configuration or setup errors.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::ConfigOverrides;
use crate::error::HttpError;
use crate::http::parse_header_line;
use crate::testing::Selection;

#[derive(Debug, Parser)]
#[command(name = "apiprobe")]
#[command(author, version)]
#[command(about = "Verify the HTTP contract of a REST users endpoint")]
pub struct Cli {
    /// JSON configuration file
    #[arg(short, long, env = "APIPROBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base URL of the service under test
    #[arg(long, env = "APIPROBE_BASE_URL")]
    pub base_url: Option<String>,

    /// Named environment from the configuration file
    #[arg(short = 'e', long = "env")]
    pub environment: Option<String>,

    /// Only run tests carrying this mark (repeatable)
    #[arg(short = 'm', long = "mark")]
    pub marks: Vec<String>,

    /// Skip tests carrying this mark (repeatable)
    #[arg(long = "exclude-mark")]
    pub exclude_marks: Vec<String>,

    /// Only run tests whose node id contains this text
    #[arg(short = 'k', long)]
    pub keyword: Option<String>,

    /// Format of the summary printed to stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write a JSON report to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Write a JUnit XML report to this file
    #[arg(long)]
    pub junit: Option<PathBuf>,

    /// Per-request timeout in milliseconds (0 disables it)
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Directory for screenshots and other run artifacts
    #[arg(long)]
    pub reports_dir: Option<PathBuf>,

    /// Directory holding the run log file
    #[arg(long)]
    pub logs_dir: Option<PathBuf>,

    /// Extra request header, `Name: value` (repeatable)
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// List the selected tests without running them
    #[arg(long)]
    pub list: bool,

    /// Mirror debug logs to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Junit,
}

impl Cli {
    pub fn overrides(&self) -> Result<ConfigOverrides, HttpError> {
        let headers = self
            .headers
            .iter()
            .map(|line| parse_header_line(line))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ConfigOverrides {
            base_url: self.base_url.clone(),
            timeout_ms: self.timeout_ms,
            reports_dir: self.reports_dir.clone(),
            logs_dir: self.logs_dir.clone(),
            headers,
        })
    }

    pub fn selection(&self) -> Selection {
        Selection {
            marks: self.marks.clone(),
            exclude_marks: self.exclude_marks.clone(),
            keyword: self.keyword.clone(),
        }
    }
}
