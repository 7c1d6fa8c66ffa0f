mod cli;
mod config;
mod environment;
mod error;
mod history;
mod http;
mod report;
mod storage;
mod suites;
mod telemetry;
mod testing;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use cli::{Cli, OutputFormat};
use config::HarnessConfig;
use error::{SetupError, StorageError};
use http::ApiClient;
use report::{render_json, render_junit, render_text};
use testing::hooks::CommandCapture;
use testing::{Fixtures, Runner};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = run(cli).await;
    if let Err(err) = &result {
        eprintln!("error: {err}");
    }
    ExitCode::from(exit_status(&result))
}

/// 0 when every selected test passed, 1 when any failed, 2 on setup errors.
fn exit_status(result: &Result<bool, SetupError>) -> u8 {
    match result {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(_) => 2,
    }
}

/// Returns whether every selected test passed.
async fn run(cli: Cli) -> Result<bool, SetupError> {
    let mut config = HarnessConfig::load(cli.config.as_deref())?;
    config.apply(cli.overrides()?);
    let base_url = config.resolve_base_url(cli.environment.as_deref())?;

    let cases = suites::all();
    let selection = cli.selection();

    if cli.list {
        for case in cases.iter().filter(|c| selection.matches(c)) {
            println!("{} [{}]", case.nodeid(), case.marks.join(", "));
        }
        return Ok(true);
    }

    storage::ensure_dir(&config.reports_dir)?;
    storage::ensure_dir(&config.logs_dir)?;
    let _telemetry = telemetry::init_tracing(&config.logs_dir, &config.log_file, cli.verbose);
    info!(
        "starting run against {base_url}, logging to {}",
        config.log_path().display()
    );

    let client = ApiClient::new(config.timeout(), &config.default_headers())?;
    let mut runner = Runner::new(Fixtures::new(&base_url), client, &config.reports_dir)
        .with_title(&config.report_title)
        .with_default_hooks();
    if let Some(capture) = CommandCapture::new(config.screenshot_command.clone()) {
        runner = runner.with_driver(Arc::new(capture));
    }
    let report = runner.run(&cases, &selection).await;

    match cli.format {
        OutputFormat::Text => print!("{}", render_text(&report)),
        OutputFormat::Json => println!("{}", render_json(&report).map_err(StorageError::from)?),
        OutputFormat::Junit => print!("{}", render_junit(&report)),
    }

    if let Some(path) = &cli.report {
        let raw = render_json(&report).map_err(StorageError::from)?;
        storage::write_file(path, raw)?;
        info!("JSON report written to {}", path.display());
    }
    if let Some(path) = &cli.junit {
        storage::write_file(path, render_junit(&report))?;
        info!("JUnit report written to {}", path.display());
    }

    Ok(report.success())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("apiprobe").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn exit_status_maps_outcomes() {
        assert_eq!(exit_status(&Ok(true)), 0);
        assert_eq!(exit_status(&Ok(false)), 1);
        let err = SetupError::Config(ConfigError::UnknownEnvironment("qa".into()));
        assert_eq!(exit_status(&Err(err)), 2);
    }

    #[tokio::test]
    async fn unknown_environment_is_a_setup_error() {
        let tmp = tempfile::tempdir().unwrap();
        let reports = tmp.path().join("reports");
        let reports = reports.to_str().unwrap();

        let result = run(cli(&["--env", "nope", "--reports-dir", reports])).await;

        assert!(matches!(
            result,
            Err(SetupError::Config(ConfigError::UnknownEnvironment(ref name))) if name == "nope"
        ));
        assert_eq!(exit_status(&result), 2);
        assert!(!tmp.path().join("reports").exists());
    }

    #[tokio::test]
    async fn missing_config_file_is_a_setup_error() {
        let result = run(cli(&["--config", "/nonexistent/apiprobe.json"])).await;
        assert!(matches!(result, Err(SetupError::Config(ConfigError::Read { .. }))));
    }

    #[tokio::test]
    async fn list_exits_cleanly_without_touching_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let reports = tmp.path().join("reports");
        let logs = tmp.path().join("logs");

        let result = run(cli(&[
            "--list",
            "--base-url",
            "http://127.0.0.1:9/",
            "--reports-dir",
            reports.to_str().unwrap(),
            "--logs-dir",
            logs.to_str().unwrap(),
        ]))
        .await;

        assert_eq!(exit_status(&result), 0);
        assert!(!reports.exists());
        assert!(!logs.exists());
    }
}
