//! Harness configuration.
//!
//! Layering is defaults, then an optional JSON file, then command-line
//! overrides.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::environment::{Environment, EnvironmentManager, Variable, interpolate};
use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com/";
pub const DEFAULT_REPORT_TITLE: &str = "API Contract Report";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Base URL of the service under test. May contain `{{var}}` placeholders.
    pub base_url: String,

    /// Per-request timeout in milliseconds; 0 disables it.
    pub timeout_ms: u64,

    pub reports_dir: PathBuf,

    pub logs_dir: PathBuf,

    /// Log file name inside `logs_dir`.
    pub log_file: String,

    pub report_title: String,

    /// Headers sent with every request.
    pub headers: BTreeMap<String, String>,

    /// Global variables for base URL interpolation.
    pub variables: Vec<Variable>,

    pub environments: Vec<Environment>,

    /// Program and arguments run to save a screenshot of a failed test;
    /// `{path}` is replaced with the target file. Empty disables capture.
    pub screenshot_command: Vec<String>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: 10_000,
            reports_dir: PathBuf::from("reports"),
            logs_dir: PathBuf::from("logs"),
            log_file: "history.log".to_string(),
            report_title: DEFAULT_REPORT_TITLE.to_string(),
            headers: BTreeMap::new(),
            variables: Vec::new(),
            environments: Vec::new(),
            screenshot_command: Vec::new(),
        }
    }
}

/// Values given on the command line; `None` keeps the configured value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub timeout_ms: Option<u64>,
    pub reports_dir: Option<PathBuf>,
    pub logs_dir: Option<PathBuf>,
    pub headers: Vec<(String, String)>,
}

impl HarnessConfig {
    /// Load from `path`, or return defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(base_url) = overrides.base_url {
            self.base_url = base_url;
        }
        if let Some(timeout_ms) = overrides.timeout_ms {
            self.timeout_ms = timeout_ms;
        }
        if let Some(dir) = overrides.reports_dir {
            self.reports_dir = dir;
        }
        if let Some(dir) = overrides.logs_dir {
            self.logs_dir = dir;
        }
        for (name, value) in overrides.headers {
            self.headers.insert(name, value);
        }
    }

    /// Interpolate the base URL against globals and the active environment,
    /// then check that no placeholder is left and that it parses as an
    /// absolute URL.
    pub fn resolve_base_url(&self, environment: Option<&str>) -> Result<String, ConfigError> {
        let manager = EnvironmentManager {
            globals: self.variables.clone(),
            environments: self.environments.clone(),
            active_environment: environment.map(str::to_string),
        };
        let url = interpolate(&self.base_url, &manager.resolve()?);

        if url.contains("{{") {
            return Err(ConfigError::InvalidBaseUrl {
                url,
                reason: "unresolved placeholder".to_string(),
            });
        }
        reqwest::Url::parse(&url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        Ok(url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn log_path(&self) -> PathBuf {
        self.logs_dir.join(&self.log_file)
    }

    pub fn default_headers(&self) -> Vec<(String, String)> {
        self.headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_target_public_service() {
        let config = HarnessConfig::load(None).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.log_path(), PathBuf::from("logs").join("history.log"));
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"timeout_ms": 2500, "report_title": "Nightly"}}"#).unwrap();

        let config = HarnessConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.timeout_ms, 2500);
        assert_eq!(config.report_title, "Nightly");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();

        let err = HarnessConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = HarnessConfig::load(Some(Path::new("/nonexistent/apiprobe.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn overrides_win_over_file_values() {
        let mut config = HarnessConfig::default();
        config.headers.insert("X-Team".into(), "qa".into());
        config.apply(ConfigOverrides {
            base_url: Some("http://localhost:3000/".into()),
            timeout_ms: Some(0),
            headers: vec![("X-Team".into(), "ops".into())],
            ..Default::default()
        });

        assert_eq!(config.base_url, "http://localhost:3000/");
        assert!(config.timeout().is_zero());
        assert_eq!(
            config.default_headers(),
            vec![("X-Team".to_string(), "ops".to_string())]
        );
    }

    #[test]
    fn base_url_resolves_environment_variables() {
        let config: HarnessConfig = serde_json::from_str(
            r#"{
                "base_url": "https://{{host}}/v1/",
                "variables": [{"key": "host", "value": "api.example.com"}],
                "environments": [
                    {"name": "staging", "variables": [{"key": "host", "value": "staging.example.com"}]}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(
            config.resolve_base_url(None).unwrap(),
            "https://api.example.com/v1/"
        );
        assert_eq!(
            config.resolve_base_url(Some("staging")).unwrap(),
            "https://staging.example.com/v1/"
        );
    }

    #[test]
    fn unresolved_base_url_is_rejected() {
        let config = HarnessConfig {
            base_url: "{{host}}/users".into(),
            ..Default::default()
        };

        assert!(matches!(
            config.resolve_base_url(None),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn placeholder_left_in_host_is_rejected() {
        let config = HarnessConfig {
            base_url: "https://{{host}}/".into(),
            ..Default::default()
        };

        let err = config.resolve_base_url(None).unwrap_err();
        assert!(
            matches!(&err, ConfigError::InvalidBaseUrl { reason, .. } if reason == "unresolved placeholder"),
            "{err}"
        );
    }

    #[test]
    fn screenshot_command_is_read_from_file() {
        let config: HarnessConfig =
            serde_json::from_str(r#"{"screenshot_command": ["grim", "{path}"]}"#).unwrap();
        assert_eq!(config.screenshot_command, vec!["grim", "{path}"]);
        assert!(HarnessConfig::default().screenshot_command.is_empty());
    }
}
