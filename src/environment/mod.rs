//! # Environments & Variables
//!
//! Named variable sets (dev / staging / prod) and `{{variable}}`
//! interpolation used to build the base URL of the service under test.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub key: String,
    pub value: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// An environment is a named set of variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub name: String,
    #[serde(default)]
    pub variables: Vec<Variable>,
}

#[derive(Debug, Clone, Default)]
pub struct EnvironmentManager {
    pub globals: Vec<Variable>,
    pub environments: Vec<Environment>,
    pub active_environment: Option<String>,
}

impl EnvironmentManager {
    /// Resolve all enabled variables into a flat map. Variables of the
    /// active environment override globals.
    pub fn resolve(&self) -> Result<HashMap<String, String>, ConfigError> {
        let mut resolved = HashMap::new();

        for var in self.globals.iter().filter(|v| v.enabled && !v.key.is_empty()) {
            resolved.insert(var.key.clone(), var.value.clone());
        }

        if let Some(active_name) = &self.active_environment {
            let env = self
                .environments
                .iter()
                .find(|e| &e.name == active_name)
                .ok_or_else(|| ConfigError::UnknownEnvironment(active_name.clone()))?;
            for var in env.variables.iter().filter(|v| v.enabled && !v.key.is_empty()) {
                resolved.insert(var.key.clone(), var.value.clone());
            }
        }

        Ok(resolved)
    }
}

/// Replace `{{key}}` placeholders. Unknown placeholders are left as-is.
pub fn interpolate(text: &str, variables: &HashMap<String, String>) -> String {
    let mut result = text.to_string();
    for (key, value) in variables {
        result = result.replace(&format!("{{{{{key}}}}}"), value);
    }
    result
}
