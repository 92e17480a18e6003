// ABOUTME: Deployment-time input values with environment interpolation.
// ABOUTME: Handles literal values and references to environment variables.

use crate::error::ConfigurationError;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    Literal(String),
    FromEnv {
        #[serde(rename = "env")]
        var: String,
        #[serde(default)]
        default: Option<String>,
    },
}

impl EnvValue {
    pub fn from_env(var: &str) -> Self {
        EnvValue::FromEnv {
            var: var.to_string(),
            default: None,
        }
    }

    /// Resolve the value. `name` identifies the input in the error when it is
    /// missing or empty.
    pub fn resolve(&self, name: &str) -> Result<String, ConfigurationError> {
        let value = match self {
            EnvValue::Literal(s) => Some(s.clone()),
            EnvValue::FromEnv { var, default } => {
                std::env::var(var).ok().or_else(|| default.clone())
            }
        };

        match value {
            Some(v) if !v.trim().is_empty() => Ok(v),
            _ => Err(ConfigurationError::MissingValue(self.describe(name))),
        }
    }

    fn describe(&self, name: &str) -> String {
        match self {
            EnvValue::Literal(_) => name.to_string(),
            EnvValue::FromEnv { var, .. } => format!("{name} (environment variable {var})"),
        }
    }
}

pub fn resolve_env_map(
    map: &HashMap<String, EnvValue>,
) -> Result<HashMap<String, String>, ConfigurationError> {
    map.iter()
        .map(|(k, v)| v.resolve(k).map(|resolved| (k.clone(), resolved)))
        .collect()
}
