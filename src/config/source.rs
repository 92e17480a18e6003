// ABOUTME: Deployment-time inputs for the pipeline: source repository and target environment.
// ABOUTME: Resolves them into a DeploymentContext or fails with a ConfigurationError.

use serde::Deserialize;

use super::EnvValue;
use crate::error::ConfigurationError;
use crate::types::SecretValue;

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_owner")]
    pub owner: EnvValue,

    #[serde(default = "default_repo")]
    pub repo: EnvValue,

    #[serde(default = "default_token")]
    pub token: EnvValue,

    #[serde(default = "default_branch")]
    pub branch: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            repo: default_repo(),
            token: default_token(),
            branch: default_branch(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentConfig {
    #[serde(default = "default_account")]
    pub account: EnvValue,

    #[serde(default = "default_region")]
    pub region: EnvValue,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            account: default_account(),
            region: default_region(),
        }
    }
}

fn default_owner() -> EnvValue {
    EnvValue::from_env("GH_ACCOUNT_OWNER")
}

fn default_repo() -> EnvValue {
    EnvValue::from_env("GH_REPO")
}

fn default_token() -> EnvValue {
    EnvValue::from_env("GH_SECRET")
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_account() -> EnvValue {
    EnvValue::from_env("CDK_DEFAULT_ACCOUNT")
}

fn default_region() -> EnvValue {
    EnvValue::from_env("CDK_DEFAULT_REGION")
}

/// Resolved deployment-time inputs.
#[derive(Debug, Clone)]
pub struct DeploymentContext {
    pub repository_owner: String,
    pub repository_name: String,
    pub source_token: SecretValue,
    pub branch: String,
    pub account: String,
    pub region: String,
}

impl DeploymentContext {
    /// Resolve every input. The first missing value aborts resolution.
    pub fn resolve(
        source: &SourceConfig,
        environment: &EnvironmentConfig,
    ) -> Result<Self, ConfigurationError> {
        let branch = source.branch.trim();
        if branch.is_empty() {
            return Err(ConfigurationError::MissingValue("source.branch".to_string()));
        }

        let account = environment.account.resolve("environment.account")?;
        if !account.chars().all(|c| c.is_ascii_digit()) || account.len() != 12 {
            return Err(ConfigurationError::Malformed {
                field: "environment.account".to_string(),
                reason: "expected a 12-digit account id".to_string(),
            });
        }

        Ok(Self {
            repository_owner: source.owner.resolve("source.owner")?,
            repository_name: source.repo.resolve("source.repo")?,
            source_token: SecretValue::new(source.token.resolve("source.token")?),
            branch: branch.to_string(),
            account,
            region: environment.region.resolve("environment.region")?,
        })
    }
}
