// ABOUTME: Configuration types and parsing for deckhand.yml.
// ABOUTME: One explicit structure with documented defaults feeds every constructor.

mod env_value;
mod healthcheck;
mod init;
mod source;

pub use env_value::{EnvValue, resolve_env_map};
pub use healthcheck::{ContainerHealthcheck, TargetHealthcheck};
pub use init::init_config;
pub use source::{DeploymentContext, EnvironmentConfig, SourceConfig};

use crate::error::{ConfigurationError, Result};
use crate::topology::{HealthCheckKind, NetworkDescription, NetworkSelector};
use crate::types::{ApplicationName, ContainerName, RepositoryName};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "deckhand.yml";
pub const CONFIG_FILENAME_ALT: &str = "deckhand.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".deckhand/config.yml";

/// Everything a synthesis pass needs. Every section has defaults, so an empty
/// file describes the reference topology.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Value of the `application` tag on every declared node.
    #[serde(default = "default_application")]
    pub application: ApplicationName,

    #[serde(default)]
    pub image: ImageConfig,

    #[serde(default)]
    pub container: ContainerConfig,

    #[serde(default)]
    pub service: ServiceConfig,

    #[serde(default)]
    pub capacity: CapacityConfig,

    #[serde(default)]
    pub load_balancer: LoadBalancerConfig,

    /// Which existing network the topology attaches to.
    #[serde(default)]
    pub network: NetworkSelector,

    /// Cached lookup results the network selector is resolved against.
    #[serde(default)]
    pub networks: Vec<NetworkDescription>,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub environment: EnvironmentConfig,

    #[serde(default)]
    pub build: BuildConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageConfig {
    #[serde(default = "default_repository")]
    pub repository: RepositoryName,

    #[serde(default = "default_version")]
    pub version: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            repository: default_repository(),
            version: default_version(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContainerConfig {
    #[serde(default = "default_container_name")]
    pub name: ContainerName,

    #[serde(default = "default_memory_limit")]
    pub memory_limit_mib: u32,

    #[serde(default = "default_container_port")]
    pub port: u16,

    /// 0 requests dynamic host port assignment.
    #[serde(default)]
    pub host_port: u16,

    #[serde(default)]
    pub healthcheck: ContainerHealthcheck,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            name: default_container_name(),
            memory_limit_mib: default_memory_limit(),
            port: default_container_port(),
            host_port: 0,
            healthcheck: ContainerHealthcheck::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_desired_count")]
    pub desired_count: u32,

    #[serde(default = "default_grace_period", with = "humantime_serde")]
    pub health_check_grace_period: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            desired_count: default_desired_count(),
            health_check_grace_period: default_grace_period(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CapacityConfig {
    #[serde(default = "default_min_capacity")]
    pub min: u32,

    #[serde(default = "default_desired_capacity")]
    pub desired: u32,

    #[serde(default = "default_max_capacity")]
    pub max: u32,

    #[serde(default = "default_instance_type")]
    pub instance_type: String,

    #[serde(default)]
    pub health_check: HealthCheckKind,
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            min: default_min_capacity(),
            desired: default_desired_capacity(),
            max: default_max_capacity(),
            instance_type: default_instance_type(),
            health_check: HealthCheckKind::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoadBalancerConfig {
    #[serde(default = "default_listener_port")]
    pub port: u16,

    #[serde(default = "default_internet_facing")]
    pub internet_facing: bool,

    #[serde(default)]
    pub healthcheck: TargetHealthcheck,
}

impl Default for LoadBalancerConfig {
    fn default() -> Self {
        Self {
            port: default_listener_port(),
            internet_facing: default_internet_facing(),
            healthcheck: TargetHealthcheck::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildConfig {
    #[serde(default = "default_build_image")]
    pub build_image: String,

    #[serde(default = "default_compute_type")]
    pub compute_type: String,

    #[serde(default = "default_privileged")]
    pub privileged: bool,

    /// Node.js version installed before the test and build phases.
    #[serde(default = "default_node_version")]
    pub node_version: String,

    /// Extra environment variables for the build, in addition to account and region.
    #[serde(default)]
    pub variables: HashMap<String, EnvValue>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            build_image: default_build_image(),
            compute_type: default_compute_type(),
            privileged: default_privileged(),
            node_version: default_node_version(),
            variables: HashMap::new(),
        }
    }
}

fn default_application() -> ApplicationName {
    ApplicationName::default()
}

fn default_repository() -> RepositoryName {
    RepositoryName::default()
}

fn default_version() -> String {
    "latest".to_string()
}

fn default_container_name() -> ContainerName {
    ContainerName::default()
}

fn default_memory_limit() -> u32 {
    128
}

fn default_container_port() -> u16 {
    3000
}

fn default_desired_count() -> u32 {
    1
}

fn default_grace_period() -> Duration {
    Duration::from_secs(120)
}

fn default_min_capacity() -> u32 {
    1
}

fn default_desired_capacity() -> u32 {
    1
}

fn default_max_capacity() -> u32 {
    2
}

fn default_instance_type() -> String {
    "t2.nano".to_string()
}

fn default_listener_port() -> u16 {
    80
}

fn default_internet_facing() -> bool {
    true
}

fn default_build_image() -> String {
    "aws/codebuild/standard:4.0".to_string()
}

fn default_compute_type() -> String {
    "small".to_string()
}

fn default_privileged() -> bool {
    true
}

fn default_node_version() -> String {
    "14.16.1".to_string()
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document is a valid all-defaults configuration
        if yaml.trim().is_empty() {
            return Ok(Self::template());
        }
        let value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        if value.is_null() {
            return Ok(Self::template());
        }
        Ok(serde_yaml::from_value(value)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!("loading configuration from {}", path.display());
                return Self::load(path);
            }
        }

        Err(ConfigurationError::NotFound(dir.to_path_buf()).into())
    }

    /// Configuration with every default applied.
    pub fn template() -> Self {
        Config {
            application: default_application(),
            image: ImageConfig::default(),
            container: ContainerConfig::default(),
            service: ServiceConfig::default(),
            capacity: CapacityConfig::default(),
            load_balancer: LoadBalancerConfig::default(),
            network: NetworkSelector::default(),
            networks: Vec::new(),
            source: SourceConfig::default(),
            environment: EnvironmentConfig::default(),
            build: BuildConfig::default(),
        }
    }

    /// Resolve the deployment-time inputs the pipeline needs.
    pub fn deployment_context(&self) -> std::result::Result<DeploymentContext, ConfigurationError> {
        DeploymentContext::resolve(&self.source, &self.environment)
    }
}
