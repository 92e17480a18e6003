// ABOUTME: Health check configuration for containers and load balancer targets.
// ABOUTME: Defaults reproduce the reference topology (120s intervals, /status).

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Container-internal liveness probe run by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerHealthcheck {
    #[serde(default = "default_command")]
    pub command: Vec<String>,

    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    #[serde(default = "default_retries")]
    pub retries: u32,

    #[serde(default = "default_start_period", with = "humantime_serde")]
    pub start_period: Duration,
}

impl Default for ContainerHealthcheck {
    fn default() -> Self {
        Self {
            command: default_command(),
            interval: default_interval(),
            timeout: default_timeout(),
            retries: default_retries(),
            start_period: default_start_period(),
        }
    }
}

/// Load balancer target health check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetHealthcheck {
    #[serde(default = "default_path")]
    pub path: String,

    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for TargetHealthcheck {
    fn default() -> Self {
        Self {
            path: default_path(),
            interval: default_interval(),
            enabled: default_enabled(),
        }
    }
}

fn default_command() -> Vec<String> {
    vec!["CMD-SHELL".to_string(), "echo healthy || exit 1".to_string()]
}

fn default_interval() -> Duration {
    Duration::from_secs(120)
}

fn default_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_retries() -> u32 {
    3
}

fn default_start_period() -> Duration {
    Duration::from_secs(120)
}

fn default_path() -> String {
    "/status".to_string()
}

fn default_enabled() -> bool {
    true
}
