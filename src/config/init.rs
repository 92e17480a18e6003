// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Creates deckhand.yml template files.

use std::path::Path;

use crate::error::{ConfigurationError, Result};
use crate::types::ApplicationName;

use super::{CONFIG_FILENAME, Config};

pub fn init_config(dir: &Path, application: Option<&str>, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(ConfigurationError::AlreadyExists(config_path).into());
    }

    let mut config = Config::template();

    if let Some(name) = application {
        config.application =
            ApplicationName::new(name).map_err(|e| ConfigurationError::Malformed {
                field: "application".to_string(),
                reason: e.to_string(),
            })?;
    }

    std::fs::write(&config_path, generate_template_yaml(&config))?;
    tracing::info!("wrote {}", config_path.display());

    Ok(())
}

fn generate_template_yaml(config: &Config) -> String {
    format!(
        r#"application: {}
image:
  repository: {}
  version: {}
container:
  name: {}
  memory_limit_mib: {}
  port: {}
  host_port: 0  # dynamic host port assignment behind the load balancer
capacity:
  min: {}
  desired: {}
  max: {}
load_balancer:
  healthcheck:
    path: {}
    interval: {}
network:
  default: true
# Cached network lookup results
networks:
  - id: vpc-00000000
    is_default: true
    subnets: [subnet-00000000, subnet-11111111]
source:
  owner:
    env: GH_ACCOUNT_OWNER
  repo:
    env: GH_REPO
  token:
    env: GH_SECRET
  branch: {}
environment:
  account:
    env: CDK_DEFAULT_ACCOUNT
  region:
    env: CDK_DEFAULT_REGION
"#,
        config.application,
        config.image.repository,
        config.image.version,
        config.container.name,
        config.container.memory_limit_mib,
        config.container.port,
        config.capacity.min,
        config.capacity.desired,
        config.capacity.max,
        config.load_balancer.healthcheck.path,
        format!("{}s", config.load_balancer.healthcheck.interval.as_secs()),
        config.source.branch,
    )
}
