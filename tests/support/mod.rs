// ABOUTME: Test support utilities.
// ABOUTME: Provides configuration fixtures and tracing setup for integration tests.

use deckhand::config::{Config, EnvValue};
use deckhand::topology::NetworkDescription;
use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("deckhand=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

#[allow(dead_code)]
pub fn network(id: &str, is_default: bool) -> NetworkDescription {
    NetworkDescription {
        id: id.to_string(),
        is_default,
        tags: Default::default(),
        subnets: vec![format!("{id}-subnet-a"), format!("{id}-subnet-b")],
    }
}

/// Defaults, one default network and literal deployment inputs.
#[allow(dead_code)]
pub fn config() -> Config {
    let mut config = Config::template();
    config.networks = vec![network("vpc-0a1b2c", true)];
    config.source.owner = EnvValue::Literal("woven".to_string());
    config.source.repo = EnvValue::Literal("demo-app".to_string());
    config.source.token = EnvValue::Literal("ghp_test_token".to_string());
    config.environment.account = EnvValue::Literal("123456789012".to_string());
    config.environment.region = EnvValue::Literal("ap-northeast-1".to_string());
    config
}

/// Same as [`config`] with a different application tag value.
#[allow(dead_code)]
pub fn config_for(application: &str) -> Config {
    let mut config = config();
    config.application = deckhand::types::ApplicationName::new(application).unwrap();
    config
}
