// ABOUTME: Load balancer, listener and target group in front of the service.
// ABOUTME: Health check path and interval are validated when the check is built.

use nonempty::NonEmpty;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

use super::cluster::ServiceRef;
use super::{NetworkContext, NodeConfig, ResourceNode, Tags, TopologyBuilder, whole_seconds};
use crate::config::TargetHealthcheck;
use crate::error::ValidationError;
use crate::types::{
    ListenerHandle, LoadBalancerHandle, ResourceId, SecurityGroupHandle, TargetGroupHandle,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApplicationProtocol {
    Http,
    Https,
}

impl fmt::Display for ApplicationProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplicationProtocol::Http => write!(f, "HTTP"),
            ApplicationProtocol::Https => write!(f, "HTTPS"),
        }
    }
}

/// Target health check. Only constructible with a non-empty path and an
/// interval of one or more whole seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetHealthCheck {
    path: String,
    #[serde(rename = "interval_secs", serialize_with = "as_secs")]
    interval: Duration,
    enabled: bool,
}

fn as_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_secs())
}

impl TargetHealthCheck {
    pub fn new(path: &str, interval: Duration) -> Result<Self, ValidationError> {
        if path.trim().is_empty() {
            return Err(ValidationError::EmptyHealthCheckPath);
        }
        if whole_seconds("target health check interval", interval)? == 0 {
            return Err(ValidationError::ZeroInterval("target health check"));
        }
        Ok(Self {
            path: path.to_string(),
            interval,
            enabled: true,
        })
    }

    pub fn from_config(config: &TargetHealthcheck) -> Result<Self, ValidationError> {
        let mut check = Self::new(&config.path, config.interval)?;
        check.enabled = config.enabled;
        Ok(check)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadBalancerConfig {
    pub network_id: String,
    pub subnets: Vec<String>,
    pub security_group: ResourceId,
    pub internet_facing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListenerConfig {
    pub load_balancer: ResourceId,
    pub port: u16,
    pub protocol: ApplicationProtocol,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetGroupConfig {
    pub listener: ResourceId,
    pub port: u16,
    pub protocol: ApplicationProtocol,
    pub targets: Vec<TargetConfig>,
    pub health_check: TargetHealthCheck,
}

/// One registered backend: a service's container and port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetConfig {
    pub service: ResourceId,
    pub container_name: String,
    pub container_port: u16,
}

#[derive(Debug, Clone)]
pub struct Listener {
    handle: ListenerHandle,
    port: u16,
    protocol: ApplicationProtocol,
}

impl Listener {
    pub fn handle(&self) -> &ListenerHandle {
        &self.handle
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn protocol(&self) -> ApplicationProtocol {
        self.protocol
    }
}

#[derive(Debug, Clone)]
pub struct TargetGroup {
    handle: TargetGroupHandle,
    config: TargetGroupConfig,
}

impl TargetGroup {
    pub fn handle(&self) -> &TargetGroupHandle {
        &self.handle
    }

    pub fn config(&self) -> &TargetGroupConfig {
        &self.config
    }

    pub fn health_check(&self) -> &TargetHealthCheck {
        &self.config.health_check
    }
}

pub fn create_balancer(
    topology: &mut TopologyBuilder,
    id: &str,
    network: &NetworkContext,
    security_group: &SecurityGroupHandle,
    internet_facing: bool,
) -> Result<LoadBalancerHandle, ValidationError> {
    let node = ResourceNode::new(
        ResourceId::new(id)?,
        Tags::for_application(topology.application()),
        NodeConfig::LoadBalancer(LoadBalancerConfig {
            network_id: network.id().to_string(),
            subnets: network.subnets().to_vec(),
            security_group: security_group.id().clone(),
            internet_facing,
        }),
    );
    topology.insert(node, &[security_group.id()])
}

pub fn add_listener(
    topology: &mut TopologyBuilder,
    id: &str,
    balancer: &LoadBalancerHandle,
    port: u16,
    protocol: ApplicationProtocol,
) -> Result<Listener, ValidationError> {
    if port == 0 {
        return Err(ValidationError::PortRange { from: 0, to: 0 });
    }

    let node = ResourceNode::new(
        ResourceId::new(id)?,
        Tags::for_application(topology.application()),
        NodeConfig::Listener(ListenerConfig {
            load_balancer: balancer.id().clone(),
            port,
            protocol,
        }),
    );
    let handle = topology.insert(node, &[balancer.id()])?;

    Ok(Listener {
        handle,
        port,
        protocol,
    })
}

/// Register services as the listener's backends.
///
/// # Errors
///
/// Returns `ValidationError::StaticHostPort` when a service's task maps a
/// fixed host port: behind a target group only dynamic assignment works.
pub fn add_targets(
    topology: &mut TopologyBuilder,
    id: &str,
    listener: &Listener,
    targets: &NonEmpty<ServiceRef>,
    health_check: TargetHealthCheck,
) -> Result<TargetGroup, ValidationError> {
    if let Some(service) = targets.iter().find(|s| s.host_port() != 0) {
        return Err(ValidationError::StaticHostPort {
            service: service.handle().id().clone(),
            host_port: service.host_port(),
        });
    }

    let config = TargetGroupConfig {
        listener: listener.handle().id().clone(),
        port: listener.port(),
        protocol: listener.protocol(),
        targets: targets
            .iter()
            .map(|s| TargetConfig {
                service: s.handle().id().clone(),
                container_name: s.container_name().to_string(),
                container_port: s.container_port(),
            })
            .collect(),
        health_check,
    };

    let mut depends_on: Vec<&ResourceId> = vec![listener.handle().id()];
    depends_on.extend(targets.iter().map(|s| s.handle().id()));

    let node = ResourceNode::new(
        ResourceId::new(id)?,
        Tags::for_application(topology.application()),
        NodeConfig::TargetGroup(config.clone()),
    );
    let handle = topology.insert(node, &depends_on)?;

    Ok(TargetGroup { handle, config })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_check_requires_path() {
        let err = TargetHealthCheck::new("  ", Duration::from_secs(120)).unwrap_err();
        assert!(matches!(err, ValidationError::EmptyHealthCheckPath));
    }

    #[test]
    fn health_check_requires_interval() {
        let err = TargetHealthCheck::new("/status", Duration::ZERO).unwrap_err();
        assert!(matches!(err, ValidationError::ZeroInterval(_)));
    }

    #[test]
    fn health_check_rejects_sub_second_interval() {
        let err = TargetHealthCheck::new("/status", Duration::from_millis(500)).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::FractionalSeconds { value, .. } if value == Duration::from_millis(500)
        ));
        assert!(TargetHealthCheck::new("/status", Duration::from_millis(1500)).is_err());
    }

    #[test]
    fn health_check_from_default_config() {
        let check = TargetHealthCheck::from_config(&TargetHealthcheck::default()).unwrap();
        assert_eq!(check.path(), "/status");
        assert_eq!(check.interval(), Duration::from_secs(120));
        assert!(check.enabled());
    }

    #[test]
    fn health_check_serializes_seconds() {
        let check = TargetHealthCheck::new("/status", Duration::from_secs(120)).unwrap();
        let json = serde_json::to_value(&check).unwrap();
        assert_eq!(json["path"], "/status");
        assert_eq!(json["interval_secs"], 120);
    }
}
