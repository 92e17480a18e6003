// ABOUTME: Orchestration cluster, capacity provider, task definition and service.
// ABOUTME: The service handle is what load balancer targets and deploy actions point at.

use serde::Serialize;
use std::time::Duration;

use super::capacity::CapacityGroup;
use super::{NetworkContext, NodeConfig, ResourceNode, Tags, TopologyBuilder, whole_seconds};
use crate::config::{Config, ContainerHealthcheck};
use crate::error::ValidationError;
use crate::types::{
    CapacityProviderHandle, ClusterHandle, ContainerName, ImageRef, ResourceId, ServiceHandle,
    TaskDefinitionHandle,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterConfig {
    pub network_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapacityProviderConfig {
    pub cluster: ResourceId,
    pub capacity_group: ResourceId,
}

/// Container to host port mapping. A host port of 0 asks the orchestrator to
/// pick one from the dynamic range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PortMapping {
    pub container_port: u16,
    pub host_port: u16,
    pub protocol: &'static str,
}

impl PortMapping {
    pub fn new(container_port: u16, host_port: u16) -> Self {
        Self {
            container_port,
            host_port,
            protocol: "tcp",
        }
    }

    pub fn dynamic(container_port: u16) -> Self {
        Self::new(container_port, 0)
    }

    pub fn is_dynamic(&self) -> bool {
        self.host_port == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogConfiguration {
    pub driver: String,
    pub stream_prefix: String,
}

/// One container's image, limits, port mapping and liveness probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerSpec {
    pub name: ContainerName,
    pub image: ImageRef,
    pub memory_limit_mib: u32,
    pub port_mapping: PortMapping,
    #[serde(with = "container_healthcheck")]
    pub health_check: ContainerHealthcheck,
    pub logging: LogConfiguration,
}

impl ContainerSpec {
    /// Container described by the configuration, pulling from the configured repository.
    pub fn from_config(config: &Config) -> Self {
        Self {
            name: config.container.name.clone(),
            image: ImageRef::in_repository(None, &config.image.repository, &config.image.version),
            memory_limit_mib: config.container.memory_limit_mib,
            port_mapping: PortMapping::new(config.container.port, config.container.host_port),
            health_check: config.container.healthcheck.clone(),
            logging: LogConfiguration {
                driver: "awslogs".to_string(),
                stream_prefix: config.application.to_string(),
            },
        }
    }
}

mod container_healthcheck {
    use super::ContainerHealthcheck;
    use serde::Serialize;
    use serde::Serializer;

    #[derive(Serialize)]
    struct Seconds<'a> {
        command: &'a [String],
        interval_secs: u64,
        timeout_secs: u64,
        retries: u32,
        start_period_secs: u64,
    }

    pub fn serialize<S: Serializer>(hc: &ContainerHealthcheck, s: S) -> Result<S::Ok, S::Error> {
        Seconds {
            command: &hc.command,
            interval_secs: hc.interval.as_secs(),
            timeout_secs: hc.timeout.as_secs(),
            retries: hc.retries,
            start_period_secs: hc.start_period.as_secs(),
        }
        .serialize(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskDefinitionConfig {
    pub containers: Vec<ContainerSpec>,
}

#[derive(Debug, Clone)]
pub struct TaskDefinition {
    handle: TaskDefinitionHandle,
    container: ContainerSpec,
}

impl TaskDefinition {
    pub fn handle(&self) -> &TaskDefinitionHandle {
        &self.handle
    }

    pub fn container(&self) -> &ContainerSpec {
        &self.container
    }

    pub fn port_mapping(&self) -> PortMapping {
        self.container.port_mapping
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceConfig {
    pub cluster: ResourceId,
    pub task_definition: ResourceId,
    pub capacity_provider: ResourceId,
    pub desired_count: u32,
    pub health_check_grace_period_secs: u64,
}

/// Stable reference to the running service.
///
/// Shared by the load balancer target group and the deploy stage. Carries the
/// container facts both need so neither has to reach back into the topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceRef {
    stack: ResourceId,
    service: ServiceHandle,
    cluster: ClusterHandle,
    container_name: ContainerName,
    container_port: u16,
    host_port: u16,
    desired_count: u32,
}

impl ServiceRef {
    pub fn stack(&self) -> &ResourceId {
        &self.stack
    }

    pub fn handle(&self) -> &ServiceHandle {
        &self.service
    }

    pub fn cluster(&self) -> &ClusterHandle {
        &self.cluster
    }

    pub fn container_name(&self) -> &ContainerName {
        &self.container_name
    }

    pub fn container_port(&self) -> u16 {
        self.container_port
    }

    pub fn host_port(&self) -> u16 {
        self.host_port
    }

    pub fn desired_count(&self) -> u32 {
        self.desired_count
    }
}

/// Whether the capacity group can hold every desired task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementStatus {
    Placed { task_slots: u32 },
    Degraded { task_slots: u32, desired: u32 },
    /// Instance memory is unknown, so nothing can be said.
    Unknown,
}

impl PlacementStatus {
    /// Task slots at maximum capacity versus the service's desired count.
    pub fn evaluate(service: &ServiceRef, task: &TaskDefinition, capacity: &CapacityGroup) -> Self {
        let Some(instance_memory) = capacity.instance_type().memory_mib() else {
            return PlacementStatus::Unknown;
        };
        let per_instance = instance_memory / task.container().memory_limit_mib.max(1);
        let task_slots = per_instance.saturating_mul(capacity.bounds().max());

        if service.desired_count() > task_slots {
            PlacementStatus::Degraded {
                task_slots,
                desired: service.desired_count(),
            }
        } else {
            PlacementStatus::Placed { task_slots }
        }
    }
}

pub fn create_cluster(
    topology: &mut TopologyBuilder,
    id: &str,
    network: &NetworkContext,
) -> Result<ClusterHandle, ValidationError> {
    let node = ResourceNode::new(
        ResourceId::new(id)?,
        Tags::for_application(topology.application()),
        NodeConfig::Cluster(ClusterConfig {
            network_id: network.id().to_string(),
        }),
    );
    topology.insert(node, &[])
}

/// Let the cluster draw instances from a capacity group.
pub fn attach_capacity(
    topology: &mut TopologyBuilder,
    id: &str,
    cluster: &ClusterHandle,
    capacity: &CapacityGroup,
) -> Result<CapacityProviderHandle, ValidationError> {
    let node = ResourceNode::new(
        ResourceId::new(id)?,
        Tags::for_application(topology.application()),
        NodeConfig::CapacityProvider(CapacityProviderConfig {
            cluster: cluster.id().clone(),
            capacity_group: capacity.handle().id().clone(),
        }),
    );
    topology.insert(node, &[cluster.id(), capacity.handle().id()])
}

pub fn define_task(
    topology: &mut TopologyBuilder,
    id: &str,
    container: ContainerSpec,
) -> Result<TaskDefinition, ValidationError> {
    if container.memory_limit_mib == 0 {
        return Err(ValidationError::ZeroMemory);
    }
    let health_check = &container.health_check;
    if whole_seconds("container health check interval", health_check.interval)? == 0 {
        return Err(ValidationError::ZeroInterval("container health check"));
    }
    whole_seconds("container health check timeout", health_check.timeout)?;
    whole_seconds("container health check start period", health_check.start_period)?;

    let node = ResourceNode::new(
        ResourceId::new(id)?,
        Tags::for_application(topology.application()),
        NodeConfig::TaskDefinition(TaskDefinitionConfig {
            containers: vec![container.clone()],
        }),
    );
    let handle = topology.insert(node, &[])?;

    Ok(TaskDefinition { handle, container })
}

/// Run the task definition on the cluster. The grace period suppresses
/// liveness failures while the container starts.
pub fn create_service(
    topology: &mut TopologyBuilder,
    id: &str,
    cluster: &ClusterHandle,
    provider: &CapacityProviderHandle,
    task: &TaskDefinition,
    desired_count: u32,
    health_check_grace_period: Duration,
) -> Result<ServiceRef, ValidationError> {
    let grace_period_secs = whole_seconds("service health check grace period", health_check_grace_period)?;
    let node = ResourceNode::new(
        ResourceId::new(id)?,
        Tags::for_application(topology.application()),
        NodeConfig::Service(ServiceConfig {
            cluster: cluster.id().clone(),
            task_definition: task.handle().id().clone(),
            capacity_provider: provider.id().clone(),
            desired_count,
            health_check_grace_period_secs: grace_period_secs,
        }),
    );
    let service = topology.insert(node, &[cluster.id(), task.handle().id(), provider.id()])?;

    Ok(ServiceRef {
        stack: topology.name().clone(),
        service,
        cluster: cluster.clone(),
        container_name: task.container().name.clone(),
        container_port: task.port_mapping().container_port,
        host_port: task.port_mapping().host_port,
        desired_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_host_port_is_dynamic() {
        let mapping = PortMapping::new(3000, 0);
        assert!(mapping.is_dynamic());
        assert_eq!(mapping, PortMapping::dynamic(3000));
        assert!(!PortMapping::new(3000, 8080).is_dynamic());
    }

    #[test]
    fn container_spec_uses_configured_defaults() {
        let spec = ContainerSpec::from_config(&Config::template());
        assert_eq!(spec.name.as_str(), "DemoECSTaskDefContainer");
        assert_eq!(spec.image.to_string(), "woven-demo-app:latest");
        assert_eq!(spec.memory_limit_mib, 128);
        assert_eq!(spec.port_mapping.container_port, 3000);
        assert!(spec.port_mapping.is_dynamic());
        assert_eq!(spec.logging.stream_prefix, "woven-demo");
    }
}
