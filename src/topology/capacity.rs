// ABOUTME: Autoscaling capacity group that hosts container instances.
// ABOUTME: Validates min <= desired <= max and binds an image-pull instance role.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::iam::{RoleConfig, declare_role};
use super::{NetworkContext, NodeConfig, ResourceNode, Tags, TopologyBuilder};
use crate::error::ValidationError;
use crate::types::{CapacityGroupHandle, ResourceId, RoleHandle, SecurityGroupHandle};

const INSTANCE_PRINCIPAL: &str = "ec2.amazonaws.com";
const REGISTRY_READ_ONLY: &str = "AmazonEC2ContainerRegistryReadOnly";
const MACHINE_IMAGE: &str = "ecs-optimized-amazon-linux-2";

/// Scaling bounds. Always satisfies `min <= desired <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapacityBounds {
    min: u32,
    desired: u32,
    max: u32,
}

impl CapacityBounds {
    pub fn new(min: u32, desired: u32, max: u32) -> Result<Self, ValidationError> {
        if min > desired || desired > max {
            return Err(ValidationError::CapacityBounds { min, desired, max });
        }
        Ok(Self { min, desired, max })
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn desired(&self) -> u32 {
        self.desired
    }

    pub fn max(&self) -> u32 {
        self.max
    }
}

/// Instance-level health checking. Container health is the orchestrator's job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthCheckKind {
    #[default]
    Ec2,
    Elb,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceType(String);

impl InstanceType {
    pub fn new(value: &str) -> Self {
        Self(value.trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Memory of well-known burstable sizes, in MiB.
    pub fn memory_mib(&self) -> Option<u32> {
        let (family, size) = self.0.split_once('.')?;
        if !matches!(family, "t2" | "t3" | "t3a" | "t4g") {
            return None;
        }
        match size {
            "nano" => Some(512),
            "micro" => Some(1024),
            "small" => Some(2048),
            "medium" => Some(4096),
            "large" => Some(8192),
            "xlarge" => Some(16384),
            "2xlarge" => Some(32768),
            _ => None,
        }
    }
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapacityGroupConfig {
    pub network_id: String,
    pub subnets: Vec<String>,
    pub instance_type: InstanceType,
    pub machine_image: String,
    pub security_group: ResourceId,
    pub role: ResourceId,
    #[serde(flatten)]
    pub bounds: CapacityBounds,
    pub health_check: HealthCheckKind,
}

/// A declared capacity group and the facts placement checks need.
#[derive(Debug, Clone)]
pub struct CapacityGroup {
    handle: CapacityGroupHandle,
    bounds: CapacityBounds,
    instance_type: InstanceType,
}

impl CapacityGroup {
    pub fn handle(&self) -> &CapacityGroupHandle {
        &self.handle
    }

    pub fn bounds(&self) -> CapacityBounds {
        self.bounds
    }

    pub fn instance_type(&self) -> &InstanceType {
        &self.instance_type
    }
}

/// Role instances assume to pull images from the registry.
pub fn instance_role(
    topology: &mut TopologyBuilder,
    id: &str,
) -> Result<RoleHandle, ValidationError> {
    declare_role(
        topology,
        id,
        RoleConfig {
            assumed_by: INSTANCE_PRINCIPAL.to_string(),
            managed_policies: vec![REGISTRY_READ_ONLY.to_string()],
            statements: Vec::new(),
        },
    )
}

/// Declare the autoscaling group.
#[allow(clippy::too_many_arguments)]
pub fn provision(
    topology: &mut TopologyBuilder,
    id: &str,
    network: &NetworkContext,
    security_group: &SecurityGroupHandle,
    instance_role: &RoleHandle,
    instance_type: InstanceType,
    bounds: CapacityBounds,
    health_check: HealthCheckKind,
) -> Result<CapacityGroup, ValidationError> {
    let config = CapacityGroupConfig {
        network_id: network.id().to_string(),
        subnets: network.subnets().to_vec(),
        instance_type: instance_type.clone(),
        machine_image: MACHINE_IMAGE.to_string(),
        security_group: security_group.id().clone(),
        role: instance_role.id().clone(),
        bounds,
        health_check,
    };

    let node = ResourceNode::new(
        ResourceId::new(id)?,
        Tags::for_application(topology.application()),
        NodeConfig::CapacityGroup(config),
    );
    let handle = topology.insert(node, &[security_group.id(), instance_role.id()])?;

    Ok(CapacityGroup {
        handle,
        bounds,
        instance_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_accept_ordered_values() {
        let bounds = CapacityBounds::new(1, 1, 2).unwrap();
        assert_eq!((bounds.min(), bounds.desired(), bounds.max()), (1, 1, 2));
        assert!(CapacityBounds::new(0, 0, 0).is_ok());
    }

    #[test]
    fn bounds_reject_desired_above_max() {
        let err = CapacityBounds::new(1, 3, 2).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::CapacityBounds {
                min: 1,
                desired: 3,
                max: 2
            }
        ));
    }

    #[test]
    fn bounds_reject_desired_below_min() {
        assert!(CapacityBounds::new(2, 1, 3).is_err());
    }

    #[test]
    fn instance_memory_lookup() {
        assert_eq!(InstanceType::new("t2.nano").memory_mib(), Some(512));
        assert_eq!(InstanceType::new("T3.Micro").memory_mib(), Some(1024));
        assert_eq!(InstanceType::new("m5.large").memory_mib(), None);
        assert_eq!(InstanceType::new("bogus").memory_mib(), None);
    }
}
