// ABOUTME: Roles and policy statements attached to compute and build resources.
// ABOUTME: A role is its own tagged node; consumers depend on it.

use serde::Serialize;

use super::{NodeConfig, ResourceNode, Tags, TopologyBuilder};
use crate::error::ValidationError;
use crate::types::{ResourceId, RoleHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Effect {
    Allow,
    Deny,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyStatement {
    pub effect: Effect,
    pub actions: Vec<String>,
    pub resources: Vec<String>,
}

impl PolicyStatement {
    pub fn allow<A, R>(actions: A, resources: R) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            effect: Effect::Allow,
            actions: actions.into_iter().map(Into::into).collect(),
            resources: resources.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleConfig {
    /// Service principal allowed to assume the role.
    pub assumed_by: String,
    pub managed_policies: Vec<String>,
    pub statements: Vec<PolicyStatement>,
}

/// Declare a role node tagged for the topology's application.
pub fn declare_role(
    topology: &mut TopologyBuilder,
    id: &str,
    role: RoleConfig,
) -> Result<RoleHandle, ValidationError> {
    let tags = Tags::for_application(topology.application());
    let node = ResourceNode::new(ResourceId::new(id)?, tags, NodeConfig::Role(role));
    topology.insert(node, &[])
}
