// ABOUTME: Build project: execution environment, least-privilege role and log group.
// ABOUTME: Role statements are checked against the registry, log and artifact services only.

use serde::Serialize;
use std::collections::BTreeMap;

use super::BuildSpec;
use crate::config::BuildConfig;
use crate::diagnostics::{Diagnostics, Warning};
use crate::error::ValidationError;
use crate::topology::{
    Effect, NodeConfig, PolicyStatement, ResourceNode, RoleConfig, Tags, TopologyBuilder,
    declare_role,
};
use crate::types::{BuildProjectHandle, LogGroupHandle, ResourceId, RoleHandle};

const BUILD_PRINCIPAL: &str = "codebuild.amazonaws.com";

/// Services a build role may hold permissions for: image registry, logs and
/// the artifact bucket.
const PERMITTED_SERVICES: [&str; 3] = ["ecr", "logs", "s3"];

/// Statement granting image push, log writes and artifact bucket access.
pub fn build_policy() -> PolicyStatement {
    PolicyStatement::allow(
        [
            "ecr:BatchCheckLayerAvailability",
            "ecr:CompleteLayerUpload",
            "ecr:GetAuthorizationToken",
            "ecr:InitiateLayerUpload",
            "ecr:PutImage",
            "ecr:UploadLayerPart",
            "logs:CreateLogGroup",
            "logs:CreateLogStream",
            "logs:PutLogEvents",
            "logs:DescribeLogStreams",
            "s3:ListObjects",
            "s3:GetObject",
            "s3:ListBucket",
            "s3:PutObject",
        ],
        ["*"],
    )
}

/// Reject wildcard or out-of-scope actions. Wildcard resources are allowed
/// but reported.
pub fn check_least_privilege(
    statements: &[PolicyStatement],
    diagnostics: &mut Diagnostics,
) -> Result<(), ValidationError> {
    for statement in statements.iter().filter(|s| s.effect == Effect::Allow) {
        for action in &statement.actions {
            let Some((service, operation)) = action.split_once(':') else {
                return Err(ValidationError::WildcardAction(action.clone()));
            };
            if operation.contains('*') || service.contains('*') {
                return Err(ValidationError::WildcardAction(action.clone()));
            }
            if !PERMITTED_SERVICES.contains(&service) {
                return Err(ValidationError::ActionOutOfScope {
                    action: action.clone(),
                });
            }
        }

        if statement.resources.iter().any(|r| r == "*") {
            diagnostics.warn(Warning::wildcard_resource(format!(
                "build role grants {} actions on every resource",
                statement.actions.len()
            )));
        }
    }
    Ok(())
}

/// Declare the role the build project runs as.
pub fn build_role(
    topology: &mut TopologyBuilder,
    id: &str,
    statements: Vec<PolicyStatement>,
    diagnostics: &mut Diagnostics,
) -> Result<RoleHandle, ValidationError> {
    check_least_privilege(&statements, diagnostics)?;
    declare_role(
        topology,
        id,
        RoleConfig {
            assumed_by: BUILD_PRINCIPAL.to_string(),
            managed_policies: Vec::new(),
            statements,
        },
    )
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogGroupConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention_days: Option<u32>,
}

pub fn create_log_group(
    topology: &mut TopologyBuilder,
    id: &str,
    config: LogGroupConfig,
) -> Result<LogGroupHandle, ValidationError> {
    let node = ResourceNode::new(
        ResourceId::new(id)?,
        Tags::for_application(topology.application()),
        NodeConfig::LogGroup(config),
    );
    topology.insert(node, &[])
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildEnvironment {
    pub build_image: String,
    pub compute_type: String,
    /// Needed to run the docker daemon inside the build.
    pub privileged: bool,
}

impl BuildEnvironment {
    pub fn from_config(config: &BuildConfig) -> Self {
        Self {
            build_image: config.build_image.clone(),
            compute_type: config.compute_type.clone(),
            privileged: config.privileged,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildProjectConfig {
    pub role: ResourceId,
    pub environment: BuildEnvironment,
    pub variables: BTreeMap<String, String>,
    pub build_spec: BuildSpec,
    pub log_group: ResourceId,
}

#[derive(Debug, Clone)]
pub struct BuildProject {
    handle: BuildProjectHandle,
    config: BuildProjectConfig,
}

impl BuildProject {
    pub fn handle(&self) -> &BuildProjectHandle {
        &self.handle
    }

    pub fn build_spec(&self) -> &BuildSpec {
        &self.config.build_spec
    }

    pub fn variables(&self) -> &BTreeMap<String, String> {
        &self.config.variables
    }

    pub fn environment(&self) -> &BuildEnvironment {
        &self.config.environment
    }
}

pub fn define_project(
    topology: &mut TopologyBuilder,
    id: &str,
    role: &RoleHandle,
    environment: BuildEnvironment,
    variables: BTreeMap<String, String>,
    build_spec: BuildSpec,
    log_group: &LogGroupHandle,
) -> Result<BuildProject, ValidationError> {
    let config = BuildProjectConfig {
        role: role.id().clone(),
        environment,
        variables,
        build_spec,
        log_group: log_group.id().clone(),
    };
    let node = ResourceNode::new(
        ResourceId::new(id)?,
        Tags::for_application(topology.application()),
        NodeConfig::BuildProject(config.clone()),
    );
    let handle = topology.insert(node, &[role.id(), log_group.id()])?;

    Ok(BuildProject { handle, config })
}
