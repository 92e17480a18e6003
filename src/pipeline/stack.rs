// ABOUTME: Pipeline stack: build role, log group, build project and the pipeline node.
// ABOUTME: Deploys to the service exported by the application stack.

use nonempty::NonEmpty;
use serde::Serialize;
use std::collections::BTreeMap;

use super::{
    Action, BuildEnvironment, BuildProject, BuildSpec, GitHubSource, LogGroupConfig,
    PipelineBuilder, PipelineDefinition, Trigger, build_policy, build_role, create_log_group,
    define_project,
};
use crate::config::{Config, DeploymentContext, resolve_env_map};
use crate::diagnostics::Diagnostics;
use crate::error::{Result, ValidationError};
use crate::topology::{
    AppStack, NodeConfig, ResourceNode, SERVICE_OUTPUT, Tags, Topology, TopologyBuilder,
};
use crate::types::{PipelineHandle, ResourceId};

pub const PIPELINE_STACK: &str = "PipelineStack";

const PIPELINE_ID: &str = "DemoCodePipeline";
const SOURCE_OUTPUT: &str = "SourceOutput";
const BUILD_OUTPUT: &str = "BuildOutput";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineConfig {
    pub cross_account_keys: bool,
    pub definition: PipelineDefinition,
}

#[derive(Debug, Clone)]
pub struct PipelineStack {
    pub topology: Topology,
    pub pipeline: PipelineHandle,
    pub definition: PipelineDefinition,
    pub project: BuildProject,
}

/// Build the pipeline stack against an already built application stack.
pub fn pipeline_stack(
    config: &Config,
    context: &DeploymentContext,
    app: &AppStack,
    diagnostics: &mut Diagnostics,
) -> Result<PipelineStack> {
    let mut topology = TopologyBuilder::new(PIPELINE_STACK, &config.application)?;
    topology.import(app.service.stack(), SERVICE_OUTPUT);

    let role = build_role(
        &mut topology,
        "DemoCodeBuildRole",
        vec![build_policy()],
        diagnostics,
    )?;
    let logs = create_log_group(&mut topology, "DemoCodeBuildLogs", LogGroupConfig::default())?;

    let mut variables: BTreeMap<String, String> =
        resolve_env_map(&config.build.variables)?.into_iter().collect();
    variables.insert("AWS_DEFAULT_REGION".to_string(), context.region.clone());
    variables.insert("AWS_ACCOUNT_ID".to_string(), context.account.clone());

    let project = define_project(
        &mut topology,
        "TsukeAssets-CodeBuild-Action",
        &role,
        BuildEnvironment::from_config(&config.build),
        variables,
        BuildSpec::container_image(config),
        &logs,
    )?;

    let source = GitHubSource {
        owner: context.repository_owner.clone(),
        repo: context.repository_name.clone(),
        branch: context.branch.clone(),
        token: context.source_token.clone(),
        trigger: Trigger::Webhook,
    };

    let definition = PipelineBuilder::new(PIPELINE_ID)?
        .source(NonEmpty::new(Action::source(
            "DemoGitHubSourceAction",
            source,
            SOURCE_OUTPUT,
        )))?
        .build(NonEmpty::new(Action::build(
            "DemoCodeBuildAction",
            project.handle(),
            SOURCE_OUTPUT,
            BUILD_OUTPUT,
        )))?
        .deploy(NonEmpty::new(Action::deploy(
            "DemoCodeDeployAction",
            &app.service,
            BUILD_OUTPUT,
        )))?;

    let node = ResourceNode::new(
        ResourceId::new(PIPELINE_ID).map_err(ValidationError::from)?,
        Tags::for_application(topology.application()),
        NodeConfig::Pipeline(PipelineConfig {
            cross_account_keys: false,
            definition: definition.clone(),
        }),
    );
    let pipeline = topology.insert(node, &[project.handle().id()])?;

    Ok(PipelineStack {
        topology: topology.finish()?,
        pipeline,
        definition,
        project,
    })
}
