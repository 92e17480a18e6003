// ABOUTME: Source, Build, Deploy pipeline: stage definitions, build project and runs.
// ABOUTME: Definitions are declared at synthesis time; runs are driven by an executor.

mod action;
mod artifact;
mod buildspec;
mod descriptor;
mod executor;
mod local;
mod project;
mod run;
mod stack;
mod stage;

pub use action::{Action, ActionKind, GitHubSource, Trigger};
pub use artifact::Artifact;
pub use buildspec::{Artifacts, BuildSpec, Phase, PhaseName, Phases};
pub use descriptor::{DESCRIPTOR_FILE, DeploymentDescriptor, ImageDefinition};
pub use executor::{ActionError, ActionExecutor, DeploymentRequest};
pub use local::LocalBuildRunner;
pub use project::{
    BuildEnvironment, BuildProject, BuildProjectConfig, LogGroupConfig, build_policy, build_role,
    check_least_privilege, create_log_group, define_project,
};
pub use run::{
    ActionOutcome, ActionResult, PipelineRun, PipelineStageFailure, PipelineState, StageResult,
};
pub use stack::{PIPELINE_STACK, PipelineConfig, PipelineStack, pipeline_stack};
pub use stage::{Built, Empty, PipelineBuilder, PipelineDefinition, Sourced, Stage, StageName};
