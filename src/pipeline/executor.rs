// ABOUTME: Capability trait the pipeline run drives to perform each action.
// ABOUTME: Implemented by an external engine, or locally for builds and tests.

use async_trait::async_trait;
use serde::Serialize;

use super::{Action, Artifact, DeploymentDescriptor, GitHubSource, PhaseName};
use crate::error::ValidationError;
use crate::topology::ServiceRef;
use crate::types::BuildProjectHandle;

/// Everything the deploy action needs, handed over in one piece.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentRequest {
    pub service: ServiceRef,
    pub descriptor: DeploymentDescriptor,
    /// The build artifact the descriptor was read from.
    pub artifact: Artifact,
}

/// Errors from a single action.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("{0}")]
    Failed(String),

    #[error("command `{command}` in {phase} phase exited with {status}")]
    CommandFailed {
        phase: PhaseName,
        command: String,
        status: String,
    },

    #[error("declared artifact file missing: {0}")]
    MissingArtifactFile(String),

    #[error("input artifact {0} was not produced")]
    MissingInput(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Performs pipeline actions. Returned bytes become the action's output artifact.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    /// Materialize the source artifact from a repository checkout.
    async fn checkout(&self, action: &Action, source: &GitHubSource)
    -> Result<Vec<u8>, ActionError>;

    /// Run the build project against the source artifact.
    async fn build(
        &self,
        action: &Action,
        project: &BuildProjectHandle,
        input: &Artifact,
    ) -> Result<Vec<u8>, ActionError>;

    /// Issue a deployment request against the service.
    async fn deploy(&self, action: &Action, request: DeploymentRequest) -> Result<(), ActionError>;
}
