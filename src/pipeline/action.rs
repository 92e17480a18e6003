// ABOUTME: Pipeline actions: repository checkout, build project run, service deploy.
// ABOUTME: The action kind fixes which stage it belongs to and which artifacts it touches.

use serde::Serialize;

use super::StageName;
use crate::topology::ServiceRef;
use crate::types::{BuildProjectHandle, SecretValue};

/// How a source change starts the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    Webhook,
    Poll,
    None,
}

/// Checkout of one branch of a hosted git repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitHubSource {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub token: SecretValue,
    pub trigger: Trigger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    Source {
        source: GitHubSource,
        output: String,
    },
    Build {
        project: BuildProjectHandle,
        input: String,
        output: String,
    },
    Deploy {
        service: ServiceRef,
        input: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    name: String,
    #[serde(flatten)]
    kind: ActionKind,
}

impl Action {
    pub fn source(name: &str, source: GitHubSource, output: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ActionKind::Source {
                source,
                output: output.to_string(),
            },
        }
    }

    pub fn build(name: &str, project: &BuildProjectHandle, input: &str, output: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ActionKind::Build {
                project: project.clone(),
                input: input.to_string(),
                output: output.to_string(),
            },
        }
    }

    pub fn deploy(name: &str, service: &ServiceRef, input: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ActionKind::Deploy {
                service: service.clone(),
                input: input.to_string(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    /// The only stage this action may appear in.
    pub fn stage(&self) -> StageName {
        match self.kind {
            ActionKind::Source { .. } => StageName::Source,
            ActionKind::Build { .. } => StageName::Build,
            ActionKind::Deploy { .. } => StageName::Deploy,
        }
    }

    pub fn input(&self) -> Option<&str> {
        match &self.kind {
            ActionKind::Source { .. } => None,
            ActionKind::Build { input, .. } | ActionKind::Deploy { input, .. } => Some(input),
        }
    }

    pub fn output(&self) -> Option<&str> {
        match &self.kind {
            ActionKind::Source { output, .. } | ActionKind::Build { output, .. } => Some(output),
            ActionKind::Deploy { .. } => None,
        }
    }
}
