// ABOUTME: Persistable pipeline run: current state, per-stage results and artifacts.
// ABOUTME: Stages run in order with a barrier between them; any failed action halts the run.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};

use super::{
    Action, ActionError, ActionExecutor, ActionKind, Artifact, DeploymentDescriptor,
    DeploymentRequest, PipelineDefinition, StageName,
};
use crate::error::Result;

/// Where a run is. `Failed` and `Aborted` absorb: nothing runs after them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineState {
    Source,
    Build,
    Deploy,
    Succeeded,
    Failed(StageName),
    Aborted(StageName),
}

impl PipelineState {
    /// The stage that runs next, if any.
    pub fn pending_stage(&self) -> Option<StageName> {
        match self {
            PipelineState::Source => Some(StageName::Source),
            PipelineState::Build => Some(StageName::Build),
            PipelineState::Deploy => Some(StageName::Deploy),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.pending_stage().is_none()
    }
}

impl From<StageName> for PipelineState {
    fn from(stage: StageName) -> Self {
        match stage {
            StageName::Source => PipelineState::Source,
            StageName::Build => PipelineState::Build,
            StageName::Deploy => PipelineState::Deploy,
        }
    }
}

/// The failing stage and action of a halted run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("pipeline failed at {stage} stage, action {action}: {reason}")]
pub struct PipelineStageFailure {
    pub stage: StageName,
    pub action: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActionOutcome {
    Succeeded,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub action: String,
    #[serde(flatten)]
    pub outcome: ActionOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageResult {
    pub stage: StageName,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub actions: Vec<ActionResult>,
}

impl StageResult {
    pub fn succeeded(&self) -> bool {
        self.actions
            .iter()
            .all(|a| a.outcome == ActionOutcome::Succeeded)
    }
}

/// One execution of a pipeline definition.
///
/// The record is plain data: an external engine can persist it between
/// stages and resume with [`PipelineRun::advance`] without re-running
/// completed stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRun {
    pipeline: String,
    state: PipelineState,
    started_by: String,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    stages: Vec<StageResult>,
    artifacts: Vec<Artifact>,
    failure: Option<PipelineStageFailure>,
}

impl PipelineRun {
    pub fn new(definition: &PipelineDefinition) -> Self {
        Self {
            pipeline: definition.name().to_string(),
            state: PipelineState::Source,
            started_by: gethostname::gethostname().to_string_lossy().into_owned(),
            started_at: Utc::now(),
            finished_at: None,
            stages: Vec::new(),
            artifacts: Vec::new(),
            failure: None,
        }
    }

    pub fn pipeline(&self) -> &str {
        &self.pipeline
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn started_by(&self) -> &str {
        &self.started_by
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Results of completed stages, in execution order.
    pub fn stages(&self) -> &[StageResult] {
        &self.stages
    }

    pub fn stage_result(&self, stage: StageName) -> Option<&StageResult> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    pub fn artifact(&self, name: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.name() == name)
    }

    pub fn failure(&self) -> Option<&PipelineStageFailure> {
        self.failure.as_ref()
    }

    /// Stop the run before its next stage starts. No effect once terminal.
    pub fn abort(&mut self) {
        if let Some(stage) = self.state.pending_stage() {
            tracing::info!(pipeline = %self.pipeline, %stage, "pipeline run aborted");
            self.state = PipelineState::Aborted(stage);
            self.finished_at = Some(Utc::now());
        }
    }

    /// Run the pending stage to completion and move to the next state.
    ///
    /// All actions of the stage run concurrently and all of them finish
    /// before the state changes.
    pub async fn advance<E>(&mut self, definition: &PipelineDefinition, executor: &E) -> PipelineState
    where
        E: ActionExecutor + ?Sized,
    {
        let Some(name) = self.state.pending_stage() else {
            return self.state;
        };
        let stage = definition.stage(name);

        tracing::info!(pipeline = %self.pipeline, stage = %name, actions = stage.actions().len(), "stage started");
        let started_at = Utc::now();

        let outcomes = {
            let artifacts = &self.artifacts;
            join_all(
                stage
                    .actions()
                    .iter()
                    .map(|action| execute(executor, action, name, artifacts)),
            )
            .await
        };

        let mut results = Vec::with_capacity(outcomes.len());
        let mut produced = Vec::new();
        let mut failure = None;

        for (action, outcome) in stage.actions().iter().zip(outcomes) {
            match outcome {
                Ok(artifact) => {
                    produced.extend(artifact);
                    results.push(ActionResult {
                        action: action.name().to_string(),
                        outcome: ActionOutcome::Succeeded,
                    });
                }
                Err(e) => {
                    tracing::warn!(stage = %name, action = action.name(), error = %e, "action failed");
                    let reason = e.to_string();
                    if failure.is_none() {
                        failure = Some(PipelineStageFailure {
                            stage: name,
                            action: action.name().to_string(),
                            reason: reason.clone(),
                        });
                    }
                    results.push(ActionResult {
                        action: action.name().to_string(),
                        outcome: ActionOutcome::Failed { reason },
                    });
                }
            }
        }

        self.stages.push(StageResult {
            stage: name,
            started_at,
            finished_at: Utc::now(),
            actions: results,
        });

        self.state = match failure {
            Some(failure) => {
                self.failure = Some(failure);
                PipelineState::Failed(name)
            }
            None => {
                self.artifacts.extend(produced);
                name.next()
                    .map(PipelineState::from)
                    .unwrap_or(PipelineState::Succeeded)
            }
        };

        if self.state.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
        tracing::info!(pipeline = %self.pipeline, stage = %name, state = ?self.state, "stage finished");
        self.state
    }

    /// Advance until the run succeeds, fails or is aborted.
    pub async fn run_to_completion<E>(
        &mut self,
        definition: &PipelineDefinition,
        executor: &E,
    ) -> PipelineState
    where
        E: ActionExecutor + ?Sized,
    {
        while !self.state.is_terminal() {
            self.advance(definition, executor).await;
        }
        self.state
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Run one action. Only the artifact the action declares as input, produced
/// by the stage right before this one, is visible to it.
async fn execute<E>(
    executor: &E,
    action: &Action,
    stage: StageName,
    artifacts: &[Artifact],
) -> std::result::Result<Option<Artifact>, ActionError>
where
    E: ActionExecutor + ?Sized,
{
    let input = match action.input() {
        Some(name) => Some(
            artifacts
                .iter()
                .find(|a| a.name() == name && Some(a.producing_stage()) == stage.previous())
                .ok_or_else(|| ActionError::MissingInput(name.to_string()))?,
        ),
        None => None,
    };

    match (action.kind(), input) {
        (ActionKind::Source { source, output }, _) => {
            let content = executor.checkout(action, source).await?;
            Ok(Some(Artifact::new(output, stage, content)))
        }
        (ActionKind::Build { project, output, .. }, Some(input)) => {
            let content = executor.build(action, project, input).await?;
            Ok(Some(Artifact::new(output, stage, content)))
        }
        (ActionKind::Deploy { service, .. }, Some(input)) => {
            let descriptor = DeploymentDescriptor::parse(input.content())?;
            descriptor.validate_for(service)?;
            executor
                .deploy(
                    action,
                    DeploymentRequest {
                        service: service.clone(),
                        descriptor,
                        artifact: input.clone(),
                    },
                )
                .await?;
            Ok(None)
        }
        (_, None) => Err(ActionError::Failed(format!(
            "action {} has no input artifact",
            action.name()
        ))),
    }
}
