// ABOUTME: Pipeline stages and the type-state builder that fixes their order.
// ABOUTME: Source, then Build, then Deploy; other orders do not type-check.

use nonempty::NonEmpty;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Action;
use crate::error::ValidationError;
use crate::types::ResourceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageName {
    Source,
    Build,
    Deploy,
}

impl StageName {
    /// Stages in execution order.
    pub const ALL: [StageName; 3] = [StageName::Source, StageName::Build, StageName::Deploy];

    pub fn previous(self) -> Option<StageName> {
        match self {
            StageName::Source => None,
            StageName::Build => Some(StageName::Source),
            StageName::Deploy => Some(StageName::Build),
        }
    }

    pub fn next(self) -> Option<StageName> {
        match self {
            StageName::Source => Some(StageName::Build),
            StageName::Build => Some(StageName::Deploy),
            StageName::Deploy => None,
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageName::Source => write!(f, "Source"),
            StageName::Build => write!(f, "Build"),
            StageName::Deploy => write!(f, "Deploy"),
        }
    }
}

/// A named group of actions. Sibling actions may run concurrently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stage {
    name: StageName,
    actions: NonEmpty<Action>,
    inputs: Vec<String>,
    outputs: Vec<String>,
}

impl Stage {
    /// `available` holds the previous stage's outputs, `produced` every
    /// output of earlier stages. Artifact names are unique per pipeline.
    fn new(
        name: StageName,
        actions: NonEmpty<Action>,
        available: &[String],
        produced: &[String],
    ) -> Result<Self, ValidationError> {
        let mut inputs = Vec::new();
        let mut outputs = Vec::new();

        for action in actions.iter() {
            if action.stage() != name {
                return Err(ValidationError::WrongStage {
                    action: action.name().to_string(),
                    stage: name.to_string(),
                });
            }
            if let Some(input) = action.input() {
                if !available.iter().any(|a| a == input) {
                    return Err(ValidationError::UndeclaredArtifact {
                        action: action.name().to_string(),
                        artifact: input.to_string(),
                    });
                }
                if !inputs.iter().any(|i| i == input) {
                    inputs.push(input.to_string());
                }
            }
            if let Some(output) = action.output() {
                if produced.iter().chain(&outputs).any(|o| o == output) {
                    return Err(ValidationError::DuplicateArtifact {
                        action: action.name().to_string(),
                        artifact: output.to_string(),
                    });
                }
                outputs.push(output.to_string());
            }
        }

        Ok(Self {
            name,
            actions,
            inputs,
            outputs,
        })
    }

    pub fn name(&self) -> StageName {
        self.name
    }

    pub fn actions(&self) -> &NonEmpty<Action> {
        &self.actions
    }

    /// Artifacts consumed by this stage, all produced by the previous one.
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }
}

/// Builder state: no stage declared yet.
/// Available actions: `source()`
#[derive(Debug)]
pub struct Empty;

/// Builder state: source stage declared.
/// Available actions: `build()`
#[derive(Debug)]
pub struct Sourced {
    source: Stage,
}

/// Builder state: source and build stages declared.
/// Available actions: `deploy()`
#[derive(Debug)]
pub struct Built {
    source: Stage,
    build: Stage,
}

/// Declares the stages of a pipeline in their only valid order.
///
/// Each step consumes the builder and returns one in the next state:
/// `build()` exists only on `PipelineBuilder<Sourced>` and `deploy()` only on
/// `PipelineBuilder<Built>`, so a build stage cannot precede the source stage
/// and deploy cannot follow source directly.
#[derive(Debug)]
pub struct PipelineBuilder<S> {
    name: ResourceId,
    state: S,
}

impl PipelineBuilder<Empty> {
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            name: ResourceId::new(name)?,
            state: Empty,
        })
    }

    /// Declare the source stage. Its actions consume nothing.
    pub fn source(
        self,
        actions: NonEmpty<Action>,
    ) -> Result<PipelineBuilder<Sourced>, ValidationError> {
        let source = Stage::new(StageName::Source, actions, &[], &[])?;
        Ok(PipelineBuilder {
            name: self.name,
            state: Sourced { source },
        })
    }
}

impl PipelineBuilder<Sourced> {
    /// Declare the build stage. Its inputs must be source outputs.
    pub fn build(self, actions: NonEmpty<Action>) -> Result<PipelineBuilder<Built>, ValidationError> {
        let source_outputs = self.state.source.outputs();
        let build = Stage::new(StageName::Build, actions, source_outputs, source_outputs)?;
        Ok(PipelineBuilder {
            name: self.name,
            state: Built {
                source: self.state.source,
                build,
            },
        })
    }
}

impl PipelineBuilder<Built> {
    /// Declare the deploy stage and finish the pipeline. Its inputs must be
    /// build outputs.
    pub fn deploy(self, actions: NonEmpty<Action>) -> Result<PipelineDefinition, ValidationError> {
        let produced: Vec<String> = self
            .state
            .source
            .outputs()
            .iter()
            .chain(self.state.build.outputs())
            .cloned()
            .collect();
        let deploy = Stage::new(StageName::Deploy, actions, self.state.build.outputs(), &produced)?;
        Ok(PipelineDefinition {
            name: self.name,
            stages: [self.state.source, self.state.build, deploy],
        })
    }
}

/// A complete Source, Build, Deploy pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineDefinition {
    name: ResourceId,
    stages: [Stage; 3],
}

impl PipelineDefinition {
    pub fn name(&self) -> &ResourceId {
        &self.name
    }

    /// Stages in execution order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage(&self, name: StageName) -> &Stage {
        match name {
            StageName::Source => &self.stages[0],
            StageName::Build => &self.stages[1],
            StageName::Deploy => &self.stages[2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{GitHubSource, Trigger};
    use crate::types::SecretValue;

    fn checkout(output: &str) -> Action {
        Action::source(
            "Checkout",
            GitHubSource {
                owner: "acme".to_string(),
                repo: "demo".to_string(),
                branch: "main".to_string(),
                token: SecretValue::new("token"),
                trigger: Trigger::Webhook,
            },
            output,
        )
    }

    #[test]
    fn stage_order_is_fixed() {
        assert_eq!(StageName::Source.next(), Some(StageName::Build));
        assert_eq!(StageName::Build.next(), Some(StageName::Deploy));
        assert_eq!(StageName::Deploy.next(), None);
    }

    #[test]
    fn source_stage_records_outputs() {
        let sourced = PipelineBuilder::new("Pipeline")
            .unwrap()
            .source(NonEmpty::new(checkout("SourceOutput")))
            .unwrap();
        assert_eq!(sourced.state.source.outputs(), ["SourceOutput".to_string()]);
        assert!(sourced.state.source.inputs().is_empty());
    }

    #[test]
    fn sibling_outputs_must_differ() {
        let err = PipelineBuilder::new("Pipeline")
            .unwrap()
            .source(NonEmpty::from((checkout("SourceOutput"), vec![checkout("SourceOutput")])))
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::DuplicateArtifact { ref artifact, .. } if artifact == "SourceOutput"
        ));
    }

    #[test]
    fn stage_order_runs_backwards_too() {
        assert_eq!(StageName::Source.previous(), None);
        assert_eq!(StageName::Build.previous(), Some(StageName::Source));
        assert_eq!(StageName::Deploy.previous(), Some(StageName::Build));
    }

    #[test]
    fn source_action_rejected_in_other_stage() {
        let sourced = PipelineBuilder::new("Pipeline")
            .unwrap()
            .source(NonEmpty::new(checkout("SourceOutput")))
            .unwrap();
        let err = sourced
            .build(NonEmpty::new(checkout("Other")))
            .unwrap_err();
        assert!(matches!(err, ValidationError::WrongStage { .. }));
    }
}
