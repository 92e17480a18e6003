// ABOUTME: One synthesis pass: resources, application and pipeline stacks from configuration.
// ABOUTME: All-or-nothing; the first error discards everything built so far.

use serde::Serialize;

use crate::config::Config;
use crate::diagnostics::{Diagnostics, Warning};
use crate::error::Result;
use crate::pipeline::{PipelineDefinition, pipeline_stack};
use crate::topology::{Topology, app_stack, resources_stack};

/// Result of a successful synthesis pass.
#[derive(Debug)]
pub struct Synthesis {
    /// Stacks in submission order.
    pub stacks: Vec<Topology>,
    pub pipeline: PipelineDefinition,
    pub diagnostics: Diagnostics,
}

#[derive(Serialize)]
struct Template<'a> {
    stacks: &'a [Topology],
    warnings: &'a [Warning],
}

impl Synthesis {
    pub fn stack(&self, name: &str) -> Option<&Topology> {
        self.stacks.iter().find(|s| s.name().as_str() == name)
    }

    pub fn to_json(&self) -> Result<String> {
        let template = Template {
            stacks: &self.stacks,
            warnings: self.diagnostics.warnings(),
        };
        Ok(serde_json::to_string_pretty(&template)?)
    }
}

/// Synthesize every stack. Deployment inputs are resolved first so a missing
/// value fails before any topology is built.
pub fn synthesize(config: &Config) -> Result<Synthesis> {
    let context = config.deployment_context()?;
    let mut diagnostics = Diagnostics::default();

    let resources = resources_stack(config)?;
    let app = app_stack(config, &mut diagnostics)?;
    let pipeline = pipeline_stack(config, &context, &app, &mut diagnostics)?;

    tracing::info!(
        application = %config.application,
        warnings = diagnostics.warnings().len(),
        "synthesis complete"
    );

    Ok(Synthesis {
        stacks: vec![resources, app.topology, pipeline.topology],
        pipeline: pipeline.definition,
        diagnostics,
    })
}
