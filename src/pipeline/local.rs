// ABOUTME: Runs a build specification on the local machine through the shell.
// ABOUTME: Phases run in order; the first non-zero exit aborts the build.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use tokio::process::Command;

use super::{ActionError, Artifact, BuildSpec};

/// Executes build specifications in a working directory with `sh -c`.
#[derive(Debug, Clone)]
pub struct LocalBuildRunner {
    workdir: PathBuf,
    env: BTreeMap<String, String>,
}

impl LocalBuildRunner {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            env: BTreeMap::new(),
        }
    }

    /// Set an environment variable for every command.
    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn envs(mut self, vars: &BTreeMap<String, String>) -> Self {
        self.env
            .extend(vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Run a Build-stage action: the input artifact is written into the
    /// working directory as a file named after the artifact, then the
    /// specification runs as in [`LocalBuildRunner::run`].
    pub async fn build(&self, spec: &BuildSpec, input: &Artifact) -> Result<Vec<u8>, ActionError> {
        let mut components = Path::new(input.name()).components();
        if !matches!((components.next(), components.next()), (Some(Component::Normal(_)), None)) {
            return Err(ActionError::Failed(format!(
                "input artifact {} cannot be staged as a file",
                input.name()
            )));
        }

        tokio::fs::create_dir_all(&self.workdir).await?;
        let path = self.workdir.join(input.name());
        tokio::fs::write(&path, input.content()).await?;
        tracing::debug!(artifact = input.name(), path = %path.display(), "staged input artifact");

        self.run(spec).await
    }

    /// Run every phase, then read the declared artifact files.
    ///
    /// Returns the content of the first declared file; the others only have to
    /// exist.
    ///
    /// # Errors
    ///
    /// Returns `ActionError::CommandFailed` for the first command that exits
    /// non-zero (later commands and phases do not run) and
    /// `ActionError::MissingArtifactFile` when a declared file was not written.
    pub async fn run(&self, spec: &BuildSpec) -> Result<Vec<u8>, ActionError> {
        for (phase, commands) in spec.phases().in_order() {
            tracing::debug!(%phase, commands = commands.commands.len(), "running build phase");
            for command in &commands.commands {
                let status = Command::new("sh")
                    .arg("-c")
                    .arg(command)
                    .current_dir(&self.workdir)
                    .envs(&self.env)
                    .status()
                    .await?;

                if !status.success() {
                    return Err(ActionError::CommandFailed {
                        phase,
                        command: command.clone(),
                        status: status.to_string(),
                    });
                }
            }
        }

        let mut primary = None;
        for file in spec.artifact_files() {
            let path = self.workdir.join(file);
            if !path.is_file() {
                return Err(ActionError::MissingArtifactFile(file.clone()));
            }
            if primary.is_none() {
                primary = Some(tokio::fs::read(&path).await?);
            }
        }

        primary.ok_or_else(|| ActionError::Failed("build declares no artifact files".to_string()))
    }
}
