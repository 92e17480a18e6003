// ABOUTME: Build specification: ordered shell command phases and declared artifact files.
// ABOUTME: Serialized as YAML in the fixed version/phases/artifacts shape.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::DESCRIPTOR_FILE;
use crate::config::Config;
use crate::error::{Result, ValidationError};
use crate::types::ImageRef;

const SPEC_VERSION: f64 = 0.2;

/// Registry host as seen by build commands, expanded by the shell.
const REGISTRY_HOST_EXPR: &str = "$AWS_ACCOUNT_ID.dkr.ecr.$AWS_DEFAULT_REGION.amazonaws.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseName {
    Install,
    PreBuild,
    Build,
    PostBuild,
}

impl PhaseName {
    /// Phases in execution order.
    pub const ALL: [PhaseName; 4] = [
        PhaseName::Install,
        PhaseName::PreBuild,
        PhaseName::Build,
        PhaseName::PostBuild,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseName::Install => "install",
            PhaseName::PreBuild => "pre_build",
            PhaseName::Build => "build",
            PhaseName::PostBuild => "post_build",
        }
    }
}

impl fmt::Display for PhaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    #[serde(default)]
    pub commands: Vec<String>,
}

impl Phase {
    pub fn new<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            commands: commands.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phases {
    #[serde(default)]
    pub install: Phase,
    #[serde(default)]
    pub pre_build: Phase,
    #[serde(default)]
    pub build: Phase,
    #[serde(default)]
    pub post_build: Phase,
}

impl Phases {
    pub fn get(&self, name: PhaseName) -> &Phase {
        match name {
            PhaseName::Install => &self.install,
            PhaseName::PreBuild => &self.pre_build,
            PhaseName::Build => &self.build,
            PhaseName::PostBuild => &self.post_build,
        }
    }

    /// Phases paired with their names, in execution order.
    pub fn in_order(&self) -> impl Iterator<Item = (PhaseName, &Phase)> {
        PhaseName::ALL.into_iter().map(move |name| (name, self.get(name)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifacts {
    pub files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildSpec {
    version: f64,
    phases: Phases,
    artifacts: Artifacts,
}

impl BuildSpec {
    /// # Errors
    ///
    /// Returns `ValidationError::NoArtifactFiles` when no output file is declared.
    pub fn new(phases: Phases, files: Vec<String>) -> std::result::Result<Self, ValidationError> {
        if files.iter().all(|f| f.trim().is_empty()) {
            return Err(ValidationError::NoArtifactFiles);
        }
        Ok(Self {
            version: SPEC_VERSION,
            phases,
            artifacts: Artifacts { files },
        })
    }

    /// Test, build and push the application image, then write the deployment
    /// descriptor naming the configured container.
    pub fn container_image(config: &Config) -> Self {
        let image = ImageRef::in_repository(
            Some(REGISTRY_HOST_EXPR),
            &config.image.repository,
            &config.image.version,
        );
        let container = &config.container.name;

        let phases = Phases {
            install: Phase::new([format!("n {}", config.build.node_version)]),
            pre_build: Phase::new([
                "echo 'Running tests'".to_string(),
                "npm install".to_string(),
                "npm run test".to_string(),
                "echo 'Logging into the image registry'".to_string(),
                format!(
                    "aws ecr get-login-password --region $AWS_DEFAULT_REGION | docker login --username AWS --password-stdin {REGISTRY_HOST_EXPR}"
                ),
            ]),
            build: Phase::new([
                "echo 'Building the docker image'".to_string(),
                format!("docker build -t {image} -f Dockerfile ."),
            ]),
            post_build: Phase::new([
                "echo 'Build complete'".to_string(),
                "echo 'Pushing the docker image'".to_string(),
                format!("docker push {image}"),
                format!("echo 'Generating {DESCRIPTOR_FILE} for the deploy stage'"),
                format!(
                    "echo '[{{\"name\":\"{container}\",\"imageUri\":\"'{image}'\"}}]' > {DESCRIPTOR_FILE}"
                ),
            ]),
        };

        Self {
            version: SPEC_VERSION,
            phases,
            artifacts: Artifacts {
                files: vec![DESCRIPTOR_FILE.to_string()],
            },
        }
    }

    pub fn version(&self) -> f64 {
        self.version
    }

    pub fn phases(&self) -> &Phases {
        &self.phases
    }

    pub fn artifact_files(&self) -> &[String] {
        &self.artifacts.files
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let parsed: BuildSpec = serde_yaml::from_str(yaml)?;
        let mut spec = Self::new(parsed.phases, parsed.artifacts.files)?;
        spec.version = parsed.version;
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_image_spec_matches_reference() {
        let spec = BuildSpec::container_image(&Config::template());

        assert_eq!(spec.version(), 0.2);
        assert_eq!(spec.phases().install.commands, vec!["n 14.16.1"]);
        assert_eq!(spec.artifact_files(), ["imagedefinitions.json".to_string()]);
        assert!(
            spec.phases()
                .build
                .commands
                .iter()
                .any(|c| c.contains("docker build -t $AWS_ACCOUNT_ID.dkr.ecr.$AWS_DEFAULT_REGION.amazonaws.com/woven-demo-app:latest"))
        );

        let last = spec.phases().post_build.commands.last().unwrap();
        assert!(last.contains("\"name\":\"DemoECSTaskDefContainer\""));
        assert!(last.ends_with("> imagedefinitions.json"));
    }

    #[test]
    fn phases_iterate_in_execution_order() {
        let spec = BuildSpec::container_image(&Config::template());
        let names: Vec<&str> = spec.phases().in_order().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["install", "pre_build", "build", "post_build"]);
    }

    #[test]
    fn spec_without_artifacts_is_rejected() {
        let err = BuildSpec::new(Phases::default(), Vec::new()).unwrap_err();
        assert!(matches!(err, ValidationError::NoArtifactFiles));
    }
}
