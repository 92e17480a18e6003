// ABOUTME: Deployment descriptor emitted by the build stage and consumed by deploy.
// ABOUTME: Maps container names to registry-qualified image references.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::topology::ServiceRef;
use crate::types::{ContainerName, ImageRef};

/// File the build writes the descriptor to.
pub const DESCRIPTOR_FILE: &str = "imagedefinitions.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDefinition {
    pub name: String,
    #[serde(rename = "imageUri")]
    pub image_uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeploymentDescriptor(Vec<ImageDefinition>);

impl DeploymentDescriptor {
    pub fn for_container(container: &ContainerName, image: &ImageRef) -> Self {
        Self(vec![ImageDefinition {
            name: container.to_string(),
            image_uri: image.to_string(),
        }])
    }

    /// Parse descriptor JSON. Every entry needs a parseable image reference.
    pub fn parse(content: &[u8]) -> Result<Self, ValidationError> {
        let entries: Vec<ImageDefinition> = serde_json::from_slice(content)
            .map_err(|e| ValidationError::MalformedDescriptor(e.to_string()))?;
        if entries.is_empty() {
            return Err(ValidationError::MalformedDescriptor(
                "descriptor lists no containers".to_string(),
            ));
        }
        for entry in &entries {
            ImageRef::parse(&entry.image_uri).map_err(|e| {
                ValidationError::MalformedDescriptor(format!("{}: {e}", entry.name))
            })?;
        }
        Ok(Self(entries))
    }

    pub fn entries(&self) -> &[ImageDefinition] {
        &self.0
    }

    pub fn image_for(&self, container: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.name == container)
            .map(|e| e.image_uri.as_str())
    }

    /// Every entry must name the service's task container, exactly.
    pub fn validate_for(&self, service: &ServiceRef) -> Result<(), ValidationError> {
        let expected = service.container_name();
        match self.0.iter().find(|e| e.name != expected.as_str()) {
            Some(entry) => Err(ValidationError::DescriptorMismatch {
                expected: expected.clone(),
                found: entry.name.clone(),
            }),
            None => Ok(()),
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
