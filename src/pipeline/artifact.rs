// ABOUTME: Opaque payloads handed from one pipeline stage to the next.
// ABOUTME: Each artifact remembers the stage that produced it.

use serde::{Deserialize, Serialize};

use super::StageName;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    name: String,
    producing_stage: StageName,
    content: Vec<u8>,
}

impl Artifact {
    pub fn new(name: &str, producing_stage: StageName, content: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            producing_stage,
            content,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn producing_stage(&self) -> StageName {
        self.producing_stage
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }
}
