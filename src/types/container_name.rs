// ABOUTME: Container name within a task definition.
// ABOUTME: Letters, digits, hyphens and underscores, up to 255 characters.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContainerNameError {
    #[error("container name cannot be empty")]
    Empty,

    #[error("container name exceeds maximum length of 255 characters")]
    TooLong,

    #[error("invalid character in container name: '{0}'")]
    InvalidChar(char),
}

/// Container name used when none is configured.
pub const DEFAULT_CONTAINER: &str = "DemoECSTaskDefContainer";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerName(String);

impl Default for ContainerName {
    fn default() -> Self {
        Self(DEFAULT_CONTAINER.to_string())
    }
}

impl ContainerName {
    pub fn new(value: &str) -> Result<Self, ContainerNameError> {
        if value.is_empty() {
            return Err(ContainerNameError::Empty);
        }
        if value.len() > 255 {
            return Err(ContainerNameError::TooLong);
        }
        if let Some(c) = value
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && *c != '-' && *c != '_')
        {
            return Err(ContainerNameError::InvalidChar(c));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for ContainerName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ContainerName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::new(&value).map_err(serde::de::Error::custom)
    }
}
