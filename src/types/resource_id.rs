// ABOUTME: Validated construction identifier for topology nodes and stacks.
// ABOUTME: Replaces ad-hoc string literals with a checked, comparable key.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use thiserror::Error;

const MAX_LEN: usize = 255;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResourceIdError {
    #[error("resource id cannot be empty")]
    Empty,

    #[error("resource id exceeds maximum length of {MAX_LEN} characters")]
    TooLong,

    #[error("resource id must start with an ASCII letter: '{0}'")]
    InvalidStart(char),

    #[error("invalid character in resource id: '{0}'")]
    InvalidChar(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(value: &str) -> Result<Self, ResourceIdError> {
        let first = value.chars().next().ok_or(ResourceIdError::Empty)?;

        if value.len() > MAX_LEN {
            return Err(ResourceIdError::TooLong);
        }

        if !first.is_ascii_alphabetic() {
            return Err(ResourceIdError::InvalidStart(first));
        }

        if let Some(c) = value
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && *c != '-')
        {
            return Err(ResourceIdError::InvalidChar(c));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Borrow<str> for ResourceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Serialize for ResourceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::new(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_construct_style_ids() {
        assert!(ResourceId::new("DemoECSCluster").is_ok());
        assert!(ResourceId::new("TsukeAssets-CodeBuild-Action").is_ok());
        assert!(ResourceId::new("demoInstanceRole").is_ok());
    }

    #[test]
    fn rejects_leading_digit() {
        assert_eq!(
            ResourceId::new("1Cluster").unwrap_err(),
            ResourceIdError::InvalidStart('1')
        );
    }

    #[test]
    fn rejects_separators() {
        assert_eq!(
            ResourceId::new("Demo Cluster").unwrap_err(),
            ResourceIdError::InvalidChar(' ')
        );
        assert_eq!(
            ResourceId::new("Demo/Cluster").unwrap_err(),
            ResourceIdError::InvalidChar('/')
        );
    }

    #[test]
    fn rejects_empty_and_overlong() {
        assert_eq!(ResourceId::new("").unwrap_err(), ResourceIdError::Empty);
        assert_eq!(
            ResourceId::new(&"a".repeat(256)).unwrap_err(),
            ResourceIdError::TooLong
        );
        assert!(ResourceId::new(&"a".repeat(255)).is_ok());
    }
}
