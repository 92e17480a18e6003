// ABOUTME: Image repository name validation.
// ABOUTME: Lowercase path components joined by single separators, 2-256 chars.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryNameError {
    #[error("repository name must be between 2 and 256 characters")]
    Length,

    #[error("invalid character in repository name: '{0}'")]
    InvalidChar(char),

    #[error("repository name must start and end with a lowercase letter or digit")]
    BadBoundary,

    #[error("repository name cannot contain consecutive separators")]
    ConsecutiveSeparators,
}

/// Repository used when none is configured.
pub const DEFAULT_REPOSITORY: &str = "woven-demo-app";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryName(String);

impl Default for RepositoryName {
    fn default() -> Self {
        Self(DEFAULT_REPOSITORY.to_string())
    }
}

fn is_separator(c: char) -> bool {
    matches!(c, '.' | '_' | '-' | '/')
}

impl RepositoryName {
    pub fn new(value: &str) -> Result<Self, RepositoryNameError> {
        if !(2..=256).contains(&value.len()) {
            return Err(RepositoryNameError::Length);
        }

        if let Some(c) = value
            .chars()
            .find(|c| !c.is_ascii_lowercase() && !c.is_ascii_digit() && !is_separator(*c))
        {
            return Err(RepositoryNameError::InvalidChar(c));
        }

        let starts_ok = value.chars().next().is_some_and(|c| !is_separator(c));
        let ends_ok = value.chars().last().is_some_and(|c| !is_separator(c));
        if !starts_ok || !ends_ok {
            return Err(RepositoryNameError::BadBoundary);
        }

        let doubled = value
            .as_bytes()
            .windows(2)
            .any(|w| is_separator(w[0] as char) && is_separator(w[1] as char));
        if doubled {
            return Err(RepositoryNameError::ConsecutiveSeparators);
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepositoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for RepositoryName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RepositoryName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::new(&value).map_err(serde::de::Error::custom)
    }
}
