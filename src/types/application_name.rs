// ABOUTME: DNS-compatible application name validation.
// ABOUTME: The application name feeds every node's `application` tag.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApplicationNameError {
    #[error("application name cannot be empty")]
    Empty,

    #[error("application name exceeds maximum length of 63 characters")]
    TooLong,

    #[error("application name cannot start with a hyphen")]
    StartsWithHyphen,

    #[error("application name cannot end with a hyphen")]
    EndsWithHyphen,

    #[error("application name must be lowercase")]
    NotLowercase,

    #[error("invalid character in application name: '{0}'")]
    InvalidChar(char),
}

/// Application used when none is configured.
pub const DEFAULT_APPLICATION: &str = "woven-demo";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApplicationName(String);

impl Default for ApplicationName {
    fn default() -> Self {
        Self(DEFAULT_APPLICATION.to_string())
    }
}

impl ApplicationName {
    pub fn new(value: &str) -> Result<Self, ApplicationNameError> {
        if value.is_empty() {
            return Err(ApplicationNameError::Empty);
        }

        if value.len() > 63 {
            return Err(ApplicationNameError::TooLong);
        }

        if value.starts_with('-') {
            return Err(ApplicationNameError::StartsWithHyphen);
        }

        if value.ends_with('-') {
            return Err(ApplicationNameError::EndsWithHyphen);
        }

        for c in value.chars() {
            if c.is_ascii_uppercase() {
                return Err(ApplicationNameError::NotLowercase);
            }
            if !c.is_ascii_lowercase() && !c.is_ascii_digit() && c != '-' {
                return Err(ApplicationNameError::InvalidChar(c));
            }
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApplicationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for ApplicationName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ApplicationName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::new(&value).map_err(serde::de::Error::custom)
    }
}
