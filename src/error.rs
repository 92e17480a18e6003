// ABOUTME: Application-wide error types for deckhand.
// ABOUTME: Synthesis-time failures are fail-fast; nothing partial is ever submitted.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::types::{ContainerName, ResourceId, ResourceIdError};

/// A required external input is missing or malformed.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("missing required value: {0}")]
    MissingValue(String),

    #[error("malformed value for {field}: {reason}")]
    Malformed { field: String, reason: String },

    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    NotFound(PathBuf),
}

/// A data-model invariant does not hold.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error(
        "capacity bounds must satisfy min <= desired <= max (min={min}, desired={desired}, max={max})"
    )]
    CapacityBounds { min: u32, desired: u32, max: u32 },

    #[error("health check path cannot be empty")]
    EmptyHealthCheckPath,

    #[error("{0} interval must be greater than zero")]
    ZeroInterval(&'static str),

    #[error("{what} must be a whole number of seconds, got {value:?}")]
    FractionalSeconds { what: &'static str, value: Duration },

    #[error("duplicate resource id: {0}")]
    DuplicateId(ResourceId),

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(#[from] ResourceIdError),

    #[error("dependency {dependency} of {consumer} is not declared in this topology")]
    UnknownDependency {
        consumer: ResourceId,
        dependency: ResourceId,
    },

    #[error("dependency cycle detected involving {0}")]
    CyclicDependency(ResourceId),

    #[error("resource {id} has application tag {found:?}, expected {expected:?}")]
    TagMismatch {
        id: ResourceId,
        expected: String,
        found: Option<String>,
    },

    #[error("ports {from}-{to} may only be opened to another security group, not to any IPv4")]
    OpenDynamicPorts { from: u16, to: u16 },

    #[error("invalid port range {from}-{to}")]
    PortRange { from: u16, to: u16 },

    #[error("service {service} uses static host port {host_port}; load-balanced targets need dynamic host ports")]
    StaticHostPort { service: ResourceId, host_port: u16 },

    #[error("container memory limit must be greater than zero")]
    ZeroMemory,

    #[error("deployment descriptor names container {found}, task definition declares {expected}")]
    DescriptorMismatch {
        expected: ContainerName,
        found: String,
    },

    #[error("malformed deployment descriptor: {0}")]
    MalformedDescriptor(String),

    #[error("policy statement grants wildcard action {0}")]
    WildcardAction(String),

    #[error("action {action} is outside the least-privilege scope of the build role")]
    ActionOutOfScope { action: String },

    #[error("action {action} consumes undeclared artifact {artifact}")]
    UndeclaredArtifact { action: String, artifact: String },

    #[error("action {action} declares artifact {artifact}, which an earlier action already produces")]
    DuplicateArtifact { action: String, artifact: String },

    #[error("action {action} does not belong in the {stage} stage")]
    WrongStage { action: String, stage: String },

    #[error("build specification must declare at least one artifact file")]
    NoArtifactFiles,
}

/// A referenced existing resource cannot be uniquely resolved.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("no network matches {0}")]
    NotFound(String),

    #[error("{count} networks match {selector}; selection is ambiguous")]
    Ambiguous { selector: String, count: usize },

    #[error("network {0} has no known subnets")]
    NoSubnets(String),
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Validation,
    Lookup,
    Io,
    Parse,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Configuration(_) => ErrorKind::Configuration,
            Error::Validation(_) => ErrorKind::Validation,
            Error::Lookup(_) => ErrorKind::Lookup,
            Error::Io(_) => ErrorKind::Io,
            Error::Yaml(_) | Error::Json(_) => ErrorKind::Parse,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
