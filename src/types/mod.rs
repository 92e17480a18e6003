// ABOUTME: Type-safe handles and validated domain types.
// ABOUTME: Uses phantom types to prevent handle confusion at compile time.

mod application_name;
mod container_name;
mod id;
mod image_ref;
mod repository_name;
mod resource_id;
mod secret;

pub use application_name::{ApplicationName, ApplicationNameError, DEFAULT_APPLICATION};
pub use container_name::{ContainerName, ContainerNameError, DEFAULT_CONTAINER};
pub use id::{
    BuildProjectHandle, BuildProjectMarker, CapacityGroupHandle, CapacityGroupMarker,
    CapacityProviderHandle, CapacityProviderMarker, ClusterHandle, ClusterMarker, Handle,
    ListenerHandle, ListenerMarker, LoadBalancerHandle, LoadBalancerMarker, LogGroupHandle,
    LogGroupMarker, PipelineHandle, PipelineMarker, RepositoryHandle, RepositoryMarker,
    RoleHandle, RoleMarker, SecurityGroupHandle, SecurityGroupMarker, ServiceHandle,
    ServiceMarker, TargetGroupHandle, TargetGroupMarker, TaskDefinitionHandle,
    TaskDefinitionMarker,
};
pub use image_ref::{ImageRef, ParseImageRefError};
pub use repository_name::{DEFAULT_REPOSITORY, RepositoryName, RepositoryNameError};
pub use resource_id::{ResourceId, ResourceIdError};
pub use secret::SecretValue;
