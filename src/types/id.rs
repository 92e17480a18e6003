// ABOUTME: Phantom-typed handles to nodes declared in a topology.
// ABOUTME: Prevents passing a security group handle where a cluster is expected.

use serde::{Serialize, Serializer};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use super::ResourceId;

/// Marker types for phantom type parameters.
/// Using empty enums prevents instantiation and requires no trait bounds.
pub enum SecurityGroupMarker {}
pub enum RoleMarker {}
pub enum CapacityGroupMarker {}
pub enum ClusterMarker {}
pub enum CapacityProviderMarker {}
pub enum TaskDefinitionMarker {}
pub enum ServiceMarker {}
pub enum LoadBalancerMarker {}
pub enum ListenerMarker {}
pub enum TargetGroupMarker {}
pub enum RepositoryMarker {}
pub enum LogGroupMarker {}
pub enum BuildProjectMarker {}
pub enum PipelineMarker {}

/// A handle to a node that has been committed to a topology.
///
/// Handles are only produced by the constructors that add the node, so holding
/// one proves the referenced node exists. The phantom parameter keeps handles of
/// different resource kinds from being swapped at compile time.
#[must_use = "handles reference declared resources and should not be ignored"]
pub struct Handle<T> {
    id: ResourceId,
    _marker: PhantomData<T>,
}

impl<T> Handle<T> {
    pub(crate) fn new(id: ResourceId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    pub fn as_str(&self) -> &str {
        self.id.as_str()
    }
}

// Manual trait implementations that don't require T to implement the trait.

impl<T> std::fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handle").field("id", &self.id).finish()
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self::new(self.id.clone())
    }
}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> std::fmt::Display for Handle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl<T> Serialize for Handle<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.id.serialize(serializer)
    }
}

pub type SecurityGroupHandle = Handle<SecurityGroupMarker>;
pub type RoleHandle = Handle<RoleMarker>;
pub type CapacityGroupHandle = Handle<CapacityGroupMarker>;
pub type ClusterHandle = Handle<ClusterMarker>;
pub type CapacityProviderHandle = Handle<CapacityProviderMarker>;
pub type TaskDefinitionHandle = Handle<TaskDefinitionMarker>;
pub type ServiceHandle = Handle<ServiceMarker>;
pub type LoadBalancerHandle = Handle<LoadBalancerMarker>;
pub type ListenerHandle = Handle<ListenerMarker>;
pub type TargetGroupHandle = Handle<TargetGroupMarker>;
pub type RepositoryHandle = Handle<RepositoryMarker>;
pub type LogGroupHandle = Handle<LogGroupMarker>;
pub type BuildProjectHandle = Handle<BuildProjectMarker>;
pub type PipelineHandle = Handle<PipelineMarker>;
