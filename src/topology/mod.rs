// ABOUTME: Declarative resource graph for one deployable application.
// ABOUTME: Nodes carry explicit tags; edges point from consumer to dependency and must stay acyclic.

mod app;
mod balancer;
mod capacity;
mod cluster;
mod iam;
mod network;
mod repository;
mod security;

pub use app::{APP_STACK, AppStack, SERVICE_OUTPUT, app_stack};
pub use balancer::{
    ApplicationProtocol, Listener, ListenerConfig, LoadBalancerConfig, TargetConfig, TargetGroup,
    TargetGroupConfig, TargetHealthCheck, add_listener, add_targets, create_balancer,
};
pub use capacity::{
    CapacityBounds, CapacityGroup, CapacityGroupConfig, HealthCheckKind, InstanceType,
    instance_role, provision,
};
pub use cluster::{
    CapacityProviderConfig, ClusterConfig, ContainerSpec, LogConfiguration, PlacementStatus,
    PortMapping, ServiceConfig, ServiceRef, TaskDefinition, TaskDefinitionConfig, attach_capacity,
    create_cluster, create_service, define_task,
};
pub use iam::{Effect, PolicyStatement, RoleConfig, declare_role};
pub use network::{NetworkContext, NetworkDescription, NetworkSelector};
pub use repository::{RESOURCES_STACK, RepositoryConfig, create_repository, resources_stack};
pub use security::{
    DYNAMIC_PORTS, Direction, Peer, Port, PortRange, Protocol, RuleSource, SecurityGroupConfig,
    SecurityGroupFactory, SecurityGroupSpec, SecurityRule,
};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use crate::error::ValidationError;
use crate::pipeline::{BuildProjectConfig, LogGroupConfig, PipelineConfig};
use crate::types::{ApplicationName, Handle, ResourceId};

/// Tag key every node must carry.
pub const APPLICATION_TAG: &str = "application";

/// Resource kinds this crate declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    SecurityGroup,
    Role,
    CapacityGroup,
    Cluster,
    CapacityProvider,
    TaskDefinition,
    Service,
    LoadBalancer,
    Listener,
    TargetGroup,
    Repository,
    LogGroup,
    BuildProject,
    Pipeline,
}

/// Kind-specific properties of a node.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum NodeConfig {
    SecurityGroup(SecurityGroupConfig),
    Role(RoleConfig),
    CapacityGroup(CapacityGroupConfig),
    Cluster(ClusterConfig),
    CapacityProvider(CapacityProviderConfig),
    TaskDefinition(TaskDefinitionConfig),
    Service(ServiceConfig),
    LoadBalancer(LoadBalancerConfig),
    Listener(ListenerConfig),
    TargetGroup(TargetGroupConfig),
    Repository(RepositoryConfig),
    LogGroup(LogGroupConfig),
    BuildProject(BuildProjectConfig),
    Pipeline(PipelineConfig),
}

impl NodeConfig {
    pub fn kind(&self) -> ResourceKind {
        match self {
            NodeConfig::SecurityGroup(_) => ResourceKind::SecurityGroup,
            NodeConfig::Role(_) => ResourceKind::Role,
            NodeConfig::CapacityGroup(_) => ResourceKind::CapacityGroup,
            NodeConfig::Cluster(_) => ResourceKind::Cluster,
            NodeConfig::CapacityProvider(_) => ResourceKind::CapacityProvider,
            NodeConfig::TaskDefinition(_) => ResourceKind::TaskDefinition,
            NodeConfig::Service(_) => ResourceKind::Service,
            NodeConfig::LoadBalancer(_) => ResourceKind::LoadBalancer,
            NodeConfig::Listener(_) => ResourceKind::Listener,
            NodeConfig::TargetGroup(_) => ResourceKind::TargetGroup,
            NodeConfig::Repository(_) => ResourceKind::Repository,
            NodeConfig::LogGroup(_) => ResourceKind::LogGroup,
            NodeConfig::BuildProject(_) => ResourceKind::BuildProject,
            NodeConfig::Pipeline(_) => ResourceKind::Pipeline,
        }
    }
}

/// Tags set on a single node. Tags are never copied across dependency edges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Tags(BTreeMap<String, String>);

impl Tags {
    /// Tags carrying only the `application` tag.
    pub fn for_application(application: &ApplicationName) -> Self {
        let mut tags = BTreeMap::new();
        tags.insert(APPLICATION_TAG.to_string(), application.to_string());
        Self(tags)
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.0.insert(key.to_string(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn application(&self) -> Option<&str> {
        self.get(APPLICATION_TAG)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceNode {
    pub id: ResourceId,
    pub kind: ResourceKind,
    pub tags: Tags,
    pub config: NodeConfig,
}

impl ResourceNode {
    pub fn new(id: ResourceId, tags: Tags, config: NodeConfig) -> Self {
        Self {
            id,
            kind: config.kind(),
            tags,
            config,
        }
    }
}

/// Templates carry durations as whole seconds; anything finer would be truncated.
pub(crate) fn whole_seconds(what: &'static str, value: Duration) -> Result<u64, ValidationError> {
    if value.subsec_nanos() != 0 {
        return Err(ValidationError::FractionalSeconds { what, value });
    }
    Ok(value.as_secs())
}

/// A consumer → dependency edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dependency {
    pub consumer: ResourceId,
    pub dependency: ResourceId,
}

/// A reference to a named output of another, independently built topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackImport {
    pub stack: ResourceId,
    pub output: String,
}

/// Mutable topology under construction.
#[derive(Debug)]
pub struct TopologyBuilder {
    name: ResourceId,
    application: ApplicationName,
    nodes: Vec<ResourceNode>,
    index: HashMap<ResourceId, usize>,
    edges: Vec<Dependency>,
    outputs: BTreeMap<String, ResourceId>,
    imports: Vec<StackImport>,
}

impl TopologyBuilder {
    pub fn new(name: &str, application: &ApplicationName) -> Result<Self, ValidationError> {
        Ok(Self {
            name: ResourceId::new(name)?,
            application: application.clone(),
            nodes: Vec::new(),
            index: HashMap::new(),
            edges: Vec::new(),
            outputs: BTreeMap::new(),
            imports: Vec::new(),
        })
    }

    pub fn name(&self) -> &ResourceId {
        &self.name
    }

    pub fn application(&self) -> &ApplicationName {
        &self.application
    }

    /// Add a node that depends on already declared nodes.
    pub fn add_node(
        &mut self,
        node: ResourceNode,
        depends_on: &[&ResourceId],
    ) -> Result<ResourceId, ValidationError> {
        if self.index.contains_key(&node.id) {
            return Err(ValidationError::DuplicateId(node.id));
        }

        for dependency in depends_on {
            if !self.index.contains_key(*dependency) {
                return Err(ValidationError::UnknownDependency {
                    consumer: node.id.clone(),
                    dependency: (*dependency).clone(),
                });
            }
        }

        tracing::debug!(stack = %self.name, id = %node.id, kind = ?node.kind, "declared node");

        let id = node.id.clone();
        self.edges.extend(depends_on.iter().map(|dependency| Dependency {
            consumer: id.clone(),
            dependency: (*dependency).clone(),
        }));
        self.index.insert(id.clone(), self.nodes.len());
        self.nodes.push(node);
        Ok(id)
    }

    /// Add a node and hand back a typed handle to it.
    pub(crate) fn insert<T>(
        &mut self,
        node: ResourceNode,
        depends_on: &[&ResourceId],
    ) -> Result<Handle<T>, ValidationError> {
        self.add_node(node, depends_on).map(Handle::new)
    }

    /// Declare an extra ordering edge between two declared nodes.
    pub fn add_dependency(
        &mut self,
        consumer: &ResourceId,
        dependency: &ResourceId,
    ) -> Result<(), ValidationError> {
        for id in [consumer, dependency] {
            if !self.index.contains_key(id) {
                return Err(ValidationError::UnknownDependency {
                    consumer: consumer.clone(),
                    dependency: id.clone(),
                });
            }
        }
        self.edges.push(Dependency {
            consumer: consumer.clone(),
            dependency: dependency.clone(),
        });
        Ok(())
    }

    /// Export a declared node under a name other topologies can import.
    pub fn export(&mut self, name: &str, id: &ResourceId) -> Result<(), ValidationError> {
        if !self.index.contains_key(id) {
            return Err(ValidationError::UnknownDependency {
                consumer: self.name.clone(),
                dependency: id.clone(),
            });
        }
        self.outputs.insert(name.to_string(), id.clone());
        Ok(())
    }

    /// Record a reference to another topology's named output.
    pub fn import(&mut self, stack: &ResourceId, output: &str) {
        let import = StackImport {
            stack: stack.clone(),
            output: output.to_string(),
        };
        if !self.imports.contains(&import) {
            self.imports.push(import);
        }
    }

    /// Check every invariant and seal the topology.
    pub fn finish(self) -> Result<Topology, ValidationError> {
        let expected = self.application.as_str();
        if let Some(node) = self
            .nodes
            .iter()
            .find(|node| node.tags.application() != Some(expected))
        {
            return Err(ValidationError::TagMismatch {
                id: node.id.clone(),
                expected: expected.to_string(),
                found: node.tags.application().map(str::to_string),
            });
        }

        let order = self.provisioning_order()?;

        tracing::info!(
            stack = %self.name,
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            "topology sealed"
        );

        Ok(Topology {
            name: self.name,
            application: self.application.to_string(),
            nodes: self.nodes,
            edges: self.edges,
            outputs: self.outputs,
            imports: self.imports,
            order,
        })
    }

    /// Dependencies first. Fails if the edges form a cycle.
    fn provisioning_order(&self) -> Result<Vec<ResourceId>, ValidationError> {
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for node in &self.nodes {
            graph.add_node(node.id.as_str());
        }
        for edge in &self.edges {
            graph.add_edge(edge.consumer.as_str(), edge.dependency.as_str(), ());
        }

        let sorted = toposort(&graph, None).map_err(|cycle| {
            let at = cycle.node_id();
            let id = self
                .nodes
                .iter()
                .find(|n| n.id.as_str() == at)
                .map(|n| n.id.clone())
                .unwrap_or_else(|| self.name.clone());
            ValidationError::CyclicDependency(id)
        })?;

        // toposort yields consumers before their dependencies
        Ok(sorted
            .into_iter()
            .rev()
            .filter_map(|id| self.index.get(id).map(|i| self.nodes[*i].id.clone()))
            .collect())
    }
}

/// A sealed, validated topology ready to hand to a provisioning engine.
#[derive(Debug, Clone, Serialize)]
pub struct Topology {
    name: ResourceId,
    application: String,
    nodes: Vec<ResourceNode>,
    edges: Vec<Dependency>,
    outputs: BTreeMap<String, ResourceId>,
    imports: Vec<StackImport>,
    order: Vec<ResourceId>,
}

impl Topology {
    pub fn name(&self) -> &ResourceId {
        &self.name
    }

    pub fn application(&self) -> &str {
        &self.application
    }

    /// Nodes in declaration order.
    pub fn nodes(&self) -> &[ResourceNode] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&ResourceNode> {
        self.nodes.iter().find(|n| n.id.as_str() == id)
    }

    pub fn nodes_of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &ResourceNode> {
        self.nodes.iter().filter(move |n| n.kind == kind)
    }

    pub fn edges(&self) -> &[Dependency] {
        &self.edges
    }

    /// Direct dependencies of a node.
    pub fn dependencies_of(&self, id: &str) -> Vec<&ResourceId> {
        self.edges
            .iter()
            .filter(|e| e.consumer.as_str() == id)
            .map(|e| &e.dependency)
            .collect()
    }

    pub fn outputs(&self) -> &BTreeMap<String, ResourceId> {
        &self.outputs
    }

    pub fn output(&self, name: &str) -> Option<&ResourceId> {
        self.outputs.get(name)
    }

    pub fn imports(&self) -> &[StackImport] {
        &self.imports
    }

    /// Node ids with every dependency before its consumers.
    pub fn provisioning_order(&self) -> &[ResourceId] {
        &self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::LogGroupConfig;

    fn app() -> ApplicationName {
        ApplicationName::new("demo").unwrap()
    }

    fn log_group(id: &str, tags: Tags) -> ResourceNode {
        ResourceNode::new(
            ResourceId::new(id).unwrap(),
            tags,
            NodeConfig::LogGroup(LogGroupConfig::default()),
        )
    }

    #[test]
    fn rejects_duplicate_ids() {
        let mut builder = TopologyBuilder::new("TestStack", &app()).unwrap();
        builder
            .add_node(log_group("Logs", Tags::for_application(&app())), &[])
            .unwrap();
        let err = builder
            .add_node(log_group("Logs", Tags::for_application(&app())), &[])
            .unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateId(id) if id.as_str() == "Logs"));
    }

    #[test]
    fn rejects_undeclared_dependency() {
        let mut builder = TopologyBuilder::new("TestStack", &app()).unwrap();
        let missing = ResourceId::new("Missing").unwrap();
        let err = builder
            .add_node(log_group("Logs", Tags::for_application(&app())), &[&missing])
            .unwrap_err();
        assert!(matches!(err, ValidationError::UnknownDependency { .. }));
    }

    #[test]
    fn detects_cycles_on_finish() {
        let mut builder = TopologyBuilder::new("TestStack", &app()).unwrap();
        let a = builder
            .add_node(log_group("A", Tags::for_application(&app())), &[])
            .unwrap();
        let b = builder
            .add_node(log_group("B", Tags::for_application(&app())), &[&a])
            .unwrap();
        builder.add_dependency(&a, &b).unwrap();

        let err = builder.finish().unwrap_err();
        assert!(matches!(err, ValidationError::CyclicDependency(_)));
    }

    #[test]
    fn rejects_missing_application_tag() {
        let mut builder = TopologyBuilder::new("TestStack", &app()).unwrap();
        builder.add_node(log_group("Logs", Tags::default()), &[]).unwrap();

        let err = builder.finish().unwrap_err();
        assert!(matches!(
            err,
            ValidationError::TagMismatch { found: None, .. }
        ));
    }

    #[test]
    fn rejects_foreign_application_tag() {
        let other = ApplicationName::new("other").unwrap();
        let mut builder = TopologyBuilder::new("TestStack", &app()).unwrap();
        builder
            .add_node(log_group("Logs", Tags::for_application(&other)), &[])
            .unwrap();

        assert!(builder.finish().is_err());
    }

    #[test]
    fn provisioning_order_puts_dependencies_first() {
        let mut builder = TopologyBuilder::new("TestStack", &app()).unwrap();
        let a = builder
            .add_node(log_group("A", Tags::for_application(&app())), &[])
            .unwrap();
        let b = builder
            .add_node(log_group("B", Tags::for_application(&app())), &[&a])
            .unwrap();
        builder
            .add_node(log_group("C", Tags::for_application(&app())), &[&b, &a])
            .unwrap();

        let topology = builder.finish().unwrap();
        let order: Vec<&str> = topology
            .provisioning_order()
            .iter()
            .map(ResourceId::as_str)
            .collect();
        let pos = |id: &str| order.iter().position(|o| *o == id).unwrap();
        assert!(pos("A") < pos("B"));
        assert!(pos("B") < pos("C"));
    }

    #[test]
    fn export_requires_declared_node() {
        let mut builder = TopologyBuilder::new("TestStack", &app()).unwrap();
        let missing = ResourceId::new("Missing").unwrap();
        assert!(builder.export("service", &missing).is_err());
    }
}
