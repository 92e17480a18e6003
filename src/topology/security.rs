// ABOUTME: Security groups and their ingress/egress rules.
// ABOUTME: Rules are added to an open spec; committing it seals the group for good.

use serde::Serialize;
use std::fmt;

use super::{NetworkContext, NodeConfig, ResourceNode, Tags, TopologyBuilder};
use crate::diagnostics::{Diagnostics, Warning};
use crate::error::ValidationError;
use crate::types::{ResourceId, SecurityGroupHandle};

/// Host port range the orchestrator assigns dynamic container ports from.
pub const DYNAMIC_PORTS: PortRange = PortRange {
    from: 32768,
    to: 65535,
};

const ANY_IPV4: &str = "0.0.0.0/0";

/// Ports reachable from anywhere that deserve a diagnostic.
const ADMINISTRATIVE_PORTS: [u16; 2] = [22, 3389];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ingress,
    Egress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PortRange {
    from: u16,
    to: u16,
}

impl PortRange {
    pub fn new(from: u16, to: u16) -> Result<Self, ValidationError> {
        if from == 0 || from > to {
            return Err(ValidationError::PortRange { from, to });
        }
        Ok(Self { from, to })
    }

    pub fn single(port: u16) -> Result<Self, ValidationError> {
        Self::new(port, port)
    }

    pub fn from_port(&self) -> u16 {
        self.from
    }

    pub fn to_port(&self) -> u16 {
        self.to
    }

    pub fn contains(&self, port: u16) -> bool {
        (self.from..=self.to).contains(&port)
    }

    pub fn overlaps(&self, other: &PortRange) -> bool {
        self.from <= other.to && other.from <= self.to
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.from == self.to {
            write!(f, "{}", self.from)
        } else {
            write!(f, "{}-{}", self.from, self.to)
        }
    }
}

/// A TCP port or port range on the owning group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Port(PortRange);

impl Port {
    pub fn tcp(port: u16) -> Result<Self, ValidationError> {
        PortRange::single(port).map(Self)
    }

    pub fn tcp_range(from: u16, to: u16) -> Result<Self, ValidationError> {
        PortRange::new(from, to).map(Self)
    }

    pub fn range(&self) -> PortRange {
        self.0
    }
}

/// Where ingress traffic may come from.
#[derive(Debug, Clone, Copy)]
pub enum Peer<'a> {
    AnyIpv4,
    /// Outbound traffic of another declared group.
    Group(&'a SecurityGroupHandle),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSource {
    Cidr(String),
    SecurityGroup(ResourceId),
}

/// A single rule. Only constructible through a `SecurityGroupSpec`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityRule {
    direction: Direction,
    protocol: Protocol,
    port_range: Option<PortRange>,
    source: RuleSource,
}

impl SecurityRule {
    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// `None` covers every port.
    pub fn port_range(&self) -> Option<PortRange> {
        self.port_range
    }

    pub fn source(&self) -> &RuleSource {
        &self.source
    }

    pub fn is_open_to_any_ipv4(&self) -> bool {
        matches!(&self.source, RuleSource::Cidr(cidr) if cidr == ANY_IPV4)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityGroupConfig {
    pub network_id: String,
    pub allow_all_outbound: bool,
    pub ingress: Vec<SecurityRule>,
    pub egress: Vec<SecurityRule>,
}

/// A security group that can still accept rules.
///
/// Committing consumes the spec and yields a `SecurityGroupHandle`, which has
/// no way to add rules.
#[derive(Debug, Clone)]
pub struct SecurityGroupSpec {
    id: ResourceId,
    config: SecurityGroupConfig,
    source_groups: Vec<ResourceId>,
}

impl SecurityGroupSpec {
    /// Add an ingress rule.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::OpenDynamicPorts` when any IPv4 source would
    /// reach the dynamic container port range: that range is reserved for
    /// traffic from the load balancer's group.
    pub fn add_ingress_rule(
        &mut self,
        peer: Peer<'_>,
        port: Port,
    ) -> Result<&mut Self, ValidationError> {
        let range = port.range();
        let source = match peer {
            Peer::AnyIpv4 => {
                if range.overlaps(&DYNAMIC_PORTS) {
                    return Err(ValidationError::OpenDynamicPorts {
                        from: range.from_port(),
                        to: range.to_port(),
                    });
                }
                RuleSource::Cidr(ANY_IPV4.to_string())
            }
            Peer::Group(group) => return Ok(self.allow_from(group, port)),
        };

        self.config.ingress.push(SecurityRule {
            direction: Direction::Ingress,
            protocol: Protocol::Tcp,
            port_range: Some(range),
            source,
        });
        Ok(self)
    }

    /// Allow traffic from another group's members on a port range.
    pub fn allow_from(&mut self, group: &SecurityGroupHandle, port: Port) -> &mut Self {
        if !self.source_groups.contains(group.id()) {
            self.source_groups.push(group.id().clone());
        }
        self.config.ingress.push(SecurityRule {
            direction: Direction::Ingress,
            protocol: Protocol::Tcp,
            port_range: Some(port.range()),
            source: RuleSource::SecurityGroup(group.id().clone()),
        });
        self
    }

    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    pub fn ingress(&self) -> &[SecurityRule] {
        &self.config.ingress
    }

    /// Ports open to any IPv4 source.
    pub fn open_ports(&self) -> impl Iterator<Item = PortRange> + '_ {
        self.config
            .ingress
            .iter()
            .filter(|r| r.is_open_to_any_ipv4())
            .filter_map(|r| r.port_range)
    }

    /// Declare the group in the topology. The spec is consumed.
    pub fn commit(
        self,
        topology: &mut TopologyBuilder,
    ) -> Result<SecurityGroupHandle, ValidationError> {
        let tags = Tags::for_application(topology.application());
        let depends_on: Vec<&ResourceId> = self.source_groups.iter().collect();
        let node = ResourceNode::new(
            self.id.clone(),
            tags,
            NodeConfig::SecurityGroup(self.config),
        );
        topology.insert(node, &depends_on)
    }
}

/// Creates security groups bound to one network.
#[derive(Debug, Clone, Copy)]
pub struct SecurityGroupFactory<'n> {
    network: &'n NetworkContext,
}

impl<'n> SecurityGroupFactory<'n> {
    pub fn new(network: &'n NetworkContext) -> Self {
        Self { network }
    }

    pub fn create_group(
        &self,
        id: &str,
        allow_all_outbound: bool,
    ) -> Result<SecurityGroupSpec, ValidationError> {
        let egress = if allow_all_outbound {
            vec![SecurityRule {
                direction: Direction::Egress,
                protocol: Protocol::All,
                port_range: None,
                source: RuleSource::Cidr(ANY_IPV4.to_string()),
            }]
        } else {
            Vec::new()
        };

        Ok(SecurityGroupSpec {
            id: ResourceId::new(id)?,
            config: SecurityGroupConfig {
                network_id: self.network.id().to_string(),
                allow_all_outbound,
                ingress: Vec::new(),
                egress,
            },
            source_groups: Vec::new(),
        })
    }

    /// Public-facing group: HTTP from anywhere.
    pub fn public_group(
        &self,
        topology: &mut TopologyBuilder,
        id: &str,
        listener_port: u16,
    ) -> Result<SecurityGroupHandle, ValidationError> {
        let mut spec = self.create_group(id, true)?;
        spec.add_ingress_rule(Peer::AnyIpv4, Port::tcp(listener_port)?)?;
        spec.commit(topology)
    }

    /// Instance group: SSH from anywhere and the dynamic port range from the
    /// load balancer's group only.
    pub fn instance_group(
        &self,
        topology: &mut TopologyBuilder,
        id: &str,
        balancer_group: &SecurityGroupHandle,
        diagnostics: &mut Diagnostics,
    ) -> Result<SecurityGroupHandle, ValidationError> {
        let mut spec = self.create_group(id, true)?;
        spec.add_ingress_rule(Peer::AnyIpv4, Port::tcp(22)?)?;
        spec.allow_from(
            balancer_group,
            Port::tcp_range(DYNAMIC_PORTS.from_port(), DYNAMIC_PORTS.to_port())?,
        );

        for range in spec.open_ports() {
            if ADMINISTRATIVE_PORTS.iter().any(|p| range.contains(*p)) {
                diagnostics.warn(Warning::broad_ingress(format!(
                    "security group {} accepts port {} from any IPv4 address",
                    spec.id(),
                    range
                )));
            }
        }

        spec.commit(topology)
    }
}
