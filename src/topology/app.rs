// ABOUTME: Assembles the application stack: network through load balancer.
// ABOUTME: Exports the service reference for the pipeline stack to import.

use nonempty::NonEmpty;

use super::balancer::{
    ApplicationProtocol, TargetGroup, TargetHealthCheck, add_listener, add_targets,
    create_balancer,
};
use super::capacity::{CapacityBounds, CapacityGroup, InstanceType, instance_role, provision};
use super::cluster::{
    ContainerSpec, PlacementStatus, ServiceRef, TaskDefinition, attach_capacity, create_cluster,
    create_service, define_task,
};
use super::security::SecurityGroupFactory;
use super::{NetworkContext, Topology, TopologyBuilder};
use crate::config::Config;
use crate::diagnostics::{Diagnostics, Warning};
use crate::error::Result;

pub const APP_STACK: &str = "AppStack";

/// Name under which the service reference is exported.
pub const SERVICE_OUTPUT: &str = "service";

/// The sealed application topology and the handles later stacks need.
#[derive(Debug, Clone)]
pub struct AppStack {
    pub topology: Topology,
    pub network: NetworkContext,
    pub service: ServiceRef,
    pub task_definition: TaskDefinition,
    pub capacity: CapacityGroup,
    pub target_group: TargetGroup,
    pub placement: PlacementStatus,
}

/// Build the application topology from configuration.
///
/// Construction follows dependency order: network, security groups, capacity,
/// cluster and service, then the load balancer. Any error aborts the whole
/// stack.
pub fn app_stack(config: &Config, diagnostics: &mut Diagnostics) -> Result<AppStack> {
    let network = NetworkContext::lookup(&config.network, &config.networks)?;
    let mut topology = TopologyBuilder::new(APP_STACK, &config.application)?;

    let factory = SecurityGroupFactory::new(&network);
    let balancer_group =
        factory.public_group(&mut topology, "DemoALBSG", config.load_balancer.port)?;
    let instance_group =
        factory.instance_group(&mut topology, "DemoInstanceSG", &balancer_group, diagnostics)?;

    let role = instance_role(&mut topology, "demoInstanceRole")?;
    let bounds = CapacityBounds::new(
        config.capacity.min,
        config.capacity.desired,
        config.capacity.max,
    )?;
    let capacity = provision(
        &mut topology,
        "DemoASG",
        &network,
        &instance_group,
        &role,
        InstanceType::new(&config.capacity.instance_type),
        bounds,
        config.capacity.health_check,
    )?;

    let cluster = create_cluster(&mut topology, "DemoECSCluster", &network)?;
    let provider = attach_capacity(&mut topology, "DemoASGProvider", &cluster, &capacity)?;
    let task = define_task(
        &mut topology,
        "DemoECSTaskDef",
        ContainerSpec::from_config(config),
    )?;
    let service = create_service(
        &mut topology,
        "DemoECSClusterEC2Service",
        &cluster,
        &provider,
        &task,
        config.service.desired_count,
        config.service.health_check_grace_period,
    )?;

    let placement = PlacementStatus::evaluate(&service, &task, &capacity);
    if let PlacementStatus::Degraded {
        task_slots,
        desired,
    } = placement
    {
        diagnostics.warn(Warning::degraded_placement(format!(
            "service {} wants {desired} tasks but {} holds at most {task_slots}",
            service.handle(),
            capacity.handle()
        )));
    }

    let balancer = create_balancer(
        &mut topology,
        "DemoALB",
        &network,
        &balancer_group,
        config.load_balancer.internet_facing,
    )?;
    let listener = add_listener(
        &mut topology,
        "DemoALBListener",
        &balancer,
        config.load_balancer.port,
        ApplicationProtocol::Http,
    )?;
    let target_group = add_targets(
        &mut topology,
        "DemoECSClusterTarget",
        &listener,
        &NonEmpty::new(service.clone()),
        TargetHealthCheck::from_config(&config.load_balancer.healthcheck)?,
    )?;

    topology.export(SERVICE_OUTPUT, service.handle().id())?;

    Ok(AppStack {
        topology: topology.finish()?,
        network,
        service,
        task_definition: task,
        capacity,
        target_group,
        placement,
    })
}
