// ABOUTME: Image repository where built container images are published.
// ABOUTME: Lives in its own stack; other stacks refer to it by name only.

use serde::Serialize;

use super::{NodeConfig, ResourceNode, Tags, Topology, TopologyBuilder};
use crate::config::Config;
use crate::error::ValidationError;
use crate::types::{RepositoryHandle, RepositoryName, ResourceId};

pub const RESOURCES_STACK: &str = "ResourcesStack";

const REPOSITORY_ID: &str = "DemoECRRepo";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryConfig {
    pub repository_name: RepositoryName,
}

pub fn create_repository(
    topology: &mut TopologyBuilder,
    id: &str,
    name: &RepositoryName,
) -> Result<RepositoryHandle, ValidationError> {
    let node = ResourceNode::new(
        ResourceId::new(id)?,
        Tags::for_application(topology.application()),
        NodeConfig::Repository(RepositoryConfig {
            repository_name: name.clone(),
        }),
    );
    topology.insert(node, &[])
}

/// Stack holding the image repository.
pub fn resources_stack(config: &Config) -> Result<Topology, ValidationError> {
    let mut topology = TopologyBuilder::new(RESOURCES_STACK, &config.application)?;
    let repository = create_repository(&mut topology, REPOSITORY_ID, &config.image.repository)?;
    topology.export("repository", repository.id())?;
    topology.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::ResourceKind;

    #[test]
    fn resources_stack_holds_one_tagged_repository() {
        let topology = resources_stack(&Config::template()).unwrap();
        assert_eq!(topology.name().as_str(), RESOURCES_STACK);

        let repos: Vec<_> = topology.nodes_of_kind(ResourceKind::Repository).collect();
        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].id.as_str(), REPOSITORY_ID);
        assert_eq!(repos[0].tags.application(), Some("woven-demo"));
        assert_eq!(
            topology.output("repository").map(ResourceId::as_str),
            Some(REPOSITORY_ID)
        );
    }
}
