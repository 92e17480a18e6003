// ABOUTME: Compile-fail test verifying rules cannot be added once a security group is committed.
// ABOUTME: This test should fail to compile, validating that commit seals the group.

use deckhand::topology::{Peer, Port, SecurityGroupSpec, TopologyBuilder};

fn add_after_commit(spec: SecurityGroupSpec, topology: &mut TopologyBuilder, port: Port) {
    let group = spec.commit(topology).unwrap();
    // ERROR: add_ingress_rule() doesn't exist on the committed group's handle
    group.add_ingress_rule(Peer::AnyIpv4, port);
}

fn main() {}
