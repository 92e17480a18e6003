// ABOUTME: Integration tests for security group rules and build role policy.
// ABOUTME: Tests that dynamic container ports stay closed to the internet and least privilege holds.

mod support;

use deckhand::diagnostics::{Diagnostics, WarningKind};
use deckhand::error::ValidationError;
use deckhand::pipeline::{build_policy, check_least_privilege};
use deckhand::topology::*;
use deckhand::types::ResourceId;

fn security_group<'a>(topology: &'a Topology, id: &str) -> &'a SecurityGroupConfig {
    match &topology.node(id).unwrap().config {
        NodeConfig::SecurityGroup(sg) => sg,
        other => panic!("{id} is not a security group: {other:?}"),
    }
}

mod ingress {
    use super::*;

    #[test]
    fn dynamic_ports_are_never_open_to_any_ipv4() {
        let mut diagnostics = Diagnostics::default();
        let stack = app_stack(&support::config(), &mut diagnostics).unwrap();

        for node in stack.topology.nodes_of_kind(ResourceKind::SecurityGroup) {
            let sg = security_group(&stack.topology, node.id.as_str());
            for rule in sg.ingress.iter().filter(|r| r.is_open_to_any_ipv4()) {
                let range = rule.port_range().unwrap();
                assert!(
                    !range.overlaps(&DYNAMIC_PORTS),
                    "{} opens {} to any IPv4",
                    node.id,
                    range
                );
            }
        }
    }

    #[test]
    fn instance_group_admits_dynamic_ports_from_balancer_group() {
        let mut diagnostics = Diagnostics::default();
        let stack = app_stack(&support::config(), &mut diagnostics).unwrap();
        let instance = security_group(&stack.topology, "DemoInstanceSG");

        let dynamic = instance
            .ingress
            .iter()
            .find(|r| r.port_range() == Some(DYNAMIC_PORTS))
            .unwrap();
        assert_eq!(
            dynamic.source(),
            &RuleSource::SecurityGroup(ResourceId::new("DemoALBSG").unwrap())
        );
        assert_eq!(dynamic.protocol(), Protocol::Tcp);
    }

    #[test]
    fn balancer_group_admits_listener_port_from_anywhere() {
        let mut diagnostics = Diagnostics::default();
        let stack = app_stack(&support::config(), &mut diagnostics).unwrap();
        let public = security_group(&stack.topology, "DemoALBSG");

        assert_eq!(public.ingress.len(), 1);
        assert!(public.ingress[0].is_open_to_any_ipv4());
        assert_eq!(public.ingress[0].port_range().unwrap().from_port(), 80);
        assert!(public.allow_all_outbound);
    }

    #[test]
    fn open_ssh_is_reported_as_broad_ingress() {
        let mut diagnostics = Diagnostics::default();
        app_stack(&support::config(), &mut diagnostics).unwrap();

        let broad: Vec<_> = diagnostics.of_kind(WarningKind::BroadIngress).collect();
        assert_eq!(broad.len(), 1);
        assert!(broad[0].message.contains("DemoInstanceSG"));
    }

    #[test]
    fn explicit_any_ipv4_rule_on_dynamic_range_is_rejected() {
        let network = NetworkContext::lookup(
            &NetworkSelector::default(),
            &[support::network("vpc-1", true)],
        )
        .unwrap();
        let factory = SecurityGroupFactory::new(&network);
        let mut spec = factory.create_group("Open", true).unwrap();

        let err = spec
            .add_ingress_rule(Peer::AnyIpv4, Port::tcp_range(30000, 40000).unwrap())
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::OpenDynamicPorts {
                from: 30000,
                to: 40000
            }
        ));
    }
}

mod build_role {
    use super::*;

    #[test]
    fn build_policy_is_least_privilege() {
        let mut diagnostics = Diagnostics::default();
        check_least_privilege(&[build_policy()], &mut diagnostics).unwrap();

        // The resource scope is still "*", which is worth a warning
        assert_eq!(
            diagnostics.of_kind(WarningKind::WildcardResource).count(),
            1
        );
    }

    #[test]
    fn build_policy_grants_image_and_log_actions() {
        let policy = build_policy();
        for action in [
            "ecr:GetAuthorizationToken",
            "ecr:PutImage",
            "logs:PutLogEvents",
            "s3:GetObject",
        ] {
            assert!(
                policy.actions.iter().any(|a| a == action),
                "missing {action}"
            );
        }
    }

    #[test]
    fn wildcard_action_is_rejected() {
        let mut diagnostics = Diagnostics::default();
        let statement = PolicyStatement::allow(["ecr:*"], ["*"]);
        let err = check_least_privilege(&[statement], &mut diagnostics).unwrap_err();
        assert!(matches!(err, ValidationError::WildcardAction(a) if a == "ecr:*"));
    }

    #[test]
    fn foreign_service_is_out_of_scope() {
        let mut diagnostics = Diagnostics::default();
        let statement = PolicyStatement::allow(["iam:PassRole"], ["arn:aws:iam::123456789012:role/x"]);
        let err = check_least_privilege(&[statement], &mut diagnostics).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::ActionOutOfScope { action } if action == "iam:PassRole"
        ));
    }
}
