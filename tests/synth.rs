// ABOUTME: Integration tests for a full synthesis pass over all stacks.
// ABOUTME: Tests stack set, cross-stack imports, fail-fast inputs, and template output.

mod support;

use deckhand::config::{Config, EnvValue};
use deckhand::error::{ConfigurationError, Error, ValidationError};
use deckhand::pipeline::PIPELINE_STACK;
use deckhand::topology::{APP_STACK, NodeConfig, RESOURCES_STACK, ResourceKind, SERVICE_OUTPUT};
use deckhand::synthesize;

mod stacks {
    use super::*;

    #[test]
    fn produces_three_stacks_in_submission_order() {
        let synthesis = synthesize(&support::config()).unwrap();
        let names: Vec<&str> = synthesis.stacks.iter().map(|s| s.name().as_str()).collect();
        assert_eq!(names, vec![RESOURCES_STACK, APP_STACK, PIPELINE_STACK]);
    }

    #[test]
    fn pipeline_stack_imports_the_service() {
        let synthesis = synthesize(&support::config()).unwrap();
        let pipeline = synthesis.stack(PIPELINE_STACK).unwrap();

        let imports = pipeline.imports();
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].stack.as_str(), APP_STACK);
        assert_eq!(imports[0].output, SERVICE_OUTPUT);

        let app = synthesis.stack(APP_STACK).unwrap();
        assert!(app.output(SERVICE_OUTPUT).is_some());
    }

    #[test]
    fn pipeline_stack_declares_build_resources() {
        let synthesis = synthesize(&support::config()).unwrap();
        let pipeline = synthesis.stack(PIPELINE_STACK).unwrap();

        assert_eq!(pipeline.nodes_of_kind(ResourceKind::Role).count(), 1);
        assert_eq!(pipeline.nodes_of_kind(ResourceKind::LogGroup).count(), 1);
        assert_eq!(pipeline.nodes_of_kind(ResourceKind::BuildProject).count(), 1);
        assert_eq!(pipeline.nodes_of_kind(ResourceKind::Pipeline).count(), 1);

        let order = pipeline.provisioning_order();
        assert_eq!(order.last().unwrap().as_str(), "DemoCodePipeline");
    }

    #[test]
    fn build_project_receives_account_and_region() {
        let mut config = support::config();
        config.build.variables.insert(
            "STAGE".to_string(),
            EnvValue::Literal("prod".to_string()),
        );
        let synthesis = synthesize(&config).unwrap();
        let pipeline = synthesis.stack(PIPELINE_STACK).unwrap();

        let project = pipeline.node("TsukeAssets-CodeBuild-Action").unwrap();
        match &project.config {
            NodeConfig::BuildProject(project) => {
                assert_eq!(project.variables["AWS_ACCOUNT_ID"], "123456789012");
                assert_eq!(project.variables["AWS_DEFAULT_REGION"], "ap-northeast-1");
                assert_eq!(project.variables["STAGE"], "prod");
            }
            other => panic!("unexpected config {other:?}"),
        }
    }

    #[test]
    fn every_stack_uses_one_application_tag() {
        let synthesis = synthesize(&support::config_for("demo")).unwrap();
        for stack in &synthesis.stacks {
            assert_eq!(stack.application(), "demo");
            assert!(
                stack
                    .nodes()
                    .iter()
                    .all(|n| n.tags.application() == Some("demo"))
            );
        }
    }
}

mod fail_fast {
    use super::*;

    #[test]
    fn missing_source_token_aborts_everything() {
        let mut config = support::config();
        config.source.token = EnvValue::from_env("DECKHAND_TEST_UNSET_TOKEN");

        temp_env::with_var_unset("DECKHAND_TEST_UNSET_TOKEN", || {
            let err = synthesize(&config).unwrap_err();
            assert!(matches!(
                err,
                Error::Configuration(ConfigurationError::MissingValue(_))
            ));
        });
    }

    #[test]
    fn resolves_inputs_from_environment() {
        let vars = [
            ("GH_ACCOUNT_OWNER", Some("woven")),
            ("GH_REPO", Some("demo-app")),
            ("GH_SECRET", Some("ghp_test_token")),
            ("CDK_DEFAULT_ACCOUNT", Some("123456789012")),
            ("CDK_DEFAULT_REGION", Some("us-east-1")),
        ];
        temp_env::with_vars(vars, || {
            let mut config = Config::template();
            config.networks = vec![support::network("vpc-1", true)];
            let synthesis = synthesize(&config).unwrap();
            assert_eq!(synthesis.stacks.len(), 3);
        });
    }

    #[test]
    fn invalid_capacity_aborts_everything() {
        let mut config = support::config();
        config.capacity.desired = 5;

        let err = synthesize(&config).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::CapacityBounds { .. })
        ));
    }
}

mod template {
    use super::*;

    #[test]
    fn json_lists_stacks_and_warnings() {
        let synthesis = synthesize(&support::config()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&synthesis.to_json().unwrap()).unwrap();

        assert_eq!(json["stacks"].as_array().unwrap().len(), 3);
        let warnings = json["warnings"].as_array().unwrap();
        assert_eq!(warnings.len(), synthesis.diagnostics.warnings().len());
        assert!(warnings.iter().any(|w| w["kind"] == "broad_ingress"));
    }

    #[test]
    fn source_token_never_appears_in_template() {
        let synthesis = synthesize(&support::config()).unwrap();
        let json = synthesis.to_json().unwrap();
        assert!(!json.contains("ghp_test_token"));
        assert!(json.contains("<redacted>"));
    }
}
