// ABOUTME: Integration tests for submitting synthesized stacks to a provisioning engine.
// ABOUTME: Tests submission order, stop-on-failure, and cross-stack import resolution.

mod support;

use deckhand::engine::*;
use deckhand::pipeline::PIPELINE_STACK;
use deckhand::topology::{APP_STACK, RESOURCES_STACK};
use deckhand::synthesize;

mod submission {
    use super::*;

    #[tokio::test]
    async fn applies_every_stack_in_order() {
        let synthesis = synthesize(&support::config()).unwrap();
        let engine = InMemoryEngine::new();

        let report = submit(&engine, &synthesis.stacks).await;

        assert!(report.is_success());
        assert_eq!(
            engine.applied(),
            vec![RESOURCES_STACK, APP_STACK, PIPELINE_STACK]
        );
        assert_eq!(report.stacks().len(), 3);
    }

    #[tokio::test]
    async fn failure_stops_later_stacks() {
        let synthesis = synthesize(&support::config()).unwrap();
        let engine = InMemoryEngine::failing_on(APP_STACK);

        let report = submit(&engine, &synthesis.stacks).await;

        assert!(!report.is_success());
        assert_eq!(report.status(RESOURCES_STACK), Some(&StackStatus::Applied));
        assert!(matches!(
            report.status(APP_STACK),
            Some(StackStatus::Failed { reason }) if reason.contains(APP_STACK)
        ));
        assert_eq!(
            report.status(PIPELINE_STACK),
            Some(&StackStatus::NotAttempted)
        );
        assert_eq!(engine.applied(), vec![RESOURCES_STACK]);
    }

    #[tokio::test]
    async fn pipeline_before_app_has_unresolved_import() {
        let synthesis = synthesize(&support::config()).unwrap();
        let engine = InMemoryEngine::new();
        let pipeline = synthesis.stack(PIPELINE_STACK).unwrap();

        let err = engine.apply(pipeline).await.unwrap_err();
        assert!(matches!(
            err,
            ProvisioningError::UnresolvedImport { ref from_stack, ref output, .. }
                if from_stack == APP_STACK && output == "service"
        ));
        assert_eq!(err.stack(), PIPELINE_STACK);
    }

    #[tokio::test]
    async fn reapplying_a_stack_replaces_it() {
        let synthesis = synthesize(&support::config()).unwrap();
        let engine = InMemoryEngine::new();

        submit(&engine, &synthesis.stacks).await;
        let report = submit(&engine, &synthesis.stacks).await;

        assert!(report.is_success());
        assert_eq!(engine.applied().len(), 3);
    }

    #[tokio::test]
    async fn report_serializes_status() {
        let synthesis = synthesize(&support::config()).unwrap();
        let engine = InMemoryEngine::failing_on(RESOURCES_STACK);
        let report = submit(&engine, &synthesis.stacks).await;

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["stacks"][0]["status"], "failed");
        assert_eq!(json["stacks"][2]["status"], "not_attempted");
    }
}
