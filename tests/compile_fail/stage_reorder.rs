// ABOUTME: Compile-fail test verifying the deploy stage cannot directly follow the source stage.
// ABOUTME: This test should fail to compile, validating stage order.

use deckhand::pipeline::{Action, PipelineBuilder, Sourced};
use nonempty::NonEmpty;

fn deploy_after_source(builder: PipelineBuilder<Sourced>, actions: NonEmpty<Action>) {
    // ERROR: deploy() method doesn't exist on PipelineBuilder<Sourced>
    let _ = builder.deploy(actions);
}

fn main() {}
