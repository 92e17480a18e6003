// ABOUTME: Hand-off of synthesized stacks to an external provisioning engine.
// ABOUTME: Stacks are applied in order; the first failure stops submission without retry.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use snafu::Snafu;

use crate::topology::Topology;

/// Failure reported by a provisioning engine.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProvisioningError {
    #[snafu(display("failed to apply stack {stack}: {message}"))]
    Apply { stack: String, message: String },

    #[snafu(display("stack {stack} imports {output} from {from_stack}, which is not applied"))]
    UnresolvedImport {
        stack: String,
        from_stack: String,
        output: String,
    },
}

impl ProvisioningError {
    /// Name of the stack that failed.
    pub fn stack(&self) -> &str {
        match self {
            ProvisioningError::Apply { stack, .. }
            | ProvisioningError::UnresolvedImport { stack, .. } => stack,
        }
    }
}

/// Creates, updates or deletes resources so they match a declared topology.
#[async_trait]
pub trait ProvisioningEngine: Send + Sync {
    async fn apply(&self, topology: &Topology) -> Result<(), ProvisioningError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StackStatus {
    Applied,
    Failed { reason: String },
    NotAttempted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackReport {
    pub stack: String,
    #[serde(flatten)]
    pub status: StackStatus,
}

/// Per-stack outcome of one submission.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProvisioningReport {
    stacks: Vec<StackReport>,
}

impl ProvisioningReport {
    pub fn stacks(&self) -> &[StackReport] {
        &self.stacks
    }

    pub fn status(&self, stack: &str) -> Option<&StackStatus> {
        self.stacks
            .iter()
            .find(|s| s.stack == stack)
            .map(|s| &s.status)
    }

    pub fn is_success(&self) -> bool {
        self.stacks.iter().all(|s| s.status == StackStatus::Applied)
    }
}

/// Apply stacks in order. Stacks after a failure are reported as not attempted.
pub async fn submit<E>(engine: &E, stacks: &[Topology]) -> ProvisioningReport
where
    E: ProvisioningEngine + ?Sized,
{
    let mut report = ProvisioningReport::default();
    let mut failed = false;

    for topology in stacks {
        let status = if failed {
            StackStatus::NotAttempted
        } else {
            match engine.apply(topology).await {
                Ok(()) => {
                    tracing::info!(stack = %topology.name(), "stack applied");
                    StackStatus::Applied
                }
                Err(e) => {
                    tracing::warn!(stack = %topology.name(), error = %e, "stack failed");
                    failed = true;
                    StackStatus::Failed {
                        reason: e.to_string(),
                    }
                }
            }
        };
        report.stacks.push(StackReport {
            stack: topology.name().to_string(),
            status,
        });
    }

    report
}

/// Engine that records applied stacks in memory.
#[derive(Debug, Default)]
pub struct InMemoryEngine {
    applied: Mutex<Vec<Topology>>,
    fail_on: Option<String>,
}

impl InMemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail whenever the named stack is applied.
    pub fn failing_on(stack: &str) -> Self {
        Self {
            applied: Mutex::new(Vec::new()),
            fail_on: Some(stack.to_string()),
        }
    }

    /// Names of applied stacks, in application order.
    pub fn applied(&self) -> Vec<String> {
        self.applied
            .lock()
            .iter()
            .map(|t| t.name().to_string())
            .collect()
    }
}

#[async_trait]
impl ProvisioningEngine for InMemoryEngine {
    async fn apply(&self, topology: &Topology) -> Result<(), ProvisioningError> {
        let stack = topology.name().to_string();

        if self.fail_on.as_deref() == Some(stack.as_str()) {
            return ApplySnafu {
                stack,
                message: "rejected by engine",
            }
            .fail();
        }

        let mut applied = self.applied.lock();
        for import in topology.imports() {
            let resolved = applied.iter().any(|t| {
                t.name() == &import.stack && t.output(&import.output).is_some()
            });
            if !resolved {
                return UnresolvedImportSnafu {
                    stack,
                    from_stack: import.stack.to_string(),
                    output: import.output.clone(),
                }
                .fail();
            }
        }

        applied.retain(|t| t.name() != topology.name());
        applied.push(topology.clone());
        Ok(())
    }
}
