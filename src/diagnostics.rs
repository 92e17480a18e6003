// ABOUTME: Diagnostics accumulator for non-fatal findings during synthesis.
// ABOUTME: Collects warnings that shouldn't fail synthesis but should be shown to users.

use serde::Serialize;

/// Collects non-fatal warnings during synthesis.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Warnings of one kind.
    pub fn of_kind(&self, kind: WarningKind) -> impl Iterator<Item = &Warning> {
        self.warnings.iter().filter(move |w| w.kind == kind)
    }
}

/// A non-fatal warning collected during synthesis.
#[derive(Debug, Clone, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// A port is reachable from any IPv4 address.
    pub fn broad_ingress(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::BroadIngress,
            message: message.into(),
        }
    }

    /// The service cannot place every desired task on the capacity group.
    pub fn degraded_placement(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::DegradedPlacement,
            message: message.into(),
        }
    }

    /// A policy statement applies to every resource.
    pub fn wildcard_resource(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::WildcardResource,
            message: message.into(),
        }
    }
}

/// Categories of warnings that can occur during synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Ingress open to 0.0.0.0/0 on an administrative port.
    BroadIngress,
    /// Desired task count exceeds what the capacity group can hold.
    DegradedPlacement,
    /// Policy resources are `*`.
    WildcardResource,
}
