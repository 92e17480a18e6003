// ABOUTME: Read-only resolution of the existing network the topology attaches to.
// ABOUTME: Exactly one inventory entry must match the selector.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::LookupError;

/// A known network, as recorded by a previous lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkDescription {
    pub id: String,

    #[serde(default)]
    pub is_default: bool,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    #[serde(default)]
    pub subnets: Vec<String>,
}

/// Selection predicate. Every present filter must match.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NetworkSelector {
    #[serde(default, rename = "default")]
    pub is_default: Option<bool>,

    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl Default for NetworkSelector {
    /// The account's default network.
    fn default() -> Self {
        Self {
            is_default: Some(true),
            id: None,
            tags: BTreeMap::new(),
        }
    }
}

impl NetworkSelector {
    pub fn by_id(id: &str) -> Self {
        Self {
            is_default: None,
            id: Some(id.to_string()),
            tags: BTreeMap::new(),
        }
    }

    pub fn matches(&self, network: &NetworkDescription) -> bool {
        self.is_default.is_none_or(|d| d == network.is_default)
            && self.id.as_ref().is_none_or(|id| *id == network.id)
            && self
                .tags
                .iter()
                .all(|(k, v)| network.tags.get(k) == Some(v))
    }
}

impl fmt::Display for NetworkSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(is_default) = self.is_default {
            parts.push(format!("default={is_default}"));
        }
        if let Some(ref id) = self.id {
            parts.push(format!("id={id}"));
        }
        for (k, v) in &self.tags {
            parts.push(format!("tag:{k}={v}"));
        }
        if parts.is_empty() {
            write!(f, "{{any}}")
        } else {
            write!(f, "{{{}}}", parts.join(", "))
        }
    }
}

/// Immutable handle to the resolved network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkContext {
    id: String,
    subnets: Vec<String>,
}

impl NetworkContext {
    /// Resolve the selector against the known networks.
    ///
    /// # Errors
    ///
    /// Returns `LookupError::NotFound` when nothing matches and
    /// `LookupError::Ambiguous` when more than one network does.
    pub fn lookup(
        selector: &NetworkSelector,
        inventory: &[NetworkDescription],
    ) -> Result<Self, LookupError> {
        let mut matches = inventory.iter().filter(|n| selector.matches(n));

        let network = matches
            .next()
            .ok_or_else(|| LookupError::NotFound(selector.to_string()))?;

        let extra = matches.count();
        if extra > 0 {
            return Err(LookupError::Ambiguous {
                selector: selector.to_string(),
                count: extra + 1,
            });
        }

        if network.subnets.is_empty() {
            return Err(LookupError::NoSubnets(network.id.clone()));
        }

        tracing::debug!(network = %network.id, %selector, "resolved network");

        Ok(Self {
            id: network.id.clone(),
            subnets: network.subnets.clone(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn subnets(&self) -> &[String] {
        &self.subnets
    }
}
