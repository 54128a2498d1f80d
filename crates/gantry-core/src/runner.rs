//! Runner scope classification.

use serde::{Deserialize, Serialize};

use crate::ResourceId;
use crate::visibility::Visibility;

/// Whether a runner is pooled across namespaces or pinned to specific
/// projects. Only shared runners are subject to minutes accounting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RunnerScope {
    Shared {
        /// Visibility levels whose builds run without consuming the
        /// namespace quota (typically public projects).
        quota_exempt_visibilities: Vec<Visibility>,
    },
    Specific,
}

/// A CI execution agent polling the queue for work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Runner {
    pub id: ResourceId,
    pub scope: RunnerScope,
}

impl Runner {
    pub fn shared(quota_exempt_visibilities: Vec<Visibility>) -> Self {
        Self {
            id: ResourceId::new(),
            scope: RunnerScope::Shared {
                quota_exempt_visibilities,
            },
        }
    }

    pub fn specific() -> Self {
        Self {
            id: ResourceId::new(),
            scope: RunnerScope::Specific,
        }
    }

    pub fn is_shared(&self) -> bool {
        matches!(self.scope, RunnerScope::Shared { .. })
    }

    /// Visibility levels exempt from quota checks on this runner. Empty
    /// for specific runners, which are never quota-checked.
    pub fn quota_exempt_visibilities(&self) -> &[Visibility] {
        match &self.scope {
            RunnerScope::Shared {
                quota_exempt_visibilities,
            } => quota_exempt_visibilities,
            RunnerScope::Specific => &[],
        }
    }
}
