//! Pending builds awaiting dispatch to a runner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ResourceId;
use crate::quota::CostFactor;
use crate::visibility::Visibility;

/// A queued unit of CI work, as handed to the admission core by the
/// upstream candidate query (already filtered by runner tags, architecture
/// and status).
///
/// The candidate set arrives ordered (FIFO by `created_at`); admission
/// filtering removes entries but never reorders them. This subsystem never
/// mutates a pending build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingBuild {
    pub id: ResourceId,
    /// Project the build belongs to.
    pub project_id: ResourceId,
    /// Namespace owning the project. Root resolution happens through
    /// `NamespaceIndex`, not here.
    pub namespace_id: ResourceId,
    /// Visibility of the owning project.
    pub visibility: Visibility,
    /// Multiplier applied to elapsed runtime when the write side accounts
    /// consumed quota.
    pub cost_factor: CostFactor,
    /// When the build was enqueued.
    pub created_at: DateTime<Utc>,
}

impl PendingBuild {
    pub fn new(project_id: ResourceId, namespace_id: ResourceId, visibility: Visibility) -> Self {
        Self {
            id: ResourceId::new(),
            project_id,
            namespace_id,
            visibility,
            cost_factor: CostFactor::default(),
            created_at: Utc::now(),
        }
    }

    pub fn with_cost_factor(mut self, cost_factor: CostFactor) -> Self {
        self.cost_factor = cost_factor;
        self
    }
}
