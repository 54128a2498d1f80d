//! CI-minutes eligibility filtering for shared runners.

use std::collections::HashMap;
use tracing::debug;

use gantry_config::QueueSettings;
use gantry_core::namespace::RootLookup;
use gantry_core::{NamespaceIndex, PendingBuild, ResourceId, Runner};

use crate::ledger::QuotaLedger;

/// Filters a candidate set of pending builds down to those whose root
/// namespace still has shared-runner minutes, or whose project visibility
/// is exempt from accounting on the given runner.
///
/// Pure over its inputs: no shared state, safe to call concurrently. The
/// filter preserves candidate order, so whatever priority the upstream
/// query established survives admission.
pub struct MinutesQuotaEnforcer<'a> {
    namespaces: &'a NamespaceIndex,
    ledger: &'a QuotaLedger,
    settings: &'a QueueSettings,
}

impl<'a> MinutesQuotaEnforcer<'a> {
    pub fn new(
        namespaces: &'a NamespaceIndex,
        ledger: &'a QuotaLedger,
        settings: &'a QueueSettings,
    ) -> Self {
        Self {
            namespaces,
            ledger,
            settings,
        }
    }

    /// The subset of `builds` permitted to start on `runner`, in the
    /// original order. Quota decisions are made once per root namespace
    /// across the whole candidate set, not once per build.
    pub fn eligible_builds(&self, builds: &[PendingBuild], runner: &Runner) -> Vec<PendingBuild> {
        let exempt = runner.quota_exempt_visibilities();
        let lookup = if self.settings.use_traversal_ids {
            RootLookup::TraversalIds
        } else {
            RootLookup::ParentWalk
        };

        let mut decisions: HashMap<ResourceId, bool> = HashMap::new();

        builds
            .iter()
            .filter(|build| {
                if exempt.contains(&build.visibility) {
                    return true;
                }
                let root = self.namespaces.root_of(build.namespace_id, lookup);
                *decisions
                    .entry(root)
                    .or_insert_with(|| self.namespace_within_quota(root))
            })
            .cloned()
            .collect()
    }

    fn namespace_within_quota(&self, root: ResourceId) -> bool {
        // A namespace without a quota record has no limit to exceed.
        let within = self
            .ledger
            .quota(root)
            .map(|quota| quota.minutes_remaining(self.settings.default_minutes_limit))
            .unwrap_or(true);

        if !within {
            debug!(namespace_id = %root, "namespace is out of shared-runner minutes");
        }
        within
    }
}
