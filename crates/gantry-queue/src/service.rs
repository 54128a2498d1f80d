//! Composition root for shared-runner build dispatch.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use gantry_config::QueueSettings;
use gantry_core::{NamespaceIndex, PendingBuild, Result, Runner};

use crate::enforcer::MinutesQuotaEnforcer;
use crate::ledger::QuotaLedger;

/// The upstream candidate query: pending builds matching a runner's tags,
/// architecture and status, in dispatch priority order. Owned by the
/// persistence layer.
#[async_trait]
pub trait PendingBuildSource: Send + Sync {
    async fn pending_builds(&self, runner: &Runner) -> Result<Vec<PendingBuild>>;
}

/// Hands runners the builds they are allowed to pick up.
pub struct BuildQueueService {
    source: Arc<dyn PendingBuildSource>,
    namespaces: NamespaceIndex,
    ledger: QuotaLedger,
    settings: QueueSettings,
}

impl BuildQueueService {
    pub fn new(
        source: Arc<dyn PendingBuildSource>,
        namespaces: NamespaceIndex,
        ledger: QuotaLedger,
        settings: QueueSettings,
    ) -> Self {
        Self {
            source,
            namespaces,
            ledger,
            settings,
        }
    }

    /// The candidate set for a shared runner with minutes enforcement
    /// applied. The disaster-recovery bypass returns the base set
    /// untouched to restore throughput during incident response; specific
    /// runners are never quota-checked.
    pub async fn builds_for_shared_runner(&self, runner: &Runner) -> Result<Vec<PendingBuild>> {
        let candidates = self.source.pending_builds(runner).await?;

        if self.settings.disaster_recovery_bypass {
            warn!(
                runner_id = %runner.id,
                candidates = candidates.len(),
                "disaster recovery bypass active, skipping minutes enforcement"
            );
            return Ok(candidates);
        }

        if !runner.is_shared() {
            return Ok(candidates);
        }

        let enforcer = MinutesQuotaEnforcer::new(&self.namespaces, &self.ledger, &self.settings);
        let eligible = enforcer.eligible_builds(&candidates, runner);
        debug!(
            runner_id = %runner.id,
            candidates = candidates.len(),
            eligible = eligible.len(),
            "filtered shared-runner candidates"
        );
        Ok(eligible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_core::{MinutesQuota, Namespace, ResourceId, Visibility};

    struct StaticSource {
        builds: Vec<PendingBuild>,
    }

    #[async_trait]
    impl PendingBuildSource for StaticSource {
        async fn pending_builds(&self, _runner: &Runner) -> Result<Vec<PendingBuild>> {
            Ok(self.builds.clone())
        }
    }

    fn service_with_exhausted_namespace(
        settings: QueueSettings,
    ) -> (BuildQueueService, PendingBuild) {
        let namespace = Namespace::root(ResourceId::new());
        let namespace_id = namespace.id;
        let mut namespaces = NamespaceIndex::default();
        namespaces.insert(namespace);

        let mut ledger = QuotaLedger::new();
        ledger.set_quota(
            namespace_id,
            MinutesQuota {
                monthly_limit: Some(100),
                extra_minutes: 0,
                consumed_seconds: 100 * 60,
            },
        );

        let build = PendingBuild::new(ResourceId::new(), namespace_id, Visibility::Private);
        let source = Arc::new(StaticSource {
            builds: vec![build.clone()],
        });

        (
            BuildQueueService::new(source, namespaces, ledger, settings),
            build,
        )
    }

    fn no_exemption_settings() -> QueueSettings {
        QueueSettings {
            quota_exempt_visibilities: vec![],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_shared_runner_respects_quota() {
        let (service, _build) = service_with_exhausted_namespace(no_exemption_settings());
        let runner = Runner::shared(vec![]);

        let builds = service.builds_for_shared_runner(&runner).await.unwrap();
        assert!(builds.is_empty());
    }

    #[tokio::test]
    async fn test_disaster_recovery_bypass_skips_enforcement() {
        let settings = QueueSettings {
            disaster_recovery_bypass: true,
            ..no_exemption_settings()
        };
        let (service, build) = service_with_exhausted_namespace(settings);
        let runner = Runner::shared(vec![]);

        let builds = service.builds_for_shared_runner(&runner).await.unwrap();
        assert_eq!(builds.len(), 1);
        assert_eq!(builds[0].id, build.id);
    }

    #[tokio::test]
    async fn test_specific_runner_not_quota_checked() {
        let (service, build) = service_with_exhausted_namespace(no_exemption_settings());
        let runner = Runner::specific();

        let builds = service.builds_for_shared_runner(&runner).await.unwrap();
        assert_eq!(builds.len(), 1);
        assert_eq!(builds[0].id, build.id);
    }

    #[tokio::test]
    async fn test_exempt_visibility_dispatched_over_quota() {
        let (service, _) = service_with_exhausted_namespace(no_exemption_settings());
        let runner = Runner::shared(vec![Visibility::Private]);

        let builds = service.builds_for_shared_runner(&runner).await.unwrap();
        assert_eq!(builds.len(), 1);
    }
}
