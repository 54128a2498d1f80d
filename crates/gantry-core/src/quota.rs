//! CI-minutes quotas, cost factors and additional minute packs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ResourceId;

/// Per-root-namespace record of shared-runner minute consumption.
///
/// `consumed_seconds` is written by the usage tracker, already weighted by
/// each build's cost factor, and is monotonically non-decreasing within a
/// billing period. A limit of zero means unlimited.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MinutesQuota {
    /// Monthly minute limit configured on the namespace. `None` falls back
    /// to the application-wide default.
    pub monthly_limit: Option<u32>,
    /// Purchased minutes on top of the monthly limit.
    pub extra_minutes: u32,
    /// Cost-factor-weighted seconds consumed this billing period.
    pub consumed_seconds: u64,
}

impl MinutesQuota {
    /// The limit in force: the namespace's own limit, else the application
    /// default, else zero (unlimited).
    pub fn effective_limit(&self, application_default: Option<u32>) -> u32 {
        self.monthly_limit.or(application_default).unwrap_or(0)
    }

    /// Whether builds for this namespace may still start against a shared
    /// runner. The boundary is strict: a namespace that has consumed
    /// exactly its budget is out of minutes.
    pub fn minutes_remaining(&self, application_default: Option<u32>) -> bool {
        let limit = self.effective_limit(application_default);
        if limit == 0 {
            return true;
        }
        let budget_seconds = (u64::from(limit) + u64::from(self.extra_minutes)) * 60;
        self.consumed_seconds < budget_seconds
    }
}

/// Per-build multiplier applied to elapsed runtime when consuming quota.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostFactor(f64);

impl CostFactor {
    pub fn new(factor: f64) -> Self {
        Self(factor.max(0.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Weight elapsed runtime for quota accounting. Used by the usage
    /// tracker on the write side; admission reads the pre-weighted total.
    pub fn apply(&self, elapsed_seconds: u64) -> u64 {
        (elapsed_seconds as f64 * self.0).round() as u64
    }
}

impl Default for CostFactor {
    fn default() -> Self {
        Self(1.0)
    }
}

/// A purchased pack of additional shared-runner minutes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdditionalPack {
    pub id: ResourceId,
    /// Root namespace the pack is assigned to.
    pub namespace_id: ResourceId,
    pub minutes: u32,
    /// Packs past their expiry contribute nothing.
    pub expires_at: Option<DateTime<Utc>>,
}

impl AdditionalPack {
    pub fn new(namespace_id: ResourceId, minutes: u32) -> Self {
        Self {
            id: ResourceId::new(),
            namespace_id,
            minutes,
            expires_at: None,
        }
    }

    pub fn expires_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    pub fn active_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_effective_limit_prefers_own_limit() {
        let quota = MinutesQuota {
            monthly_limit: Some(500),
            ..Default::default()
        };
        assert_eq!(quota.effective_limit(Some(400)), 500);
    }

    #[test]
    fn test_effective_limit_falls_back_to_application_default() {
        let quota = MinutesQuota::default();
        assert_eq!(quota.effective_limit(Some(400)), 400);
        assert_eq!(quota.effective_limit(None), 0);
    }

    #[test]
    fn test_zero_limit_is_unlimited() {
        let quota = MinutesQuota {
            monthly_limit: Some(0),
            consumed_seconds: u64::MAX,
            ..Default::default()
        };
        assert!(quota.minutes_remaining(None));
    }

    #[test]
    fn test_quota_boundary_is_strict() {
        let at_budget = MinutesQuota {
            monthly_limit: Some(100),
            extra_minutes: 50,
            consumed_seconds: 150 * 60,
        };
        assert!(!at_budget.minutes_remaining(None));

        let one_second_left = MinutesQuota {
            consumed_seconds: 150 * 60 - 1,
            ..at_budget
        };
        assert!(one_second_left.minutes_remaining(None));
    }

    #[test]
    fn test_extra_minutes_extend_default_limit() {
        let quota = MinutesQuota {
            monthly_limit: None,
            extra_minutes: 10,
            consumed_seconds: 405 * 60,
        };
        assert!(quota.minutes_remaining(Some(400)));
        assert!(!quota.minutes_remaining(Some(390)));
    }

    #[test]
    fn test_cost_factor_weights_runtime() {
        assert_eq!(CostFactor::new(0.5).apply(100), 50);
        assert_eq!(CostFactor::default().apply(100), 100);
        assert_eq!(CostFactor::new(2.0).apply(100), 200);
    }

    #[test]
    fn test_negative_cost_factor_clamped() {
        assert_eq!(CostFactor::new(-1.0).value(), 0.0);
    }

    #[test]
    fn test_pack_expiry() {
        let now = Utc::now();
        let pack = AdditionalPack::new(ResourceId::new(), 100);
        assert!(pack.active_at(now));

        let expired = pack.clone().expires_at(now - Duration::days(1));
        assert!(!expired.active_at(now));
    }
}
