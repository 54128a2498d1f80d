//! Per-root-namespace quota records.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use gantry_core::{AdditionalPack, MinutesQuota, ResourceId};

/// View of the quota records the admission core reads: one
/// [`MinutesQuota`] per root namespace plus the purchased minute packs
/// backing `extra_minutes`. The usage tracker owns the consumed counters;
/// admission only reads them.
#[derive(Debug, Clone, Default)]
pub struct QuotaLedger {
    quotas: HashMap<ResourceId, MinutesQuota>,
    packs: Vec<AdditionalPack>,
}

impl QuotaLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quota(&self, namespace_id: ResourceId) -> Option<&MinutesQuota> {
        self.quotas.get(&namespace_id)
    }

    pub fn set_quota(&mut self, namespace_id: ResourceId, quota: MinutesQuota) {
        self.quotas.insert(namespace_id, quota);
    }

    pub fn add_pack(&mut self, pack: AdditionalPack) {
        self.packs.push(pack);
    }

    pub fn packs_for(&self, namespace_id: ResourceId) -> impl Iterator<Item = &AdditionalPack> {
        self.packs
            .iter()
            .filter(move |pack| pack.namespace_id == namespace_id)
    }

    pub(crate) fn move_packs(&mut self, from: ResourceId, to: ResourceId) {
        for pack in &mut self.packs {
            if pack.namespace_id == from {
                pack.namespace_id = to;
            }
        }
    }

    /// Recompute a namespace's `extra_minutes` from its active packs.
    pub fn rebuild_extra_minutes(&mut self, namespace_id: ResourceId, now: DateTime<Utc>) {
        let extra: u32 = self
            .packs
            .iter()
            .filter(|pack| pack.namespace_id == namespace_id && pack.active_at(now))
            .map(|pack| pack.minutes)
            .sum();
        self.quotas.entry(namespace_id).or_default().extra_minutes = extra;
    }
}
