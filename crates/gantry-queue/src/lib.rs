//! Build-queue admission for Gantry.
//!
//! Decides which pending builds a shared runner may pick up, enforcing
//! per-root-namespace CI-minutes quotas. Filtering is a pure,
//! order-preserving predicate over the candidate set the upstream query
//! layer supplies.

pub mod enforcer;
pub mod ledger;
pub mod packs;
pub mod service;

pub use enforcer::MinutesQuotaEnforcer;
pub use ledger::QuotaLedger;
pub use packs::{PackTransferError, change_pack_namespace};
pub use service::{BuildQueueService, PendingBuildSource};
