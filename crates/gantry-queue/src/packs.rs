//! Moving purchased minute packs between root namespaces.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;

use gantry_core::{NamespaceIndex, ResourceId};

use crate::ledger::QuotaLedger;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PackTransferError {
    #[error("namespace not found: {0}")]
    NamespaceNotFound(ResourceId),

    #[error("namespace must be a top-level namespace: {0}")]
    NotRoot(ResourceId),

    #[error("namespace and target must be different")]
    SameNamespace,

    #[error("both namespaces must share an owner")]
    NoSharedOwner,
}

/// Reassign every additional pack from one root namespace to another and
/// rebuild both sides' extra minutes. All validations run before any
/// mutation, so a rejected transfer leaves the ledger untouched.
pub fn change_pack_namespace(
    ledger: &mut QuotaLedger,
    namespaces: &NamespaceIndex,
    from: ResourceId,
    to: ResourceId,
    now: DateTime<Utc>,
) -> Result<(), PackTransferError> {
    if from == to {
        return Err(PackTransferError::SameNamespace);
    }

    let source = namespaces
        .get(from)
        .ok_or(PackTransferError::NamespaceNotFound(from))?;
    let target = namespaces
        .get(to)
        .ok_or(PackTransferError::NamespaceNotFound(to))?;

    if !source.is_root() {
        return Err(PackTransferError::NotRoot(from));
    }
    if !target.is_root() {
        return Err(PackTransferError::NotRoot(to));
    }

    let shares_owner = source
        .owner_ids
        .iter()
        .any(|owner| target.owner_ids.contains(owner));
    if !shares_owner {
        return Err(PackTransferError::NoSharedOwner);
    }

    let moved = ledger.packs_for(from).count();
    ledger.move_packs(from, to);
    ledger.rebuild_extra_minutes(from, now);
    ledger.rebuild_extra_minutes(to, now);

    info!(
        from = %from,
        to = %to,
        packs = moved,
        "moved additional minute packs between namespaces"
    );
    Ok(())
}
