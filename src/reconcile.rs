//! # Owner Index Reconciliation
//!
//! Finds tournaments that are missing from their creator's tournament index
//! (left behind when a create failed after the insert) and optionally repairs
//! the index.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{Tournament, TournamentId, UserId};
use crate::error::StoreError;
use crate::store::RecordStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileMode {
    /// Report orphans without writing.
    DryRun,
    /// Rewrite the index of every user with orphans.
    Apply,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanedEntry {
    pub user_id: UserId,
    pub tournament_id: TournamentId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub users_scanned: usize,
    pub orphans: Vec<OrphanedEntry>,
    pub users_repaired: usize,
}

pub async fn reconcile_owner_indexes(
    store: &dyn RecordStore,
    mode: ReconcileMode,
) -> Result<ReconcileReport, StoreError> {
    let mut report = ReconcileReport::default();

    for user in store.list_tournament_creators().await? {
        report.users_scanned += 1;

        let owned = store.list_tournaments_by_creator(&user).await?;
        let existing = store.get_tournament_index(&user).await?.unwrap_or_default();
        let indexed: HashSet<TournamentId> = existing.iter().copied().collect();

        let missing: Vec<TournamentId> = owned
            .iter()
            .map(|t| t.id)
            .filter(|id| !indexed.contains(id))
            .collect();
        if missing.is_empty() {
            continue;
        }

        warn!(user_id = %user, orphans = missing.len(), "Found tournaments missing from owner index");
        report
            .orphans
            .extend(missing.into_iter().map(|tournament_id| OrphanedEntry {
                user_id: user.clone(),
                tournament_id,
            }));

        if mode == ReconcileMode::Apply {
            let rebuilt = rebuild_index(&owned, &existing);
            store.set_tournament_index(&user, &rebuilt).await?;
            report.users_repaired += 1;
            info!(user_id = %user, entries = rebuilt.len(), "Rewrote owner index");
        }
    }

    Ok(report)
}

/// The owner's tournaments newest-first, then any prior entries that do not
/// belong to them, in their original order.
fn rebuild_index(owned: &[Tournament], existing: &[TournamentId]) -> Vec<TournamentId> {
    let owned_ids: HashSet<TournamentId> = owned.iter().map(|t| t.id).collect();
    owned
        .iter()
        .map(|t| t.id)
        .chain(existing.iter().copied().filter(|id| !owned_ids.contains(id)))
        .collect()
}
