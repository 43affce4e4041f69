//! Last-write-wins conflict resolution.
//!
//! Kept as an isolated strategy so the orchestration in `engine` never
//! inspects timestamps itself and the policy can be swapped later.

use std::collections::HashMap;

use uuid::Uuid;

use crate::domain::Syncable;

/// Picks the record with the strictly greater `updated_at`. Ties favor the
/// local side, so re-merging an already merged pair is a no-op.
pub fn resolve<'a, T: Syncable>(local: &'a T, remote: &'a T) -> &'a T {
    if remote.updated_at() > local.updated_at() {
        remote
    } else {
        local
    }
}

/// Merges two record sets by id. The result is seeded from the local set;
/// unknown remote records are adopted, known ones go through [`resolve`].
/// Output order: local records first (in order), then adopted remote ones.
pub fn merge_records<T: Syncable + Clone>(local: &[T], remote: &[T]) -> Vec<T> {
    let mut merged: Vec<T> = local.to_vec();
    let positions: HashMap<Uuid, usize> = local
        .iter()
        .enumerate()
        .map(|(index, record)| (record.id(), index))
        .collect();

    for record in remote {
        match positions.get(&record.id()) {
            Some(&index) => {
                merged[index] = resolve(&merged[index], record).clone();
            }
            None => merged.push(record.clone()),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Identifiable, Income, Syncable};
    use chrono::Duration;
    use uuid::Uuid;

    fn income(name: &str) -> Income {
        Income::new(Uuid::new_v4(), name, 100.0)
    }

    #[test]
    fn newer_remote_wins_older_remote_loses() {
        let local = income("local");
        let mut newer = local.clone();
        newer.name = "remote".into();
        newer.updated_at = local.updated_at + Duration::seconds(5);
        assert_eq!(resolve(&local, &newer).name, "remote");

        let mut older = newer.clone();
        older.updated_at = local.updated_at - Duration::seconds(5);
        assert_eq!(resolve(&local, &older).name, "local");
    }

    #[test]
    fn ties_favor_local() {
        let local = income("local");
        let mut remote = local.clone();
        remote.name = "remote".into();
        assert_eq!(resolve(&local, &remote).name, "local");
    }

    #[test]
    fn merge_is_commutative_in_outcome() {
        let mut a = income("a");
        let mut b = a.clone();
        b.name = "b".into();
        b.updated_at = a.updated_at + Duration::seconds(10);
        a.amount = 50.0;

        let forward = merge_records(&[a.clone()], &[b.clone()]);
        let backward = merge_records(&[b.clone()], &[a.clone()]);
        assert_eq!(forward.len(), 1);
        assert_eq!(forward[0], backward[0]);
        assert_eq!(forward[0].name, "b");
    }

    #[test]
    fn unknown_remote_records_are_adopted() {
        let local = income("local-only");
        let remote = income("remote-only");
        let merged = merge_records(&[local.clone()], &[remote.clone()]);
        assert_eq!(merged.len(), 2);
        assert!(merged.iter().any(|record| record.id() == local.id));
        assert!(merged.iter().any(|record| record.id() == remote.id));
    }

    #[test]
    fn deleted_remote_record_wins_when_newer() {
        let local = income("kept");
        let mut tombstone = local.clone();
        tombstone.deleted = true;
        tombstone.updated_at = local.updated_at + Duration::seconds(1);
        let merged = merge_records(&[local], &[tombstone]);
        assert_eq!(merged.len(), 1);
        assert!(merged[0].is_deleted());
    }
}
