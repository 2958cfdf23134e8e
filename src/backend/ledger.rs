//! Authoritative change ledger shared by the bundled remotes.
//!
//! The ledger keeps the latest change per record, numbered by a growing
//! sequence. A pull cursor is the last sequence number a device has seen.
//! Superseded entries are dropped when a record changes again, so a pull
//! only ever returns current versions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{BackendError, ChangeBatch, PushResult, PushStatus, RejectReason, RemoteChange};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct LedgerEntry {
    seq: u64,
    change: RemoteChange,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteLedger {
    last_seq: u64,
    entries: Vec<LedgerEntry>,
}

impl RemoteLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest version of a record.
    pub fn current(&self, id: &Uuid) -> Option<&RemoteChange> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.change.id == *id)
            .map(|entry| &entry.change)
    }

    /// Number of records the ledger knows about, tombstones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply one pushed change.
    ///
    /// Tombstones are always accepted and stay final. An upsert is refused
    /// when the record is deleted, or when the stored version is at least as
    /// recent and differs. Re-sending the stored version is accepted without
    /// recording anything.
    pub fn apply(&mut self, change: RemoteChange) -> PushStatus {
        match self.current(&change.id) {
            Some(current) if current.is_tombstone() => {
                if change.is_tombstone() {
                    return PushStatus::Accepted;
                }
                return PushStatus::Rejected {
                    reason: RejectReason::Deleted,
                    current: current.clone(),
                };
            }
            Some(current) if *current == change => return PushStatus::Accepted,
            Some(current) if !change.is_tombstone() && change.modified_date <= current.modified_date => {
                return PushStatus::Rejected {
                    reason: RejectReason::Stale,
                    current: current.clone(),
                };
            }
            _ => {}
        }

        self.entries.retain(|entry| entry.change.id != change.id);
        self.last_seq += 1;
        self.entries.push(LedgerEntry {
            seq: self.last_seq,
            change,
        });
        PushStatus::Accepted
    }

    /// Apply a batch of pushed changes in order.
    pub fn apply_all(&mut self, changes: Vec<RemoteChange>) -> Vec<PushResult> {
        changes
            .into_iter()
            .map(|change| {
                let id = change.id;
                PushResult {
                    id,
                    status: self.apply(change),
                }
            })
            .collect()
    }

    /// Changes recorded after `cursor`, oldest first.
    pub fn changes_since(&self, cursor: Option<&str>, limit: usize) -> Result<ChangeBatch, BackendError> {
        let after = match cursor {
            None => 0,
            Some(cursor) => cursor
                .parse::<u64>()
                .map_err(|_| BackendError::InvalidData(format!("Invalid cursor '{}'", cursor)))?,
        };

        let mut pending = self.entries.iter().filter(|entry| entry.seq > after);
        let page: Vec<&LedgerEntry> = pending.by_ref().take(limit).collect();
        let has_more = pending.next().is_some();
        let last = page.last().map_or(after, |entry| entry.seq);

        Ok(ChangeBatch {
            changes: page.into_iter().map(|entry| entry.change.clone()).collect(),
            cursor: last.to_string(),
            has_more,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::item;
    use crate::record::{RecordData, RecordKind};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() + Duration::seconds(seconds)
    }

    fn item_change(id: Uuid, name: &str, modified: DateTime<Utc>) -> RemoteChange {
        RemoteChange::upsert(RecordData::Item(item::Model {
            id,
            name: name.to_string(),
            quantity: 1,
            symbol: None,
            image_data: None,
            symbol_color: None,
            sort_order: 0,
            modified_date: modified,
            location_id: None,
            category_id: None,
        }))
    }

    #[test]
    fn test_newer_upsert_replaces_older() {
        let mut ledger = RemoteLedger::new();
        let id = Uuid::new_v4();

        assert_eq!(ledger.apply(item_change(id, "Drill", at(0))), PushStatus::Accepted);
        assert_eq!(ledger.apply(item_change(id, "Hammer drill", at(5))), PushStatus::Accepted);

        assert_eq!(ledger.len(), 1);
        let current = ledger.current(&id).unwrap();
        assert_eq!(current.modified_date, at(5));
    }

    #[test]
    fn test_stale_upsert_is_rejected_with_current_version() {
        let mut ledger = RemoteLedger::new();
        let id = Uuid::new_v4();
        ledger.apply(item_change(id, "Newer", at(10)));

        let status = ledger.apply(item_change(id, "Older", at(3)));
        match status {
            PushStatus::Rejected { reason, current } => {
                assert_eq!(reason, RejectReason::Stale);
                assert_eq!(current.modified_date, at(10));
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_equal_timestamp_with_different_content_is_stale() {
        let mut ledger = RemoteLedger::new();
        let id = Uuid::new_v4();
        ledger.apply(item_change(id, "First", at(1)));

        let status = ledger.apply(item_change(id, "Second", at(1)));
        assert!(matches!(
            status,
            PushStatus::Rejected {
                reason: RejectReason::Stale,
                ..
            }
        ));
    }

    #[test]
    fn test_identical_upsert_is_a_no_op() {
        let mut ledger = RemoteLedger::new();
        let id = Uuid::new_v4();
        ledger.apply(item_change(id, "Tent", at(1)));
        let before = ledger.changes_since(None, 10).unwrap();

        assert_eq!(ledger.apply(item_change(id, "Tent", at(1))), PushStatus::Accepted);
        assert_eq!(ledger.changes_since(None, 10).unwrap(), before);
    }

    #[test]
    fn test_tombstone_is_terminal() {
        let mut ledger = RemoteLedger::new();
        let id = Uuid::new_v4();
        ledger.apply(item_change(id, "Lamp", at(1)));
        assert_eq!(
            ledger.apply(RemoteChange::tombstone(RecordKind::Item, id, at(2))),
            PushStatus::Accepted
        );

        // An edit made later than the delete still loses.
        let status = ledger.apply(item_change(id, "Lamp (edited)", at(30)));
        assert!(matches!(
            status,
            PushStatus::Rejected {
                reason: RejectReason::Deleted,
                ..
            }
        ));
        assert!(ledger.current(&id).unwrap().is_tombstone());
    }

    #[test]
    fn test_tombstone_wins_over_newer_edit() {
        let mut ledger = RemoteLedger::new();
        let id = Uuid::new_v4();
        ledger.apply(item_change(id, "Edited", at(50)));

        let status = ledger.apply(RemoteChange::tombstone(RecordKind::Item, id, at(10)));
        assert_eq!(status, PushStatus::Accepted);
        assert!(ledger.current(&id).unwrap().is_tombstone());
    }

    #[test]
    fn test_changes_since_pages_through_cursor() {
        let mut ledger = RemoteLedger::new();
        let ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        for (i, id) in ids.iter().enumerate() {
            ledger.apply(item_change(*id, "Box", at(i as i64)));
        }

        let first = ledger.changes_since(None, 2).unwrap();
        assert_eq!(first.changes.len(), 2);
        assert!(first.has_more);

        let second = ledger.changes_since(Some(&first.cursor), 2).unwrap();
        assert_eq!(second.changes.len(), 2);
        assert!(second.has_more);

        let third = ledger.changes_since(Some(&second.cursor), 2).unwrap();
        assert_eq!(third.changes.len(), 1);
        assert!(!third.has_more);
        assert_eq!(third.changes[0].id, ids[4]);

        let empty = ledger.changes_since(Some(&third.cursor), 2).unwrap();
        assert!(empty.changes.is_empty());
        assert_eq!(empty.cursor, third.cursor);
    }

    #[test]
    fn test_superseded_entries_are_not_replayed() {
        let mut ledger = RemoteLedger::new();
        let id = Uuid::new_v4();
        ledger.apply(item_change(id, "v1", at(1)));
        let seen = ledger.changes_since(None, 10).unwrap();

        ledger.apply(item_change(id, "v2", at(2)));
        let batch = ledger.changes_since(Some(&seen.cursor), 10).unwrap();
        assert_eq!(batch.changes.len(), 1);
        assert_eq!(batch.changes[0].modified_date, at(2));
    }

    #[test]
    fn test_invalid_cursor() {
        let ledger = RemoteLedger::new();
        let err = ledger.changes_since(Some("not-a-number"), 10).unwrap_err();
        assert!(matches!(err, BackendError::InvalidData(_)));
    }
}
