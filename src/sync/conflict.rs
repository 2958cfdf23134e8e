//! Conflict resolution policy.
//!
//! Decides what a remote change does to the local copy of its record.
//! Deletion is terminal and beats any edit. Between two versions the later
//! `modified_date` wins; on a tie the remote version is taken so every
//! device converges on what the remote holds.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::backend::RemoteChange;
use crate::record::RecordKind;

/// What the local side knows about a record when a remote change arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LocalState {
    /// `modified_date` of the live local record, `None` if there is none.
    pub modified_date: Option<DateTime<Utc>>,
    /// Unpushed local changes exist for the record.
    pub has_pending: bool,
    /// The id was deleted locally or remotely before.
    pub tombstoned: bool,
}

/// Decision for one remote change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Overwrite (or create) the local record with the remote version.
    TakeRemote,
    /// The local version is newer; it stays and is pushed again.
    KeepLocal,
    /// Remove the local record and record a tombstone.
    DeleteLocal,
    /// Nothing to do.
    Skip,
}

/// A resolved conflict, reported in the sync summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictOutcome {
    pub kind: RecordKind,
    pub id: Uuid,
    pub resolution: Resolution,
}

/// Resolve a remote change against the local state of its record.
pub fn resolve(local: &LocalState, remote: &RemoteChange) -> Resolution {
    if remote.is_tombstone() {
        return if local.modified_date.is_none() && local.tombstoned {
            Resolution::Skip
        } else {
            Resolution::DeleteLocal
        };
    }

    if local.tombstoned {
        return Resolution::Skip;
    }

    match local.modified_date {
        None => Resolution::TakeRemote,
        Some(local_modified) if local_modified > remote.modified_date => Resolution::KeepLocal,
        Some(_) => Resolution::TakeRemote,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::location;
    use crate::record::RecordData;
    use chrono::{Duration, TimeZone};

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap() + Duration::seconds(seconds)
    }

    fn upsert(modified: DateTime<Utc>) -> RemoteChange {
        RemoteChange::upsert(RecordData::Location(location::Model {
            id: Uuid::new_v4(),
            name: "Garage".to_string(),
            color: "#888888".to_string(),
            display_in_row: true,
            modified_date: modified,
        }))
    }

    fn live(modified: DateTime<Utc>, has_pending: bool) -> LocalState {
        LocalState {
            modified_date: Some(modified),
            has_pending,
            tombstoned: false,
        }
    }

    #[test]
    fn test_unknown_record_takes_remote() {
        assert_eq!(resolve(&LocalState::default(), &upsert(at(0))), Resolution::TakeRemote);
    }

    #[test]
    fn test_last_writer_wins() {
        assert_eq!(resolve(&live(at(10), true), &upsert(at(5))), Resolution::KeepLocal);
        assert_eq!(resolve(&live(at(5), true), &upsert(at(10))), Resolution::TakeRemote);
    }

    #[test]
    fn test_tie_goes_to_remote() {
        assert_eq!(resolve(&live(at(7), true), &upsert(at(7))), Resolution::TakeRemote);
    }

    #[test]
    fn test_remote_delete_beats_newer_local_edit() {
        let tombstone = RemoteChange::tombstone(RecordKind::Item, Uuid::new_v4(), at(1));
        assert_eq!(resolve(&live(at(100), true), &tombstone), Resolution::DeleteLocal);
    }

    #[test]
    fn test_remote_delete_of_unknown_record_still_records_tombstone() {
        let tombstone = RemoteChange::tombstone(RecordKind::Item, Uuid::new_v4(), at(1));
        assert_eq!(resolve(&LocalState::default(), &tombstone), Resolution::DeleteLocal);
    }

    #[test]
    fn test_repeated_tombstone_is_skipped() {
        let tombstone = RemoteChange::tombstone(RecordKind::Item, Uuid::new_v4(), at(1));
        let local = LocalState {
            tombstoned: true,
            ..LocalState::default()
        };
        assert_eq!(resolve(&local, &tombstone), Resolution::Skip);
    }

    #[test]
    fn test_deleted_record_is_not_revived() {
        let local = LocalState {
            modified_date: None,
            has_pending: true,
            tombstoned: true,
        };
        assert_eq!(resolve(&local, &upsert(at(1_000))), Resolution::Skip);
    }
}
