//! Tombstone repository: ids that must never be revived by a sync replay.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, ConnectionTrait, EntityTrait};
use uuid::Uuid;

use crate::entities::tombstone;
use crate::record::RecordKind;

/// Repository for deletion markers.
pub struct TombstoneRepository;

impl TombstoneRepository {
    /// Record a deletion. Recording the same id twice keeps the first marker.
    pub async fn record<C>(conn: &C, kind: RecordKind, record_id: &Uuid, deleted_at: DateTime<Utc>) -> Result<()>
    where
        C: ConnectionTrait,
    {
        use sea_orm::sea_query::OnConflict;

        let marker = tombstone::ActiveModel {
            record_id: ActiveValue::Set(*record_id),
            record_kind: ActiveValue::Set(kind.as_str().to_string()),
            deleted_at: ActiveValue::Set(deleted_at),
        };
        tombstone::Entity::insert(marker)
            .on_conflict(
                OnConflict::column(tombstone::Column::RecordId)
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec(conn)
            .await?;
        Ok(())
    }

    /// Whether a record id has been deleted.
    pub async fn exists<C>(conn: &C, record_id: &Uuid) -> Result<bool>
    where
        C: ConnectionTrait,
    {
        Ok(tombstone::Entity::find_by_id(*record_id).one(conn).await?.is_some())
    }
}
