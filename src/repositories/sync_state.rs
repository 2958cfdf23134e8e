//! Key/value repository for sync bookkeeping (remote cursor).

use anyhow::Result;
use sea_orm::{ActiveValue, ConnectionTrait, EntityTrait};

use crate::entities::sync_state;

/// Repository for sync state values.
pub struct SyncStateRepository;

impl SyncStateRepository {
    /// Get a stored value.
    pub async fn get<C>(conn: &C, key: &str) -> Result<Option<String>>
    where
        C: ConnectionTrait,
    {
        Ok(sync_state::Entity::find_by_id(key.to_string())
            .one(conn)
            .await?
            .map(|state| state.value))
    }

    /// Insert or replace a value.
    pub async fn set<C>(conn: &C, key: &str, value: &str) -> Result<()>
    where
        C: ConnectionTrait,
    {
        use sea_orm::sea_query::OnConflict;

        let state = sync_state::ActiveModel {
            key: ActiveValue::Set(key.to_string()),
            value: ActiveValue::Set(value.to_string()),
        };
        sync_state::Entity::insert(state)
            .on_conflict(
                OnConflict::column(sync_state::Column::Key)
                    .update_column(sync_state::Column::Value)
                    .to_owned(),
            )
            .exec(conn)
            .await?;
        Ok(())
    }
}
