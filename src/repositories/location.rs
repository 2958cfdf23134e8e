//! Location repository for database operations.

use anyhow::Result;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, QueryOrder};
use uuid::Uuid;

use crate::entities::location;

/// Repository for location-related database operations.
pub struct LocationRepository;

impl LocationRepository {
    /// Get all locations ordered by name.
    pub async fn get_all<C>(conn: &C) -> Result<Vec<location::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(location::Entity::find()
            .order_by_asc(location::Column::Name)
            .order_by_asc(location::Column::Id)
            .all(conn)
            .await?)
    }

    /// Get a single location by id.
    pub async fn get_by_id<C>(conn: &C, id: &Uuid) -> Result<Option<location::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(location::Entity::find_by_id(*id).one(conn).await?)
    }

    /// Insert a new location.
    pub async fn insert<C>(conn: &C, location: location::Model) -> Result<location::Model>
    where
        C: ConnectionTrait,
    {
        let active_model: location::ActiveModel = location.into();
        Ok(active_model.reset_all().insert(conn).await?)
    }

    /// Overwrite every column of an existing location.
    pub async fn update<C>(conn: &C, location: location::Model) -> Result<location::Model>
    where
        C: ConnectionTrait,
    {
        let active_model: location::ActiveModel = location.into();
        Ok(active_model.reset_all().update(conn).await?)
    }

    /// Delete a location by id. Items keep their (now dangling) reference.
    pub async fn delete<C>(conn: &C, id: &Uuid) -> Result<bool>
    where
        C: ConnectionTrait,
    {
        let result = location::Entity::delete_by_id(*id).exec(conn).await?;
        Ok(result.rows_affected > 0)
    }
}
