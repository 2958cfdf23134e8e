//! Category repository for database operations.

use anyhow::Result;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, QueryOrder};
use uuid::Uuid;

use crate::entities::category;

/// Repository for category-related database operations.
pub struct CategoryRepository;

impl CategoryRepository {
    /// Get all categories ordered by name.
    pub async fn get_all<C>(conn: &C) -> Result<Vec<category::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(category::Entity::find()
            .order_by_asc(category::Column::Name)
            .order_by_asc(category::Column::Id)
            .all(conn)
            .await?)
    }

    /// Get a single category by id.
    pub async fn get_by_id<C>(conn: &C, id: &Uuid) -> Result<Option<category::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(category::Entity::find_by_id(*id).one(conn).await?)
    }

    /// Insert a new category.
    pub async fn insert<C>(conn: &C, category: category::Model) -> Result<category::Model>
    where
        C: ConnectionTrait,
    {
        let active_model: category::ActiveModel = category.into();
        Ok(active_model.reset_all().insert(conn).await?)
    }

    /// Overwrite every column of an existing category.
    pub async fn update<C>(conn: &C, category: category::Model) -> Result<category::Model>
    where
        C: ConnectionTrait,
    {
        let active_model: category::ActiveModel = category.into();
        Ok(active_model.reset_all().update(conn).await?)
    }

    /// Delete a category by id. Items keep their (now dangling) reference.
    pub async fn delete<C>(conn: &C, id: &Uuid) -> Result<bool>
    where
        C: ConnectionTrait,
    {
        let result = category::Entity::delete_by_id(*id).exec(conn).await?;
        Ok(result.rows_affected > 0)
    }
}
