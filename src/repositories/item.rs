//! Item repository for database operations.

use anyhow::Result;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::entities::item;

/// Repository for item-related database operations.
pub struct ItemRepository;

impl ItemRepository {
    /// Get all items ordered by sort order, then id.
    pub async fn get_all<C>(conn: &C) -> Result<Vec<item::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(item::Entity::find()
            .order_by_asc(item::Column::SortOrder)
            .order_by_asc(item::Column::Id)
            .all(conn)
            .await?)
    }

    /// Get a single item by id.
    pub async fn get_by_id<C>(conn: &C, id: &Uuid) -> Result<Option<item::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(item::Entity::find_by_id(*id).one(conn).await?)
    }

    /// Get all items filed under a category (or uncategorized when `None`).
    pub async fn get_for_category<C>(conn: &C, category_id: Option<Uuid>) -> Result<Vec<item::Model>>
    where
        C: ConnectionTrait,
    {
        let column = item::Column::CategoryId;
        let filter = match category_id {
            Some(id) => column.eq(id),
            None => column.is_null(),
        };
        Ok(item::Entity::find()
            .filter(filter)
            .order_by_asc(item::Column::SortOrder)
            .order_by_asc(item::Column::Id)
            .all(conn)
            .await?)
    }

    /// Insert a new item.
    pub async fn insert<C>(conn: &C, item: item::Model) -> Result<item::Model>
    where
        C: ConnectionTrait,
    {
        let active_model: item::ActiveModel = item.into();
        Ok(active_model.reset_all().insert(conn).await?)
    }

    /// Overwrite every column of an existing item.
    pub async fn update<C>(conn: &C, item: item::Model) -> Result<item::Model>
    where
        C: ConnectionTrait,
    {
        let active_model: item::ActiveModel = item.into();
        Ok(active_model.reset_all().update(conn).await?)
    }

    /// Rewrite only the sort order of an item.
    pub async fn set_sort_order<C>(conn: &C, id: &Uuid, sort_order: i32) -> Result<()>
    where
        C: ConnectionTrait,
    {
        use sea_orm::sea_query::Expr;
        item::Entity::update_many()
            .col_expr(item::Column::SortOrder, Expr::value(sort_order))
            .filter(item::Column::Id.eq(*id))
            .exec(conn)
            .await?;
        Ok(())
    }

    /// Delete an item by id. Returns whether a row was removed.
    pub async fn delete<C>(conn: &C, id: &Uuid) -> Result<bool>
    where
        C: ConnectionTrait,
    {
        let result = item::Entity::delete_by_id(*id).exec(conn).await?;
        Ok(result.rows_affected > 0)
    }
}
