//! Change log repository: local mutations waiting to be pushed.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::entities::pending_change;
use crate::record::{ChangeOperation, RecordKind};

/// Repository for the pending change log.
pub struct PendingChangeRepository;

impl PendingChangeRepository {
    /// Append a change to the log. Sequence numbers grow with mutation order.
    pub async fn append<C>(
        conn: &C,
        kind: RecordKind,
        record_id: &Uuid,
        operation: ChangeOperation,
        modified_date: DateTime<Utc>,
    ) -> Result<pending_change::Model>
    where
        C: ConnectionTrait,
    {
        let change = pending_change::ActiveModel {
            seq: ActiveValue::NotSet,
            record_kind: ActiveValue::Set(kind.as_str().to_string()),
            record_id: ActiveValue::Set(*record_id),
            operation: ActiveValue::Set(operation.as_str().to_string()),
            modified_date: ActiveValue::Set(modified_date),
            attempts: ActiveValue::Set(0),
            last_error: ActiveValue::Set(None),
        };
        Ok(change.insert(conn).await?)
    }

    /// Get pending changes with `after < seq <= up_to`, oldest first.
    pub async fn get_range<C>(conn: &C, after: i32, up_to: i32, limit: u64) -> Result<Vec<pending_change::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(pending_change::Entity::find()
            .filter(pending_change::Column::Seq.gt(after))
            .filter(pending_change::Column::Seq.lte(up_to))
            .order_by_asc(pending_change::Column::Seq)
            .limit(limit)
            .all(conn)
            .await?)
    }

    /// Highest sequence number currently in the log.
    pub async fn last_seq<C>(conn: &C) -> Result<Option<i32>>
    where
        C: ConnectionTrait,
    {
        Ok(pending_change::Entity::find()
            .order_by_desc(pending_change::Column::Seq)
            .one(conn)
            .await?
            .map(|change| change.seq))
    }

    /// Whether a record has changes waiting to be pushed.
    pub async fn has_pending<C>(conn: &C, record_id: &Uuid) -> Result<bool>
    where
        C: ConnectionTrait,
    {
        let count = pending_change::Entity::find()
            .filter(pending_change::Column::RecordId.eq(*record_id))
            .count(conn)
            .await?;
        Ok(count > 0)
    }

    /// Total number of queued changes.
    pub async fn count<C>(conn: &C) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        Ok(pending_change::Entity::find().count(conn).await?)
    }

    /// Remove the changes of a record up to and including `up_to`.
    pub async fn delete_for_record_up_to<C>(conn: &C, record_id: &Uuid, up_to: i32) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        let result = pending_change::Entity::delete_many()
            .filter(pending_change::Column::RecordId.eq(*record_id))
            .filter(pending_change::Column::Seq.lte(up_to))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }

    /// Remove every queued change of a record.
    pub async fn delete_for_record<C>(conn: &C, record_id: &Uuid) -> Result<u64>
    where
        C: ConnectionTrait,
    {
        let result = pending_change::Entity::delete_many()
            .filter(pending_change::Column::RecordId.eq(*record_id))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }

    /// Bump the attempt counter of the given changes and remember the error.
    pub async fn record_failure<C>(conn: &C, seqs: &[i32], error: &str) -> Result<()>
    where
        C: ConnectionTrait,
    {
        use sea_orm::sea_query::Expr;
        if seqs.is_empty() {
            return Ok(());
        }
        pending_change::Entity::update_many()
            .col_expr(
                pending_change::Column::Attempts,
                Expr::col(pending_change::Column::Attempts).add(1),
            )
            .col_expr(pending_change::Column::LastError, Expr::value(error.to_string()))
            .filter(pending_change::Column::Seq.is_in(seqs.iter().copied()))
            .exec(conn)
            .await?;
        Ok(())
    }
}
