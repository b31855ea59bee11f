//! Generic queries over a revision table.
//!
//! Page and image revisions share one storage shape: an owner foreign key,
//! a `created_at` timestamp and an `is_current` flag that a partial unique
//! index restricts to a single row per owner. Chain order is
//! `(created_at, id)`.

use std::marker::PhantomData;

use folio_core::types::{DbId, Timestamp};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgConnection, PgExecutor};

/// Static description of a revision table.
pub trait ChainTable: for<'r> FromRow<'r, PgRow> + Send + Unpin {
    /// Entity name used in not-found errors.
    const ENTITY: &'static str;
    const TABLE: &'static str;
    /// Foreign key column pointing at the owner.
    const OWNER_COLUMN: &'static str;
    /// Select list producing a full row.
    const COLUMNS: &'static str;
}

/// Read and maintenance queries for one revision table.
pub struct RevisionChain<R>(PhantomData<R>);

impl<R: ChainTable> RevisionChain<R> {
    /// The newest revision of an owner.
    pub async fn latest<'e, E: PgExecutor<'e>>(
        executor: E,
        owner_id: DbId,
    ) -> Result<Option<R>, sqlx::Error> {
        let query = format!(
            "SELECT {cols} FROM {table}
             WHERE {owner} = $1
             ORDER BY created_at DESC, id DESC
             LIMIT 1",
            cols = R::COLUMNS,
            table = R::TABLE,
            owner = R::OWNER_COLUMN,
        );
        sqlx::query_as::<_, R>(&query)
            .bind(owner_id)
            .fetch_optional(executor)
            .await
    }

    /// All revisions of an owner, newest first.
    pub async fn list<'e, E: PgExecutor<'e>>(
        executor: E,
        owner_id: DbId,
    ) -> Result<Vec<R>, sqlx::Error> {
        let query = format!(
            "SELECT {cols} FROM {table}
             WHERE {owner} = $1
             ORDER BY created_at DESC, id DESC",
            cols = R::COLUMNS,
            table = R::TABLE,
            owner = R::OWNER_COLUMN,
        );
        sqlx::query_as::<_, R>(&query)
            .bind(owner_id)
            .fetch_all(executor)
            .await
    }

    /// A revision by id, only if it belongs to `owner_id`.
    pub async fn find<'e, E: PgExecutor<'e>>(
        executor: E,
        owner_id: DbId,
        id: DbId,
    ) -> Result<Option<R>, sqlx::Error> {
        let query = format!(
            "SELECT {cols} FROM {table} WHERE {owner} = $1 AND id = $2",
            cols = R::COLUMNS,
            table = R::TABLE,
            owner = R::OWNER_COLUMN,
        );
        sqlx::query_as::<_, R>(&query)
            .bind(owner_id)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// The revision immediately preceding the one identified by
    /// `(created_at, id)` in the owner's chain.
    pub async fn previous<'e, E: PgExecutor<'e>>(
        executor: E,
        owner_id: DbId,
        created_at: Timestamp,
        id: DbId,
    ) -> Result<Option<R>, sqlx::Error> {
        let query = format!(
            "SELECT {cols} FROM {table}
             WHERE {owner} = $1 AND (created_at, id) < ($2, $3)
             ORDER BY created_at DESC, id DESC
             LIMIT 1",
            cols = R::COLUMNS,
            table = R::TABLE,
            owner = R::OWNER_COLUMN,
        );
        sqlx::query_as::<_, R>(&query)
            .bind(owner_id)
            .bind(created_at)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Clear the current flag on the owner's current revision.
    ///
    /// Must run inside the transaction that inserts the replacement, after
    /// the owner row has been locked.
    pub async fn demote_current(conn: &mut PgConnection, owner_id: DbId) -> Result<(), sqlx::Error> {
        let query = format!(
            "UPDATE {table} SET is_current = false WHERE {owner} = $1 AND is_current",
            table = R::TABLE,
            owner = R::OWNER_COLUMN,
        );
        sqlx::query(&query).bind(owner_id).execute(conn).await?;
        Ok(())
    }
}
