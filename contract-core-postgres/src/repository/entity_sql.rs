use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::Postgres;

/// Per-entity SQL for the generic Postgres store.
///
/// One implementation per audited entity family; the shared store logic in
/// [`super::audit_store`] stays entity-agnostic.
pub trait PgEntitySql: for<'r> sqlx::FromRow<'r, PgRow> + Unpin + Send + Sync {
    /// Plain read, used outside any unit of work.
    const SELECT_BY_ID: &'static str;

    /// Read-for-write with a row lock (`FOR UPDATE`), so concurrent
    /// writers of the same row serialize for the duration of the
    /// read-modify-write-audit transaction.
    const SELECT_FOR_UPDATE: &'static str;

    const DELETE_BY_ID: &'static str;

    /// Insert the full row.
    fn insert_query(&self) -> Query<'_, Postgres, PgArguments>;

    /// Write the next state, guarded by `version = expected_version`.
    /// Zero affected rows means a concurrent writer won the race.
    fn update_query(&self, expected_version: i64) -> Query<'_, Postgres, PgArguments>;
}
