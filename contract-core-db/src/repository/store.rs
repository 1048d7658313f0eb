use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{AuditedEntity, ChangeRecordModel, PrincipalModel};
use crate::repository::pagination::{Page, PageRequest};

pub type StoreResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// One atomic unit of work over a single audited entity.
///
/// Every mutation the gate performs (the primary write and its change
/// records) goes through one value of this trait and commits or rolls
/// back together. There is no audit path outside the unit of work.
#[async_trait]
pub trait EntityUnitOfWork<T: AuditedEntity>: Send {
    /// Persist a new entity. Fails if the id already exists.
    async fn insert(&mut self, entity: &T) -> StoreResult<()>;

    /// Load the current state for a read-modify-write, taking whatever
    /// lock the backend uses to serialize conflicting writers.
    async fn load_for_update(&mut self, id: Uuid) -> StoreResult<Option<T>>;

    /// Persist the next state iff the stored version still equals
    /// `expected_version`. Returns `false` when a concurrent writer won
    /// the race; the caller decides whether to retry.
    async fn update(&mut self, entity: &T, expected_version: i64) -> StoreResult<bool>;

    /// Remove the entity row. Returns `false` if it was already gone.
    async fn delete(&mut self, id: Uuid) -> StoreResult<bool>;

    /// Append change records to the log. Append-only; records are never
    /// updated or deleted.
    async fn append_records(&mut self, records: &[ChangeRecordModel]) -> StoreResult<()>;

    /// Commit everything staged in this unit of work.
    async fn commit(self) -> StoreResult<()>;

    /// Discard everything staged in this unit of work.
    async fn rollback(self) -> StoreResult<()>;
}

/// Storage backend for one audited entity family.
///
/// `begin` opens the write side; `find_by_id`/`list_records` are the read
/// side and run outside any unit of work, so history reads never block
/// writers.
#[async_trait]
pub trait AuditStore<T: AuditedEntity>: Send + Sync {
    type Uow: EntityUnitOfWork<T>;

    async fn begin(&self) -> StoreResult<Self::Uow>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<T>>;

    /// Change records for an entity, most recent first (`recorded_at`
    /// descending, insertion sequence descending on ties).
    async fn list_records(
        &self,
        entity_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<Page<ChangeRecordModel>>;
}

/// Lookup of acting principals for the access control guard.
#[async_trait]
pub trait PrincipalDirectory: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<PrincipalModel>>;
}
