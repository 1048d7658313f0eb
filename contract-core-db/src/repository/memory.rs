//! In-memory reference store.
//!
//! Backs the hermetic test suite and documents the storage contract the
//! Postgres backend must honor. Units of work stage their writes and apply
//! them on commit under a store-wide lock, so a dropped or rolled-back
//! unit leaves no trace. The Postgres backend locks per row instead; the
//! coarse lock here is acceptable for a reference implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::models::{AuditedEntity, ChangeRecordModel, Identifiable, PrincipalModel};
use crate::repository::pagination::{Page, PageRequest};
use crate::repository::store::{
    AuditStore, EntityUnitOfWork, PrincipalDirectory, StoreResult,
};

struct Shared<T> {
    entities: HashMap<Uuid, T>,
    records: Vec<ChangeRecordModel>,
    next_seq: i64,
}

impl<T> Shared<T> {
    fn new() -> Self {
        Shared {
            entities: HashMap::new(),
            records: Vec::new(),
            next_seq: 0,
        }
    }
}

#[derive(Default)]
struct Faults {
    append_failures: u32,
    cas_conflicts: u32,
}

enum Staged<T> {
    Insert(T),
    Update(T),
    Delete(Uuid),
    Append(Vec<ChangeRecordModel>),
}

pub struct MemoryAuditStore<T> {
    shared: Arc<Mutex<Shared<T>>>,
    faults: Arc<std::sync::Mutex<Faults>>,
}

impl<T> Clone for MemoryAuditStore<T> {
    fn clone(&self) -> Self {
        MemoryAuditStore {
            shared: Arc::clone(&self.shared),
            faults: Arc::clone(&self.faults),
        }
    }
}

impl<T> Default for MemoryAuditStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MemoryAuditStore<T> {
    pub fn new() -> Self {
        MemoryAuditStore {
            shared: Arc::new(Mutex::new(Shared::new())),
            faults: Arc::new(std::sync::Mutex::new(Faults::default())),
        }
    }

    /// Make the next `n` record appends fail with a storage error. Lets
    /// tests prove that a failed audit write aborts the whole mutation.
    pub fn inject_append_failures(&self, n: u32) {
        self.faults.lock().expect("fault lock poisoned").append_failures = n;
    }

    /// Make the next `n` version checks report a lost race. Lets tests
    /// exercise the gate's bounded conflict retry.
    pub fn inject_cas_conflicts(&self, n: u32) {
        self.faults.lock().expect("fault lock poisoned").cas_conflicts = n;
    }
}

pub struct MemoryUnitOfWork<T: AuditedEntity> {
    guard: OwnedMutexGuard<Shared<T>>,
    staged: Vec<Staged<T>>,
    faults: Arc<std::sync::Mutex<Faults>>,
}

#[async_trait]
impl<T: AuditedEntity> EntityUnitOfWork<T> for MemoryUnitOfWork<T> {
    async fn insert(&mut self, entity: &T) -> StoreResult<()> {
        if self.guard.entities.contains_key(&entity.id()) {
            return Err(format!("duplicate entity id {}", entity.id()).into());
        }
        self.staged.push(Staged::Insert(entity.clone()));
        Ok(())
    }

    async fn load_for_update(&mut self, id: Uuid) -> StoreResult<Option<T>> {
        Ok(self.guard.entities.get(&id).cloned())
    }

    async fn update(&mut self, entity: &T, expected_version: i64) -> StoreResult<bool> {
        {
            let mut faults = self.faults.lock().expect("fault lock poisoned");
            if faults.cas_conflicts > 0 {
                faults.cas_conflicts -= 1;
                return Ok(false);
            }
        }
        match self.guard.entities.get(&entity.id()) {
            Some(current) if current.version() == expected_version => {
                self.staged.push(Staged::Update(entity.clone()));
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&mut self, id: Uuid) -> StoreResult<bool> {
        if !self.guard.entities.contains_key(&id) {
            return Ok(false);
        }
        self.staged.push(Staged::Delete(id));
        Ok(true)
    }

    async fn append_records(&mut self, records: &[ChangeRecordModel]) -> StoreResult<()> {
        {
            let mut faults = self.faults.lock().expect("fault lock poisoned");
            if faults.append_failures > 0 {
                faults.append_failures -= 1;
                return Err("injected storage failure during record append".into());
            }
        }
        self.staged.push(Staged::Append(records.to_vec()));
        Ok(())
    }

    async fn commit(mut self) -> StoreResult<()> {
        let state = &mut *self.guard;
        for op in self.staged.drain(..) {
            match op {
                Staged::Insert(entity) | Staged::Update(entity) => {
                    state.entities.insert(entity.id(), entity);
                }
                Staged::Delete(id) => {
                    state.entities.remove(&id);
                }
                Staged::Append(records) => {
                    for mut record in records {
                        state.next_seq += 1;
                        record.seq = state.next_seq;
                        state.records.push(record);
                    }
                }
            }
        }
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        // Staged writes are simply dropped.
        Ok(())
    }
}

#[async_trait]
impl<T: AuditedEntity> AuditStore<T> for MemoryAuditStore<T> {
    type Uow = MemoryUnitOfWork<T>;

    async fn begin(&self) -> StoreResult<Self::Uow> {
        let guard = Arc::clone(&self.shared).lock_owned().await;
        Ok(MemoryUnitOfWork {
            guard,
            staged: Vec::new(),
            faults: Arc::clone(&self.faults),
        })
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<T>> {
        Ok(self.shared.lock().await.entities.get(&id).cloned())
    }

    async fn list_records(
        &self,
        entity_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<Page<ChangeRecordModel>> {
        let state = self.shared.lock().await;
        let mut matching: Vec<ChangeRecordModel> = state
            .records
            .iter()
            .filter(|r| r.entity_id == entity_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.recorded_at
                .cmp(&a.recorded_at)
                .then(b.seq.cmp(&a.seq))
        });

        let total = matching.len();
        let items: Vec<ChangeRecordModel> = matching
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .collect();
        Ok(Page::new(items, total, page.limit, page.offset))
    }
}

/// In-memory principal lookup for the access control guard.
#[derive(Default, Clone)]
pub struct MemoryPrincipalDirectory {
    principals: Arc<std::sync::RwLock<HashMap<Uuid, PrincipalModel>>>,
}

impl MemoryPrincipalDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, principal: PrincipalModel) {
        self.principals
            .write()
            .expect("principal lock poisoned")
            .insert(principal.id, principal);
    }
}

#[async_trait]
impl PrincipalDirectory for MemoryPrincipalDirectory {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<PrincipalModel>> {
        Ok(self
            .principals
            .read()
            .expect("principal lock poisoned")
            .get(&id)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DepartmentModel;
    use chrono::Utc;
    use contract_core_api::{ChangeKind, EntityKind, FieldDelta};

    fn record_for(entity_id: Uuid) -> ChangeRecordModel {
        ChangeRecordModel::from_delta(
            entity_id,
            EntityKind::Department,
            FieldDelta::whole_entity(),
            ChangeKind::Create,
            Uuid::new_v4(),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn rolled_back_writes_leave_no_trace() {
        let store: MemoryAuditStore<DepartmentModel> = MemoryAuditStore::new();
        let department = DepartmentModel::draft("Engineering");
        let id = department.id;

        let mut uow = store.begin().await.unwrap();
        uow.insert(&department).await.unwrap();
        uow.append_records(&[record_for(id)]).await.unwrap();
        uow.rollback().await.unwrap();

        assert!(store.find_by_id(id).await.unwrap().is_none());
        let page = store.list_records(id, PageRequest::default()).await.unwrap();
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn committed_records_get_monotonic_sequence_numbers() {
        let store: MemoryAuditStore<DepartmentModel> = MemoryAuditStore::new();
        let department = DepartmentModel::draft("Engineering");
        let id = department.id;

        let mut uow = store.begin().await.unwrap();
        uow.insert(&department).await.unwrap();
        uow.append_records(&[record_for(id), record_for(id)]).await.unwrap();
        uow.commit().await.unwrap();

        let page = store.list_records(id, PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 2);
        // Newest first: higher seq before lower on equal timestamps.
        assert!(page.items[0].seq > page.items[1].seq);
    }

    #[tokio::test]
    async fn update_reports_a_lost_race_on_stale_version() {
        let store: MemoryAuditStore<DepartmentModel> = MemoryAuditStore::new();
        let department = DepartmentModel::draft("Engineering");
        let id = department.id;

        let mut uow = store.begin().await.unwrap();
        uow.insert(&department).await.unwrap();
        uow.commit().await.unwrap();

        let mut next = store.find_by_id(id).await.unwrap().unwrap();
        next.bump_version();
        let mut uow = store.begin().await.unwrap();
        let stale = department.version() + 41;
        assert!(!uow.update(&next, stale).await.unwrap());
        uow.rollback().await.unwrap();
    }
}
