use std::marker::PhantomData;
use std::sync::Arc;

use uuid::Uuid;

use contract_core_api::{CoreError, CoreResult};

use crate::models::{AuditedEntity, ChangeRecordModel};
use crate::repository::pagination::{Page, PageRequest};
use crate::repository::store::AuditStore;

/// Read-side retrieval of an entity's change history.
///
/// Independent of the write path: queries run against committed state and
/// never join a unit of work. Records come back strictly newest-first
/// (`recorded_at` descending, insertion sequence breaking ties), which the
/// reporting surface renders as a timeline.
pub struct HistoryQueryService<T: AuditedEntity, S: AuditStore<T>> {
    store: Arc<S>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: AuditedEntity, S: AuditStore<T>> HistoryQueryService<T, S> {
    pub fn new(store: Arc<S>) -> Self {
        HistoryQueryService {
            store,
            _entity: PhantomData,
        }
    }

    /// Full history of one entity, newest first.
    pub async fn list(&self, entity_id: Uuid) -> CoreResult<Vec<ChangeRecordModel>> {
        Ok(self
            .list_page(entity_id, PageRequest::unbounded())
            .await?
            .items)
    }

    /// One page of history, newest first.
    pub async fn list_page(
        &self,
        entity_id: Uuid,
        page: PageRequest,
    ) -> CoreResult<Page<ChangeRecordModel>> {
        self.store
            .list_records(entity_id, page)
            .await
            .map_err(CoreError::storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DepartmentModel, DepartmentPatch, PrincipalModel};
    use crate::repository::memory::{MemoryAuditStore, MemoryPrincipalDirectory};
    use crate::service::access_guard::{AccessControlGuard, PermissionTable};
    use crate::service::mutation_gate::MutationGate;
    use contract_core_api::Role;

    #[tokio::test]
    async fn pages_preserve_newest_first_order() {
        let store: MemoryAuditStore<DepartmentModel> = MemoryAuditStore::new();
        let directory = MemoryPrincipalDirectory::new();
        let admin = PrincipalModel::new("Ada Admin", Role::Admin);
        let actor = admin.id;
        directory.insert(admin);

        let guard = Arc::new(AccessControlGuard::new(
            Arc::new(directory),
            PermissionTable::contract_administration(),
        ));
        let gate = MutationGate::new(Arc::new(store.clone()), guard);
        let history = HistoryQueryService::new(Arc::new(store.clone()));

        let created = gate.create(DepartmentModel::draft("Engineering"), actor).await.unwrap();
        for name in ["Platform", "Research", "Operations"] {
            let patch = DepartmentPatch {
                name: Some(name.into()),
                ..Default::default()
            };
            gate.update(created.id, patch, actor).await.unwrap();
        }

        let full = history.list(created.id).await.unwrap();
        assert_eq!(full.len(), 4);

        let first_page = history
            .list_page(created.id, PageRequest::new(2, 0))
            .await
            .unwrap();
        assert_eq!(first_page.items.len(), 2);
        assert_eq!(first_page.total, 4);
        assert!(first_page.has_more());
        assert_eq!(first_page.items.as_slice(), &full[..2]);

        let second_page = history
            .list_page(created.id, PageRequest::new(2, 2))
            .await
            .unwrap();
        assert_eq!(second_page.items.as_slice(), &full[2..]);
        assert!(!second_page.has_more());

        // An entity with no history yields an empty page, not an error.
        let empty = history.list(Uuid::new_v4()).await.unwrap();
        assert!(empty.is_empty());
    }
}
