use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use contract_core_db::models::{AuditedEntity, ChangeRecordModel, Identifiable};
use contract_core_db::repository::pagination::{Page, PageRequest};
use contract_core_db::repository::store::{AuditStore, EntityUnitOfWork, StoreResult};

use super::entity_sql::PgEntitySql;
use crate::unit_of_work::TxHandle;

/// Postgres-backed store for one audited entity family.
///
/// The write side couples the entity row and its change records in a
/// single transaction; the read side queries committed state straight
/// from the pool.
pub struct PgAuditStore<T> {
    pool: Arc<PgPool>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> PgAuditStore<T> {
    pub fn new(pool: Arc<PgPool>) -> Self {
        PgAuditStore {
            pool,
            _entity: PhantomData,
        }
    }
}

impl<T> Clone for PgAuditStore<T> {
    fn clone(&self) -> Self {
        PgAuditStore {
            pool: Arc::clone(&self.pool),
            _entity: PhantomData,
        }
    }
}

pub struct PgEntityUow<T> {
    tx: TxHandle,
    _entity: PhantomData<fn() -> T>,
}

#[async_trait]
impl<T: AuditedEntity + PgEntitySql> EntityUnitOfWork<T> for PgEntityUow<T> {
    async fn insert(&mut self, entity: &T) -> StoreResult<()> {
        let mut tx = self.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
        entity.insert_query().execute(&mut **transaction).await?;
        Ok(())
    }

    async fn load_for_update(&mut self, id: Uuid) -> StoreResult<Option<T>> {
        let mut tx = self.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
        let row = sqlx::query_as::<_, T>(T::SELECT_FOR_UPDATE)
            .bind(id)
            .fetch_optional(&mut **transaction)
            .await?;
        Ok(row)
    }

    async fn update(&mut self, entity: &T, expected_version: i64) -> StoreResult<bool> {
        let mut tx = self.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
        let rows_affected = entity
            .update_query(expected_version)
            .execute(&mut **transaction)
            .await?
            .rows_affected();
        if rows_affected == 0 {
            tracing::debug!(id = %entity.id(), expected_version, "version check failed");
        }
        Ok(rows_affected == 1)
    }

    async fn delete(&mut self, id: Uuid) -> StoreResult<bool> {
        let mut tx = self.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
        let rows_affected = sqlx::query(T::DELETE_BY_ID)
            .bind(id)
            .execute(&mut **transaction)
            .await?
            .rows_affected();
        Ok(rows_affected == 1)
    }

    async fn append_records(&mut self, records: &[ChangeRecordModel]) -> StoreResult<()> {
        let mut tx = self.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
        for record in records {
            sqlx::query(
                r#"
                INSERT INTO change_records
                (id, entity_id, entity_kind, field_name, old_value, new_value, change_kind, changed_by, recorded_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(record.id)
            .bind(record.entity_id)
            .bind(record.entity_kind)
            .bind(record.field_name.as_str())
            .bind(record.old_value.as_deref())
            .bind(record.new_value.as_deref())
            .bind(record.change_kind)
            .bind(record.changed_by)
            .bind(record.recorded_at)
            .execute(&mut **transaction)
            .await?;
        }
        Ok(())
    }

    async fn commit(self) -> StoreResult<()> {
        self.tx.commit().await
    }

    async fn rollback(self) -> StoreResult<()> {
        self.tx.rollback().await
    }
}

#[async_trait]
impl<T: AuditedEntity + PgEntitySql> AuditStore<T> for PgAuditStore<T> {
    type Uow = PgEntityUow<T>;

    async fn begin(&self) -> StoreResult<Self::Uow> {
        let tx = TxHandle::begin(&self.pool).await?;
        Ok(PgEntityUow {
            tx,
            _entity: PhantomData,
        })
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<T>> {
        let row = sqlx::query_as::<_, T>(T::SELECT_BY_ID)
            .bind(id)
            .fetch_optional(&*self.pool)
            .await?;
        Ok(row)
    }

    async fn list_records(
        &self,
        entity_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<Page<ChangeRecordModel>> {
        let total: i64 =
            sqlx::query_scalar(r#"SELECT COUNT(*) FROM change_records WHERE entity_id = $1"#)
                .bind(entity_id)
                .fetch_one(&*self.pool)
                .await?;

        let items = sqlx::query_as::<_, ChangeRecordModel>(
            r#"
            SELECT * FROM change_records
            WHERE entity_id = $1
            ORDER BY recorded_at DESC, seq DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(entity_id)
        .bind(page.limit.min(i64::MAX as usize) as i64)
        .bind(page.offset as i64)
        .fetch_all(&*self.pool)
        .await?;

        Ok(Page::new(items, total as usize, page.limit, page.offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::principal_directory::PgPrincipalDirectory;
    use crate::test_helper::{insert_test_principal, setup_test_pool};
    use contract_core_api::{ChangeKind, Role, WHOLE_ENTITY_FIELD};
    use contract_core_db::models::{DepartmentModel, DepartmentPatch, PrincipalModel};
    use contract_core_db::service::{
        AccessControlGuard, HistoryQueryService, MutationGate, PermissionTable,
    };

    #[tokio::test]
    #[ignore = "requires a PostgreSQL instance reachable via DATABASE_URL"]
    #[serial_test::serial]
    async fn department_lifecycle_is_recorded_transactionally(
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let pool = setup_test_pool().await?;
        let admin = PrincipalModel::new("Ada Admin", Role::Admin);
        insert_test_principal(&pool, &admin).await?;

        let store = Arc::new(PgAuditStore::<DepartmentModel>::new(Arc::clone(&pool)));
        let guard = Arc::new(AccessControlGuard::new(
            Arc::new(PgPrincipalDirectory::new(Arc::clone(&pool))),
            PermissionTable::contract_administration(),
        ));
        let gate = MutationGate::new(Arc::clone(&store), guard);
        let history = HistoryQueryService::new(Arc::clone(&store));

        let created = gate
            .create(DepartmentModel::draft("Engineering"), admin.id)
            .await?;
        let patch = DepartmentPatch {
            name: Some("Platform".into()),
            ..Default::default()
        };
        gate.update(created.id, patch, admin.id).await?;
        gate.delete(created.id, admin.id).await?;

        assert!(store.find_by_id(created.id).await?.is_none());

        let records = history.list(created.id).await?;
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].change_kind, ChangeKind::Delete);
        assert_eq!(records[0].field_name, WHOLE_ENTITY_FIELD);
        assert_eq!(records[1].change_kind, ChangeKind::Update);
        assert_eq!(records[1].old_value.as_deref(), Some("Engineering"));
        assert_eq!(records[1].new_value.as_deref(), Some("Platform"));
        assert_eq!(records[2].change_kind, ChangeKind::Create);

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires a PostgreSQL instance reachable via DATABASE_URL"]
    #[serial_test::serial]
    async fn rolled_back_units_of_work_leave_no_rows(
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let pool = setup_test_pool().await?;
        let admin = PrincipalModel::new("Ada Admin", Role::Admin);
        insert_test_principal(&pool, &admin).await?;

        let store = PgAuditStore::<DepartmentModel>::new(Arc::clone(&pool));
        let mut department = DepartmentModel::draft("Ephemeral");
        department.created_by = admin.id;
        department.updated_by = admin.id;

        let mut uow = store.begin().await?;
        uow.insert(&department).await?;
        assert!(uow.load_for_update(department.id).await?.is_some());
        uow.rollback().await?;

        assert!(store.find_by_id(department.id).await?.is_none());
        Ok(())
    }
}
