use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use contract_core_api::{ChangeKind, CoreError, CoreResult, FieldDelta, FieldSnapshot, Operation};

use crate::detector::detect;
use crate::models::{AuditedEntity, ChangeRecordModel, Identifiable};
use crate::repository::store::{AuditStore, EntityUnitOfWork};
use crate::service::access_guard::AccessControlGuard;

/// Default number of transparent retries after a lost concurrent-update race.
pub const DEFAULT_CONFLICT_RETRIES: u32 = 3;

/// The single choke point for create/update/delete of an audited entity
/// family.
///
/// Every mutation runs as one unit of work: authorize, apply the primary
/// write, detect field deltas from explicit before/after snapshots, append
/// the change records, commit. If any step fails the whole unit rolls
/// back: a mutation never succeeds without its records, and no record
/// survives a failed mutation.
pub struct MutationGate<T: AuditedEntity, S: AuditStore<T>> {
    store: Arc<S>,
    guard: Arc<AccessControlGuard>,
    conflict_retries: u32,
    _entity: PhantomData<fn() -> T>,
}

impl<T: AuditedEntity, S: AuditStore<T>> MutationGate<T, S> {
    pub fn new(store: Arc<S>, guard: Arc<AccessControlGuard>) -> Self {
        MutationGate {
            store,
            guard,
            conflict_retries: DEFAULT_CONFLICT_RETRIES,
            _entity: PhantomData,
        }
    }

    pub fn with_conflict_retries(mut self, retries: u32) -> Self {
        self.conflict_retries = retries;
        self
    }

    /// Create `entity`, owned by `actor`, and record one whole-entity
    /// create fact in the same unit of work.
    pub async fn create(&self, mut entity: T, actor: Uuid) -> CoreResult<T> {
        self.guard.authorize(actor, Operation::Create, T::KIND).await?;

        let recorded_at = Utc::now();
        entity.stamp_created(actor, recorded_at);
        entity.validate()?;

        let mut uow = self.store.begin().await.map_err(CoreError::storage)?;
        if let Err(err) = uow.insert(&entity).await {
            Self::abort(uow).await;
            return Err(CoreError::storage(err));
        }

        let deltas = detect(&FieldSnapshot::new(), &entity.snapshot(), ChangeKind::Create);
        let records =
            Self::records_from(deltas, entity.id(), ChangeKind::Create, actor, recorded_at);
        if let Err(err) = uow.append_records(&records).await {
            Self::abort(uow).await;
            return Err(CoreError::storage(err));
        }
        uow.commit().await.map_err(CoreError::storage)?;

        tracing::debug!(id = %entity.id(), kind = %T::KIND, %actor, "entity created");
        Ok(entity)
    }

    /// Apply `patch` to the entity's current state and record one fact per
    /// business field that actually changed.
    ///
    /// A patch that resolves to zero deltas writes nothing at all, not
    /// even a bookkeeping update, and returns the current state
    /// unchanged. A lost concurrent-update race is retried against
    /// the fresh state up to the configured budget, so the recorded old
    /// values always reflect what was truly superseded.
    pub async fn update(&self, id: Uuid, patch: T::Patch, actor: Uuid) -> CoreResult<T> {
        self.guard.authorize(actor, Operation::Update, T::KIND).await?;

        let mut attempt = 0u32;
        loop {
            let mut uow = self.store.begin().await.map_err(CoreError::storage)?;
            let current = match uow.load_for_update(id).await {
                Ok(Some(entity)) => entity,
                Ok(None) => {
                    Self::abort(uow).await;
                    return Err(CoreError::NotFound { kind: T::KIND, id });
                }
                Err(err) => {
                    Self::abort(uow).await;
                    return Err(CoreError::storage(err));
                }
            };

            let previous = current.snapshot();
            let mut next = current.clone();
            next.apply_patch(&patch);
            if let Err(err) = next.validate() {
                Self::abort(uow).await;
                return Err(err);
            }

            let deltas = detect(&previous, &next.snapshot(), ChangeKind::Update);
            if deltas.is_empty() {
                Self::abort(uow).await;
                return Ok(current);
            }

            let recorded_at = Utc::now();
            next.stamp_updated(actor, recorded_at);
            next.bump_version();

            match uow.update(&next, current.version()).await {
                Ok(true) => {}
                Ok(false) => {
                    Self::abort(uow).await;
                    if attempt >= self.conflict_retries {
                        return Err(CoreError::Conflict { kind: T::KIND, id });
                    }
                    attempt += 1;
                    tracing::warn!(%id, kind = %T::KIND, attempt, "lost update race, retrying against fresh state");
                    continue;
                }
                Err(err) => {
                    Self::abort(uow).await;
                    return Err(CoreError::storage(err));
                }
            }

            let records =
                Self::records_from(deltas, id, ChangeKind::Update, actor, recorded_at);
            if let Err(err) = uow.append_records(&records).await {
                Self::abort(uow).await;
                return Err(CoreError::storage(err));
            }
            uow.commit().await.map_err(CoreError::storage)?;

            tracing::debug!(%id, kind = %T::KIND, %actor, fields = records.len(), "entity updated");
            return Ok(next);
        }
    }

    /// Delete the entity and record one whole-entity delete fact,
    /// attributed to the deleting principal.
    pub async fn delete(&self, id: Uuid, actor: Uuid) -> CoreResult<()> {
        self.guard.authorize(actor, Operation::Delete, T::KIND).await?;

        let mut uow = self.store.begin().await.map_err(CoreError::storage)?;
        let current = match uow.load_for_update(id).await {
            Ok(Some(entity)) => entity,
            Ok(None) => {
                Self::abort(uow).await;
                return Err(CoreError::NotFound { kind: T::KIND, id });
            }
            Err(err) => {
                Self::abort(uow).await;
                return Err(CoreError::storage(err));
            }
        };

        match uow.delete(id).await {
            Ok(true) => {}
            Ok(false) => {
                Self::abort(uow).await;
                return Err(CoreError::NotFound { kind: T::KIND, id });
            }
            Err(err) => {
                Self::abort(uow).await;
                return Err(CoreError::storage(err));
            }
        }

        let recorded_at = Utc::now();
        let deltas = detect(&current.snapshot(), &FieldSnapshot::new(), ChangeKind::Delete);
        let records = Self::records_from(deltas, id, ChangeKind::Delete, actor, recorded_at);
        if let Err(err) = uow.append_records(&records).await {
            Self::abort(uow).await;
            return Err(CoreError::storage(err));
        }
        uow.commit().await.map_err(CoreError::storage)?;

        tracing::debug!(%id, kind = %T::KIND, %actor, "entity deleted");
        Ok(())
    }

    fn records_from(
        deltas: Vec<FieldDelta>,
        entity_id: Uuid,
        change_kind: ChangeKind,
        actor: Uuid,
        recorded_at: DateTime<Utc>,
    ) -> Vec<ChangeRecordModel> {
        deltas
            .into_iter()
            .map(|delta| {
                ChangeRecordModel::from_delta(
                    entity_id,
                    T::KIND,
                    delta,
                    change_kind,
                    actor,
                    recorded_at,
                )
            })
            .collect()
    }

    async fn abort(uow: S::Uow) {
        if let Err(err) = uow.rollback().await {
            tracing::warn!(error = %err, "unit-of-work rollback failed");
        }
    }
}
