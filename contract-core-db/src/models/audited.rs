use chrono::{DateTime, Utc};
use uuid::Uuid;

use contract_core_api::{CoreResult, EntityKind, FieldSnapshot};

/// Trait for entities that can be uniquely identified by a UUID
pub trait Identifiable {
    /// Returns the unique identifier of the entity
    fn id(&self) -> Uuid;
}

/// An entity whose create/update/delete mutations must be durably audited.
///
/// The mutation gate drives every write through this trait: it stamps the
/// acting principal, applies typed patches, and hands before/after
/// [`FieldSnapshot`]s to the change detector. Implementations decide which
/// fields are tracked by what they put into `snapshot()`; bookkeeping
/// fields (`updated_by`, `updated_at`, `version`) must never appear there.
pub trait AuditedEntity: Identifiable + Clone + Send + Sync + 'static {
    /// The entity family this type belongs to.
    const KIND: EntityKind;

    /// Partial-update input. Cloneable so the gate can reapply it when a
    /// conflicting writer forces a retry.
    type Patch: Clone + Send + Sync;

    /// The tracked business fields, keyed by field name.
    fn snapshot(&self) -> FieldSnapshot;

    /// Apply a patch to produce the next state. Does not touch bookkeeping
    /// fields; the gate stamps those separately.
    fn apply_patch(&mut self, patch: &Self::Patch);

    /// Check structural invariants of the current state.
    fn validate(&self) -> CoreResult<()>;

    /// Principal that created the entity. Immutable after creation.
    fn created_by(&self) -> Uuid;

    /// Principal that performed the most recent mutation.
    fn updated_by(&self) -> Uuid;

    /// Stamp ownership and timestamps at creation time.
    fn stamp_created(&mut self, actor: Uuid, at: DateTime<Utc>);

    /// Stamp the most recent mutator and its timestamp.
    fn stamp_updated(&mut self, actor: Uuid, at: DateTime<Utc>);

    /// Optimistic concurrency token, incremented on every persisted update.
    fn version(&self) -> i64;

    fn bump_version(&mut self);
}
