use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use contract_core_api::{ChangeKind, EntityKind, FieldDelta};

use super::audited::Identifiable;

/// # Documentation
/// - One immutable, append-only fact describing a single field-level (or
///   whole-entity) change to an audited entity.
/// - All records of one mutation share the same `recorded_at` instant; the
///   store-assigned `seq` breaks ties so history ordering is reproducible.
/// - Never updated or deleted once persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecordModel {
    pub id: Uuid,
    pub entity_id: Uuid,
    pub entity_kind: EntityKind,
    pub field_name: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub change_kind: ChangeKind,
    pub changed_by: Uuid,
    pub recorded_at: DateTime<Utc>,
    /// Insertion sequence, assigned by the store on append.
    #[serde(skip)]
    pub seq: i64,
}

impl ChangeRecordModel {
    pub fn from_delta(
        entity_id: Uuid,
        entity_kind: EntityKind,
        delta: FieldDelta,
        change_kind: ChangeKind,
        changed_by: Uuid,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        ChangeRecordModel {
            id: Uuid::new_v4(),
            entity_id,
            entity_kind,
            field_name: delta.field_name,
            old_value: delta.old_value,
            new_value: delta.new_value,
            change_kind,
            changed_by,
            recorded_at,
            seq: 0,
        }
    }
}

impl Identifiable for ChangeRecordModel {
    fn id(&self) -> Uuid {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contract_core_api::WHOLE_ENTITY_FIELD;

    #[test]
    fn serializes_with_camel_case_names_for_the_reporting_surface() {
        let record = ChangeRecordModel::from_delta(
            Uuid::new_v4(),
            EntityKind::Contract,
            FieldDelta {
                field_name: "status".into(),
                old_value: Some("draft".into()),
                new_value: Some("active".into()),
            },
            ChangeKind::Update,
            Uuid::new_v4(),
            Utc::now(),
        );

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["fieldName"], "status");
        assert_eq!(json["oldValue"], "draft");
        assert_eq!(json["newValue"], "active");
        assert_eq!(json["changeKind"], "update");
        assert!(json.get("changedBy").is_some());
        assert!(json.get("recordedAt").is_some());
        // Store-internal tie-breaker is not part of the surface.
        assert!(json.get("seq").is_none());
    }

    #[test]
    fn whole_entity_records_carry_no_values() {
        let record = ChangeRecordModel::from_delta(
            Uuid::new_v4(),
            EntityKind::Department,
            FieldDelta::whole_entity(),
            ChangeKind::Create,
            Uuid::new_v4(),
            Utc::now(),
        );
        assert_eq!(record.field_name, WHOLE_ENTITY_FIELD);
        assert_eq!(record.old_value, None);
        assert_eq!(record.new_value, None);
    }
}
