use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use contract_core_api::{CoreError, CoreResult, EntityKind, FieldSnapshot};

use super::audited::{AuditedEntity, Identifiable};

/// Database model for a department, the second audited entity family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DepartmentModel {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub manager_id: Option<Uuid>,
    pub is_active: bool,

    // Bookkeeping; excluded from diffing.
    pub created_by: Uuid,
    pub updated_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl DepartmentModel {
    pub fn draft(name: impl Into<String>) -> Self {
        let now = Utc::now();
        DepartmentModel {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            manager_id: None,
            is_active: true,
            created_by: Uuid::nil(),
            updated_by: Uuid::nil(),
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }
}

/// Partial update for a department. Same outer/inner option convention as
/// [`super::contract::ContractPatch`].
#[derive(Debug, Clone, Default)]
pub struct DepartmentPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub manager_id: Option<Option<Uuid>>,
    pub is_active: Option<bool>,
}

impl Identifiable for DepartmentModel {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl AuditedEntity for DepartmentModel {
    const KIND: EntityKind = EntityKind::Department;
    type Patch = DepartmentPatch;

    fn snapshot(&self) -> FieldSnapshot {
        let mut snapshot = FieldSnapshot::new();
        snapshot.insert("name".into(), self.name.as_str().into());
        snapshot.insert("description".into(), self.description.clone().into());
        snapshot.insert("manager_id".into(), self.manager_id.into());
        snapshot.insert("is_active".into(), self.is_active.into());
        snapshot
    }

    fn apply_patch(&mut self, patch: &DepartmentPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(manager_id) = patch.manager_id {
            self.manager_id = manager_id;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
    }

    fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::Validation("department name must not be empty".into()));
        }
        if self.name.len() > 255 {
            return Err(CoreError::Validation(
                "department name must not exceed 255 characters".into(),
            ));
        }
        Ok(())
    }

    fn created_by(&self) -> Uuid {
        self.created_by
    }

    fn updated_by(&self) -> Uuid {
        self.updated_by
    }

    fn stamp_created(&mut self, actor: Uuid, at: DateTime<Utc>) {
        self.created_by = actor;
        self.updated_by = actor;
        self.created_at = at;
        self.updated_at = at;
    }

    fn stamp_updated(&mut self, actor: Uuid, at: DateTime<Utc>) {
        self.updated_by = actor;
        self.updated_at = at;
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn bump_version(&mut self) {
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_tracks_only_business_fields() {
        let department = DepartmentModel::draft("Engineering");
        let snapshot = department.snapshot();
        assert_eq!(snapshot.len(), 4);
        assert!(snapshot.contains_key("name"));
        assert!(!snapshot.contains_key("updated_by"));
    }

    #[test]
    fn validation_rejects_blank_names() {
        let department = DepartmentModel::draft("   ");
        assert!(matches!(department.validate(), Err(CoreError::Validation(_))));
    }
}
