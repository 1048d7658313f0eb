use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

use contract_core_api::{CoreError, CoreResult, EntityKind, FieldSnapshot};

use super::audited::{AuditedEntity, Identifiable};

/// Database model for contract status enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "contract_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ContractStatus {
    Draft,
    Pending,
    Active,
    Expired,
    Terminated,
}

impl std::fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContractStatus::Draft => write!(f, "draft"),
            ContractStatus::Pending => write!(f, "pending"),
            ContractStatus::Active => write!(f, "active"),
            ContractStatus::Expired => write!(f, "expired"),
            ContractStatus::Terminated => write!(f, "terminated"),
        }
    }
}

impl FromStr for ContractStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ContractStatus::Draft),
            "pending" => Ok(ContractStatus::Pending),
            "active" => Ok(ContractStatus::Active),
            "expired" => Ok(ContractStatus::Expired),
            "terminated" => Ok(ContractStatus::Terminated),
            _ => Err(()),
        }
    }
}

/// Database model for contract type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "contract_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ContractType {
    Employment,
    Service,
    Vendor,
    Other,
}

impl std::fmt::Display for ContractType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContractType::Employment => write!(f, "employment"),
            ContractType::Service => write!(f, "service"),
            ContractType::Vendor => write!(f, "vendor"),
            ContractType::Other => write!(f, "other"),
        }
    }
}

impl FromStr for ContractType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "employment" => Ok(ContractType::Employment),
            "service" => Ok(ContractType::Service),
            "vendor" => Ok(ContractType::Vendor),
            "other" => Ok(ContractType::Other),
            _ => Err(()),
        }
    }
}

/// Database model for a contract, the primary audited entity family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ContractModel {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: ContractStatus,
    pub value: Option<Decimal>,
    pub currency: String,
    pub contract_type: ContractType,
    pub contract_number: Option<String>,
    pub department_id: Option<Uuid>,
    pub is_active: bool,

    // Bookkeeping; excluded from diffing.
    pub created_by: Uuid,
    pub updated_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

impl ContractModel {
    /// A draft contract with default status/currency, ready for the gate's
    /// `create`. Ownership fields are stamped by the gate, not the caller.
    pub fn draft(
        title: impl Into<String>,
        contract_type: ContractType,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        ContractModel {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            start_date,
            end_date,
            status: ContractStatus::Draft,
            value: None,
            currency: "USD".to_string(),
            contract_type,
            contract_number: None,
            department_id: None,
            is_active: true,
            created_by: Uuid::nil(),
            updated_by: Uuid::nil(),
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }
}

/// Partial update for a contract.
///
/// Outer `None` leaves a field untouched; for nullable fields the inner
/// option distinguishes "set to null" from "leave as is".
#[derive(Debug, Clone, Default)]
pub struct ContractPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: Option<ContractStatus>,
    pub value: Option<Option<Decimal>>,
    pub currency: Option<String>,
    pub contract_type: Option<ContractType>,
    pub contract_number: Option<Option<String>>,
    pub department_id: Option<Option<Uuid>>,
    pub is_active: Option<bool>,
}

impl Identifiable for ContractModel {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl AuditedEntity for ContractModel {
    const KIND: EntityKind = EntityKind::Contract;
    type Patch = ContractPatch;

    fn snapshot(&self) -> FieldSnapshot {
        let mut snapshot = FieldSnapshot::new();
        snapshot.insert("title".into(), self.title.as_str().into());
        snapshot.insert("description".into(), self.description.clone().into());
        snapshot.insert("start_date".into(), self.start_date.into());
        snapshot.insert("end_date".into(), self.end_date.into());
        snapshot.insert("status".into(), self.status.to_string().into());
        snapshot.insert("value".into(), self.value.into());
        snapshot.insert("currency".into(), self.currency.as_str().into());
        snapshot.insert("contract_type".into(), self.contract_type.to_string().into());
        snapshot.insert("contract_number".into(), self.contract_number.clone().into());
        snapshot.insert("department_id".into(), self.department_id.into());
        snapshot.insert("is_active".into(), self.is_active.into());
        snapshot
    }

    fn apply_patch(&mut self, patch: &ContractPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(start_date) = patch.start_date {
            self.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            self.end_date = end_date;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(value) = patch.value {
            self.value = value;
        }
        if let Some(currency) = &patch.currency {
            self.currency = currency.clone();
        }
        if let Some(contract_type) = patch.contract_type {
            self.contract_type = contract_type;
        }
        if let Some(contract_number) = &patch.contract_number {
            self.contract_number = contract_number.clone();
        }
        if let Some(department_id) = patch.department_id {
            self.department_id = department_id;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
    }

    fn validate(&self) -> CoreResult<()> {
        if self.title.trim().is_empty() {
            return Err(CoreError::Validation("contract title must not be empty".into()));
        }
        if self.title.len() > 255 {
            return Err(CoreError::Validation(
                "contract title must not exceed 255 characters".into(),
            ));
        }
        if self.currency.len() != 3 {
            return Err(CoreError::Validation(
                "currency must be a 3-letter code".into(),
            ));
        }
        if self.end_date < self.start_date {
            return Err(CoreError::Validation(
                "contract end date must not precede its start date".into(),
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

    fn test_contract() -> ContractModel {
        ContractModel::draft(
            "Service agreement",
            ContractType::Service,
            Utc::now(),
            Utc::now() + chrono::Duration::days(365),
        )
    }

    #[test]
    fn snapshot_excludes_bookkeeping_fields() {
        let snapshot = test_contract().snapshot();
        assert!(!snapshot.contains_key("updated_by"));
        assert!(!snapshot.contains_key("updated_at"));
        assert!(!snapshot.contains_key("created_by"));
        assert!(!snapshot.contains_key("version"));
        assert_eq!(snapshot.len(), 11);
    }

    #[test]
    fn draft_defaults_match_the_schema_defaults() {
        let contract = test_contract();
        assert_eq!(contract.status, ContractStatus::Draft);
        assert_eq!(contract.currency, "USD");
        assert!(contract.is_active);
        assert_eq!(contract.version, 1);
    }

    #[test]
    fn validation_rejects_inverted_date_range() {
        let mut contract = test_contract();
        contract.end_date = contract.start_date - chrono::Duration::days(1);
        assert!(matches!(contract.validate(), Err(CoreError::Validation(_))));
    }

    #[test]
    fn patch_can_null_out_a_nullable_field() {
        let mut contract = test_contract();
        contract.description = Some("old".into());
        let patch = ContractPatch {
            description: Some(None),
            ..Default::default()
        };
        contract.apply_patch(&patch);
        assert_eq!(contract.description, None);
    }
}
