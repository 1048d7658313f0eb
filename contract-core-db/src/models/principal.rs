use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use contract_core_api::Role;

use super::audited::Identifiable;

/// Database model for an acting principal.
///
/// The audit log stores the principal's id as a point-in-time snapshot; a
/// record stays attributable even after the principal is deactivated or
/// its role changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PrincipalModel {
    pub id: Uuid,
    pub display_name: String,
    pub role: Role,
    pub is_active: bool,
}

impl PrincipalModel {
    pub fn new(display_name: impl Into<String>, role: Role) -> Self {
        PrincipalModel {
            id: Uuid::new_v4(),
            display_name: display_name.into(),
            role,
            is_active: true,
        }
    }
}

impl Identifiable for PrincipalModel {
    fn id(&self) -> Uuid {
        self.id
    }
}
