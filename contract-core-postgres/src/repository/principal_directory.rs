use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use contract_core_db::models::PrincipalModel;
use contract_core_db::repository::store::{PrincipalDirectory, StoreResult};

/// Principal lookup against the `principals` table.
///
/// Runs outside any unit of work: authorization happens before the gate
/// opens its transaction.
pub struct PgPrincipalDirectory {
    pool: Arc<PgPool>,
}

impl PgPrincipalDirectory {
    pub fn new(pool: Arc<PgPool>) -> Self {
        PgPrincipalDirectory { pool }
    }
}

#[async_trait]
impl PrincipalDirectory for PgPrincipalDirectory {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<PrincipalModel>> {
        let principal = sqlx::query_as::<_, PrincipalModel>(
            r#"SELECT id, display_name, role, is_active FROM principals WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await?;
        Ok(principal)
    }
}
