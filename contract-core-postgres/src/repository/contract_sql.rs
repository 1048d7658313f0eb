use contract_core_db::models::ContractModel;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::Postgres;

use super::entity_sql::PgEntitySql;

impl PgEntitySql for ContractModel {
    const SELECT_BY_ID: &'static str = r#"SELECT * FROM contracts WHERE id = $1"#;

    const SELECT_FOR_UPDATE: &'static str = r#"SELECT * FROM contracts WHERE id = $1 FOR UPDATE"#;

    const DELETE_BY_ID: &'static str = r#"DELETE FROM contracts WHERE id = $1"#;

    fn insert_query(&self) -> Query<'_, Postgres, PgArguments> {
        sqlx::query(
            r#"
            INSERT INTO contracts
            (id, title, description, start_date, end_date, status, value, currency, contract_type, contract_number, department_id, is_active, created_by, updated_by, created_at, updated_at, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(self.id)
        .bind(self.title.as_str())
        .bind(self.description.as_deref())
        .bind(self.start_date)
        .bind(self.end_date)
        .bind(self.status)
        .bind(self.value)
        .bind(self.currency.as_str())
        .bind(self.contract_type)
        .bind(self.contract_number.as_deref())
        .bind(self.department_id)
        .bind(self.is_active)
        .bind(self.created_by)
        .bind(self.updated_by)
        .bind(self.created_at)
        .bind(self.updated_at)
        .bind(self.version)
    }

    fn update_query(&self, expected_version: i64) -> Query<'_, Postgres, PgArguments> {
        sqlx::query(
            r#"
            UPDATE contracts SET
            title = $2, description = $3, start_date = $4, end_date = $5,
            status = $6, value = $7, currency = $8, contract_type = $9,
            contract_number = $10, department_id = $11, is_active = $12,
            updated_by = $13, updated_at = $14, version = $15
            WHERE id = $1 AND version = $16
            "#,
        )
        .bind(self.id)
        .bind(self.title.as_str())
        .bind(self.description.as_deref())
        .bind(self.start_date)
        .bind(self.end_date)
        .bind(self.status)
        .bind(self.value)
        .bind(self.currency.as_str())
        .bind(self.contract_type)
        .bind(self.contract_number.as_deref())
        .bind(self.department_id)
        .bind(self.is_active)
        .bind(self.updated_by)
        .bind(self.updated_at)
        .bind(self.version)
        .bind(expected_version)
    }
}
