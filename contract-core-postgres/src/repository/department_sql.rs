use contract_core_db::models::DepartmentModel;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::Postgres;

use super::entity_sql::PgEntitySql;

impl PgEntitySql for DepartmentModel {
    const SELECT_BY_ID: &'static str = r#"SELECT * FROM departments WHERE id = $1"#;

    const SELECT_FOR_UPDATE: &'static str = r#"SELECT * FROM departments WHERE id = $1 FOR UPDATE"#;

    const DELETE_BY_ID: &'static str = r#"DELETE FROM departments WHERE id = $1"#;

    fn insert_query(&self) -> Query<'_, Postgres, PgArguments> {
        sqlx::query(
            r#"
            INSERT INTO departments
            (id, name, description, manager_id, is_active, created_by, updated_by, created_at, updated_at, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(self.id)
        .bind(self.name.as_str())
        .bind(self.description.as_deref())
        .bind(self.manager_id)
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
            UPDATE departments SET
            name = $2, description = $3, manager_id = $4, is_active = $5,
            updated_by = $6, updated_at = $7, version = $8
            WHERE id = $1 AND version = $9
            "#,
        )
        .bind(self.id)
        .bind(self.name.as_str())
        .bind(self.description.as_deref())
        .bind(self.manager_id)
        .bind(self.is_active)
        .bind(self.updated_by)
        .bind(self.updated_at)
        .bind(self.version)
        .bind(expected_version)
    }
}
