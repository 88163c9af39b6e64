// API Skeleton
// Copyright 2024 The api-skeleton authors
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Template storage backed by a PostgreSQL database.

use crate::db::{Db, DbError, DbResult};
use crate::model::{Template, TemplateEditable, TemplateId};
use async_trait::async_trait;
use log::info;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use time::OffsetDateTime;

/// Schema to apply to an uninitialized database.
const SCHEMA: &str = include_str!("postgres.sql");

/// Converts an `e` returned by sqlx into our generic error types.
fn map_sqlx_error(e: sqlx::Error) -> DbError {
    match e {
        sqlx::Error::RowNotFound => DbError::NotFound,
        sqlx::Error::Database(e) => match e.code().as_deref() {
            Some("23503") => DbError::ForeignKeyViolation(e.message().to_owned()),
            Some("23505") => DbError::AlreadyExists,
            _ => DbError::BackendError(e.to_string()),
        },
        e => DbError::BackendError(e.to_string()),
    }
}

/// Builds a template out of one row of the `templates` table.
fn template_from_row(row: &PgRow) -> DbResult<Template> {
    let id: String = row.try_get("id").map_err(map_sqlx_error)?;
    let name: String = row.try_get("name").map_err(map_sqlx_error)?;
    let created_at: OffsetDateTime = row.try_get("created_at").map_err(map_sqlx_error)?;
    let updated_at: Option<OffsetDateTime> = row.try_get("updated_at").map_err(map_sqlx_error)?;
    Ok(Template::new(TemplateId::new(id)?, TemplateEditable::new(name), created_at, updated_at))
}

/// A database instance backed by a PostgreSQL database.
pub(crate) struct PostgresDb {
    /// Shared connection pool.
    pool: PgPool,
}

/// Establishes a connection pool against the server identified by `uri` and
/// applies the schema if it is not present yet.
pub(crate) async fn connect(uri: &str) -> Result<PostgresDb, String> {
    let pool = PgPoolOptions::new()
        .connect(uri)
        .await
        .map_err(|e| format!("Cannot connect to PostgreSQL: {}", e))?;
    sqlx::raw_sql(SCHEMA)
        .execute(&pool)
        .await
        .map_err(|e| format!("Cannot apply PostgreSQL schema: {}", e))?;
    info!("Connected to PostgreSQL backend");
    Ok(PostgresDb { pool })
}

#[async_trait]
impl Db for PostgresDb {
    async fn get_all_templates(&self) -> DbResult<Vec<Template>> {
        let rows =
            sqlx::query("SELECT id, name, created_at, updated_at FROM templates ORDER BY name")
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_error)?;
        rows.iter().map(template_from_row).collect()
    }

    async fn get_template_by_id(&self, id: &TemplateId) -> DbResult<Template> {
        let row =
            sqlx::query("SELECT id, name, created_at, updated_at FROM templates WHERE id = $1")
                .bind(id.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx_error)?;
        template_from_row(&row)
    }

    async fn create_template(&self, template: &Template) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO templates (id, name, created_at, updated_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(template.id().as_str())
        .bind(template.name())
        .bind(template.created_at())
        .bind(template.updated_at())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn update_template(&self, template: &Template) -> DbResult<()> {
        let done = sqlx::query("UPDATE templates SET name = $1, updated_at = $2 WHERE id = $3")
            .bind(template.name())
            .bind(template.updated_at())
            .bind(template.id().as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        if done.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    async fn delete_template(&self, id: &TemplateId) -> DbResult<()> {
        let done = sqlx::query("DELETE FROM templates WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        if done.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}
