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

//! Database abstraction in terms of the operations needed by the server.
//!
//! The `Db` trait is the capability interface every storage backend must
//! satisfy.  Four interchangeable backends exist: the in-memory store, a
//! mock for tests, PostgreSQL and MongoDB.  `connect` instantiates exactly
//! one of them based on the service configuration.

use crate::config::DbOptions;
use crate::model::{ModelError, Template, TemplateId};
use async_trait::async_trait;
use std::sync::Arc;

pub(crate) mod memory;
pub(crate) mod mongo;
pub(crate) mod postgres;

/// Database errors.  Any unexpected errors that come from a backend are classified as
/// `BackendError`, but errors we know about have more specific types.
#[derive(Debug, thiserror::Error, PartialEq)]
pub(crate) enum DbError {
    /// Indicates that a request to create an entry failed because it already exists.
    #[error("Already exists")]
    AlreadyExists,

    /// Catch-all error type for unexpected database errors.
    #[error("Database error: {0}")]
    BackendError(String),

    /// Indicates that a write was rejected because it references a missing entity.
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Indicates that a requested entry does not exist.
    #[error("Entity not found")]
    NotFound,
}

impl From<ModelError> for DbError {
    fn from(e: ModelError) -> Self {
        DbError::BackendError(format!("Data integrity error: {}", e))
    }
}

/// Result type for this module.
pub(crate) type DbResult<T> = Result<T, DbError>;

/// Abstraction over the database connection.
///
/// Backends must classify their native failures into `DbError` kinds; no
/// driver-specific error type may leak to the callers of this trait.
#[mockall::automock]
#[async_trait]
pub(crate) trait Db {
    /// Gets all existing templates, ordered by name.
    async fn get_all_templates(&self) -> DbResult<Vec<Template>>;

    /// Gets the template with the given `id`.
    async fn get_template_by_id(&self, id: &TemplateId) -> DbResult<Template>;

    /// Persists a new `template`, failing if its id or name are already taken.
    async fn create_template(&self, template: &Template) -> DbResult<()>;

    /// Overwrites the stored template that shares `template`'s id.
    async fn update_template(&self, template: &Template) -> DbResult<()>;

    /// Deletes the template with the given `id`.
    async fn delete_template(&self, id: &TemplateId) -> DbResult<()>;
}

/// The backend instantiated by `connect`.
///
/// `memory` aliases `db` when the in-memory backend was selected so that the
/// monitoring router can expose the bulk export endpoint, which is not part
/// of the `Db` contract.
pub(crate) struct Connection {
    /// The selected backend.
    pub(crate) db: Arc<dyn Db + Send + Sync>,

    /// The same backend, typed, when it is the in-memory one.
    pub(crate) memory: Option<Arc<memory::MemoryDb>>,
}

#[cfg(test)]
impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection").field("memory", &self.memory).finish_non_exhaustive()
    }
}

/// Instantiates the one storage backend described by `opts`.
///
/// The rules are ordered and the first match wins: the mock flag, the
/// in-memory flag and finally the connection URI prefix.  A configuration
/// that matches none of them is an error so that startup fails loudly
/// instead of silently falling back to a non-durable store.
pub(crate) async fn connect(opts: &DbOptions) -> Result<Connection, String> {
    if opts.mock {
        log::info!("Using the mock database backend");
        return Ok(Connection { db: Arc::new(MockDb::new()), memory: None });
    }

    if opts.in_memory {
        let db = match &opts.in_memory_import_file {
            Some(path) => {
                log::info!("Using the in-memory database backend with dataset {}", path);
                memory::MemoryDb::load(path)?
            }
            None => {
                log::info!("Using the in-memory database backend");
                memory::MemoryDb::default()
            }
        };
        let db = Arc::new(db);
        return Ok(Connection { db: db.clone(), memory: Some(db) });
    }

    match opts.connection_uri.as_deref() {
        Some(uri) if uri.starts_with("postgresql://") => {
            log::info!("Using the PostgreSQL database backend");
            let db = postgres::connect(uri).await?;
            Ok(Connection { db: Arc::new(db), memory: None })
        }
        Some(uri) if uri.starts_with("mongodb://") => {
            let name = opts
                .db_name
                .as_deref()
                .ok_or_else(|| "The MongoDB backend requires a database name".to_owned())?;
            log::info!("Using the MongoDB database backend with database {}", name);
            let db = mongo::connect(uri, name).await?;
            Ok(Connection { db: Arc::new(db), memory: None })
        }
        Some(uri) => Err(format!("Connection URI '{}' does not match any known backend", uri)),
        None => Err("No database backend configured".to_owned()),
    }
}
