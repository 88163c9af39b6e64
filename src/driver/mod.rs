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

//! Business logic for the service.
//!
//! The `Driver` sits between the REST layer and the storage backend: it owns
//! identifier and timestamp assignment and the optimistic concurrency
//! checks, and it never deals in HTTP concepts.

use crate::clocks::Clock;
use crate::db::{Db, DbError};
use std::sync::Arc;

mod templates;
#[cfg(test)]
pub(crate) mod testutils;

/// Business logic errors.
#[derive(Debug, PartialEq, thiserror::Error)]
pub(crate) enum DriverError {
    /// Indicates that an entity could not be created because it already exists.
    #[error("Already exists")]
    AlreadyExists,

    /// Catch-all error for unexpected problems in a backend.
    #[error("{0}")]
    BackendError(String),

    /// Indicates that a write referenced an entity that does not exist.
    #[error("{0}")]
    ForeignKeyViolation(String),

    /// Indicates that a requested entity does not exist.
    #[error("Entity not found")]
    NotFound,

    /// Indicates that a conditional write named a version of the entity that
    /// is not the current one.
    #[error("Version mismatch")]
    VersionMismatch,
}

impl From<DbError> for DriverError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::AlreadyExists => DriverError::AlreadyExists,
            DbError::BackendError(msg) => DriverError::BackendError(msg),
            DbError::ForeignKeyViolation(msg) => DriverError::ForeignKeyViolation(msg),
            DbError::NotFound => DriverError::NotFound,
        }
    }
}

/// Result type for this module.
pub(crate) type DriverResult<T> = Result<T, DriverError>;

/// Entry point to the business logic.  Cheap to clone, one per request.
#[derive(Clone)]
pub(crate) struct Driver {
    /// The storage backend the data lives in.
    db: Arc<dyn Db + Send + Sync>,

    /// Clock used to assign timestamps to new and updated entities.
    clock: Arc<dyn Clock + Send + Sync>,
}

impl Driver {
    /// Creates a driver backed by `db` and `clock`.
    pub(crate) fn new(db: Arc<dyn Db + Send + Sync>, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self { db, clock }
    }
}
