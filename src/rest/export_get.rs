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

//! Endpoint that dumps the full dataset of the in-memory backend.
//!
//! The dump uses the same format the backend accepts as its import file, so
//! a dataset prepared through the API can be exported and reloaded later.

use crate::db::memory::MemoryDb;
use crate::rest::{EmptyBody, RestError};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

/// API handler.
pub(crate) async fn handler(
    State(db): State<Arc<MemoryDb>>,
    _: EmptyBody,
) -> Result<impl IntoResponse, RestError> {
    Ok(Json(db.export().await))
}
