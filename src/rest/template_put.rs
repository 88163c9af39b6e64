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

//! API to update an existing template.
//!
//! Updates are conditional writes: the caller must present the version it
//! got from the `ETag` header of a previous response in `If-Match`, and the
//! update only happens if that version is still current.  The existence and
//! version checks run before the body is even parsed so that a stale caller
//! hears about the conflict first.

use crate::authn::Introspection;
use crate::driver::{Driver, DriverError};
use crate::model::{TemplateEditable, TemplateId};
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use log::info;

use crate::rest::{etag, get_if_match, validate, RestError};

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(id): Path<TemplateId>,
    headers: HeaderMap,
    introspection: Option<Extension<Introspection>>,
    body: String,
) -> Result<impl IntoResponse, RestError> {
    let current = driver.clone().get_template(&id).await?;
    let version = get_if_match(&headers)?;
    if version != current.version_token() {
        return Err(DriverError::VersionMismatch.into());
    }

    let editable: TemplateEditable = serde_json::from_str(&body)?;
    validate(&editable)?;

    let template = driver.update_template(&id, &version, editable).await?;
    if let Some(Extension(introspection)) = introspection {
        info!("Subject {} updated template {}", introspection.subject(), template.id());
    }

    Ok(([(header::ETAG, etag(&template))], Json(template)))
}
