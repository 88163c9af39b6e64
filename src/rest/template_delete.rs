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

//! API to delete a template.

use crate::authn::Introspection;
use crate::driver::Driver;
use crate::model::TemplateId;
use crate::rest::{EmptyBody, RestError};
use axum::extract::{Path, State};
use axum::http;
use axum::response::IntoResponse;
use axum::Extension;
use log::info;

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(id): Path<TemplateId>,
    introspection: Option<Extension<Introspection>>,
    _: EmptyBody,
) -> Result<impl IntoResponse, RestError> {
    driver.delete_template(&id).await?;
    if let Some(Extension(introspection)) = introspection {
        info!("Subject {} deleted template {}", introspection.subject(), id);
    }

    Ok(http::StatusCode::NO_CONTENT)
}
