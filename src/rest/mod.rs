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

//! REST layer of the service.
//!
//! Every API is put in its own `.rs` file, using a name like
//! `<entity>_<method>.rs`, with its integration tests next to it.  The
//! `tests` module within an API defines a `route` method that returns the
//! HTTP method and path under test so that every test in the module
//! exercises the same API.
//!
//! Two routers exist: `app` serves the resource APIs on the public port and
//! `monitoring_app` serves the operational endpoints on a separate port that
//! is not meant to be exposed.

use crate::authn::AuthnService;
use crate::db::memory::MemoryDb;
use crate::driver::{Driver, DriverError};
use crate::model::Template;
use async_trait::async_trait;
use axum::extract::{FromRequest, Request};
use axum::http::header::AsHeaderName;
use axum::http::{self, header, HeaderMap, HeaderValue};
use axum::response::IntoResponse;
use axum::{middleware, Json, Router};
use log::error;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use validator::Validate;

mod auth;
mod export_get;
mod health_get;
mod info_get;
mod metrics;
mod openapi_get;
mod prometheus_get;
mod template_delete;
mod template_get;
mod template_put;
mod templates_get;
mod templates_post;
#[cfg(test)]
pub(crate) mod testutils;

/// Authentication realm reported in `WWW-Authenticate` headers.
const REALM: &str = "api";

/// Frontend errors.  These are the errors that are visible to the user on failed requests.
#[derive(Debug, PartialEq, thiserror::Error)]
pub(crate) enum RestError {
    /// Indicates that the request collides with existing state.
    #[error("{0}")]
    Conflict(String),

    /// Catch-all error type for all unexpected errors.
    #[error("{0}")]
    InternalError(String),

    /// Indicates an error in the contents of the request.
    #[error("{0}")]
    InvalidRequest(String),

    /// Indicates that a requested entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Indicates that a request that should have empty content did not.
    #[error("Content should be empty")]
    PayloadNotEmpty,

    /// Indicates that a conditional request named a stale entity version.
    #[error("{0}")]
    PreconditionFailed(String),

    /// Indicates an authentication problem.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Expected authorization scheme.
        scheme: &'static str,

        /// Expected authorization realm.
        realm: &'static str,

        /// Descriptive message explaining the nature of the problem.
        message: String,
    },

    /// Indicates that the request payload failed validation, with the
    /// failure messages grouped by field name.
    #[error("Data validation failed")]
    ValidationFailed(BTreeMap<String, Vec<String>>),
}

impl From<DriverError> for RestError {
    fn from(e: DriverError) -> Self {
        match e {
            DriverError::AlreadyExists => RestError::Conflict(e.to_string()),
            DriverError::BackendError(_) => RestError::InternalError(e.to_string()),
            DriverError::ForeignKeyViolation(_) => RestError::Conflict(e.to_string()),
            DriverError::NotFound => RestError::NotFound(e.to_string()),
            DriverError::VersionMismatch => RestError::PreconditionFailed(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for RestError {
    fn from(e: serde_json::Error) -> Self {
        RestError::InvalidRequest(e.to_string())
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> axum::response::Response {
        let status;
        let mut headers = HeaderMap::new();
        let mut details = None;
        match &self {
            RestError::Conflict(_) => {
                status = http::StatusCode::CONFLICT;
            }
            RestError::InternalError(message) => {
                error!("Request failed with an internal error: {}", message);
                status = http::StatusCode::INTERNAL_SERVER_ERROR;
            }
            RestError::InvalidRequest(_) => {
                status = http::StatusCode::BAD_REQUEST;
            }
            RestError::NotFound(_) => {
                status = http::StatusCode::NOT_FOUND;
            }
            RestError::PayloadNotEmpty => {
                status = http::StatusCode::PAYLOAD_TOO_LARGE;
            }
            RestError::PreconditionFailed(_) => {
                status = http::StatusCode::PRECONDITION_FAILED;
            }
            RestError::Unauthorized { scheme, realm, message: _ } => {
                status = http::StatusCode::UNAUTHORIZED;
                if let Ok(value) = format!("{} realm=\"{}\"", scheme, realm).parse() {
                    headers.insert(header::WWW_AUTHENTICATE, value);
                }
            }
            RestError::ValidationFailed(failures) => {
                status = http::StatusCode::BAD_REQUEST;
                details = Some(failures.clone());
            }
        };

        let response = ErrorResponse { message: self.to_string(), details };

        (status, headers, Json(response)).into_response()
    }
}

/// Result type for this module.
pub(crate) type RestResult<T> = Result<T, RestError>;

/// Representation of the details of an error response.
#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct ErrorResponse {
    /// Textual representation of the error message.
    pub(crate) message: String,

    /// Per-field failure messages, present for validation errors only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) details: Option<BTreeMap<String, Vec<String>>>,
}

/// A request body extractor that forbids any content.
///
/// Any API that doesn't expect a body should use this to ensure we don't get garbage data that we
/// don't care about.  This future-proofs the service.
pub(crate) struct EmptyBody {}

#[async_trait]
impl<S> FromRequest<S> for EmptyBody
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        match axum::body::to_bytes(req.into_body(), 0).await {
            Ok(_) => Ok(EmptyBody {}),
            Err(_) => Err(RestError::PayloadNotEmpty),
        }
    }
}

/// Extracts the header `name` from `headers` and ensures it has at most one value.
pub(crate) fn get_unique_header<K: AsHeaderName + Copy>(
    headers: &HeaderMap,
    name: K,
) -> RestResult<Option<&HeaderValue>> {
    let mut iter = headers.get_all(name).iter();
    let value = iter.next();
    if iter.next().is_some() {
        return Err(RestError::InvalidRequest(format!(
            "Header {} cannot have more than one value",
            name.as_str()
        )));
    }
    Ok(value)
}

/// Returns the entity version named by the `If-Match` header in `headers`,
/// with any surrounding quotes removed.  A missing header yields the empty
/// string, which never matches a real version.
fn get_if_match(headers: &HeaderMap) -> RestResult<String> {
    match get_unique_header(headers, &header::IF_MATCH)? {
        Some(value) => {
            let value = value.to_str().map_err(|e| {
                RestError::InvalidRequest(format!("Invalid If-Match header: {}", e))
            })?;
            Ok(value.trim().trim_matches('"').to_owned())
        }
        None => Ok(String::new()),
    }
}

/// Formats the version of `template` for the `ETag` response header.
fn etag(template: &Template) -> String {
    format!("\"{}\"", template.version_token())
}

/// Checks `data` against its declared validation rules, failing with the
/// messages grouped by field.
fn validate<T: Validate>(data: &T) -> RestResult<()> {
    data.validate().map_err(|e| {
        let mut failures = BTreeMap::new();
        for (field, errors) in e.field_errors() {
            let messages = errors
                .iter()
                .map(|error| match &error.message {
                    Some(message) => message.to_string(),
                    None => error.code.to_string(),
                })
                .collect();
            failures.insert(field.to_string(), messages);
        }
        RestError::ValidationFailed(failures)
    })
}

/// Identity of the running application, served by the monitoring router.
#[derive(Clone, Serialize)]
pub(crate) struct AppInfo {
    /// Name of the application.
    name: &'static str,

    /// Version of the application.
    version: &'static str,
}

impl Default for AppInfo {
    fn default() -> Self {
        Self { name: env!("CARGO_PKG_NAME"), version: env!("CARGO_PKG_VERSION") }
    }
}

/// Creates the router for the resource APIs.
///
/// When `authn` is present, every route is gated by the authentication
/// middleware; otherwise all requests are served anonymously.
pub(crate) fn app(
    driver: Driver,
    authn: Option<Arc<dyn AuthnService + Send + Sync>>,
) -> Router {
    use axum::routing::get;
    let mut router = Router::new()
        .route("/templates", get(templates_get::handler).post(templates_post::handler))
        .route(
            "/templates/:id",
            get(template_get::handler)
                .put(template_put::handler)
                .delete(template_delete::handler),
        )
        .with_state(driver);

    if let Some(authn) = authn {
        router = router.route_layer(middleware::from_fn_with_state(authn, auth::handle));
    }

    router
        .layer(middleware::from_fn(metrics::handle))
        .layer(CatchPanicLayer::new())
        .layer(CorsLayer::permissive())
}

/// Creates the router for the operational endpoints.
///
/// The bulk export endpoint is only routed when the in-memory backend is
/// active, which is the only case where `memory` is present.
pub(crate) fn monitoring_app(
    info: AppInfo,
    metrics: PrometheusHandle,
    memory: Option<Arc<MemoryDb>>,
) -> Router {
    use axum::routing::get;
    let mut router = Router::new()
        .route("/_health", get(health_get::handler))
        .merge(Router::new().route("/info", get(info_get::handler)).with_state(info))
        .merge(Router::new().route("/openapi", get(openapi_get::handler)))
        .merge(
            Router::new()
                .route("/prometheus", get(prometheus_get::handler))
                .with_state(metrics),
        );
    if let Some(memory) = memory {
        router = router
            .merge(Router::new().route("/export", get(export_get::handler)).with_state(memory));
    }
    router
}
