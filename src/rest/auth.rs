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

//! Authentication gate for the resource APIs.

use crate::authn::AuthnService;
use crate::rest::{RestError, REALM};
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

/// Introspects the request's credential and either lets the request through
/// with the introspection attached to it, or fails it with a 401.
pub(crate) async fn handle(
    State(authn): State<Arc<dyn AuthnService + Send + Sync>>,
    mut request: Request,
    next: Next,
) -> Response {
    match authn.introspect(request.headers()).await {
        Ok(introspection) if *introspection.active() => {
            request.extensions_mut().insert(introspection);
            next.run(request).await
        }
        Ok(_) => RestError::Unauthorized {
            scheme: "Bearer",
            realm: REALM,
            message: "Credential is expired or inactive".to_owned(),
        }
        .into_response(),
        Err(e) => RestError::Unauthorized {
            scheme: "Bearer",
            realm: REALM,
            message: e.to_string(),
        }
        .into_response(),
    }
}
