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

//! Authentication service backed by a remote HTTP introspection endpoint.

use crate::authn::{extract_credential, AuthnError, AuthnResult, AuthnService, Introspection};
use async_trait::async_trait;
use http::HeaderMap;
use reqwest::StatusCode;
use std::time::Duration;

/// How long to wait for the introspection endpoint before giving up.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// An authentication service that introspects credentials by posting them to
/// a remote endpoint.
pub(crate) struct HttpAuthnService {
    /// Client shared across introspection requests.
    client: reqwest::Client,

    /// Base URI of the introspection service, without a trailing slash.
    base_uri: String,
}

impl HttpAuthnService {
    /// Creates a service that talks to the introspection endpoint under
    /// `base_uri`.
    pub(crate) fn new(base_uri: &str) -> Result<HttpAuthnService, String> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| format!("Cannot create the introspection HTTP client: {}", e))?;
        Ok(HttpAuthnService { client, base_uri: base_uri.trim_end_matches('/').to_owned() })
    }
}

#[async_trait]
impl AuthnService for HttpAuthnService {
    async fn introspect(&self, headers: &HeaderMap) -> AuthnResult<Introspection> {
        let credential = extract_credential(headers, &["Bearer", "JWT"])?;

        let response = self
            .client
            .post(format!("{}/api/auth/introspect?domainroles=true", self.base_uri))
            .form(&[("token", credential.as_str())])
            .send()
            .await
            .map_err(|e| AuthnError::BackendError(format!("Introspection failed: {}", e)))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthnError::BackendError(format!(
                "Introspection service answered with status {} and body '{}'",
                status, body
            )));
        }

        response.json::<Introspection>().await.map_err(|e| {
            AuthnError::BackendError(format!("Cannot parse the introspection response: {}", e))
        })
    }
}
