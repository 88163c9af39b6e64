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

//! Bearer token authentication against an introspection service.
//!
//! Incoming requests carry an opaque credential in the `Authorization`
//! header.  An `AuthnService` resolves that credential into an
//! `Introspection` describing the subject behind it.  Two implementations
//! exist: a fake one that accepts everything (for local development) and one
//! that queries a real introspection endpoint over HTTP.

use crate::config::AuthnOptions;
use async_trait::async_trait;
use derive_getters::Getters;
use http::header::AUTHORIZATION;
use http::HeaderMap;
use log::{info, warn};
use serde::Deserialize;
use std::sync::Arc;

pub(crate) mod fake;
pub(crate) mod http_service;

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub(crate) enum AuthnError {
    /// The introspection service could not be reached or misbehaved.
    #[error("Authentication service error: {0}")]
    BackendError(String),

    /// The request did not carry a credential we can understand.
    #[error("Invalid authorization header: {0}")]
    MalformedHeader(String),
}

/// Result type for this module.
pub(crate) type AuthnResult<T> = Result<T, AuthnError>;

/// The roles a subject holds within one domain.
#[derive(Clone, Debug, Default, Deserialize, Getters)]
pub(crate) struct DomainRoles {
    /// Name of the domain.
    #[serde(default)]
    domain: String,

    /// Role names granted within the domain.
    #[serde(default)]
    roles: Vec<String>,
}

/// Outcome of introspecting a credential.
///
/// An inactive introspection means the credential was recognized but is no
/// longer valid, e.g. because the token expired.
#[derive(Clone, Debug, Default, Deserialize, Getters)]
pub(crate) struct Introspection {
    /// Whether the credential is currently valid.
    active: bool,

    /// Identifier of the subject behind the credential.
    #[serde(default, rename = "sub")]
    subject: String,

    /// Unix timestamp at which the credential was issued.
    #[serde(default, rename = "iat")]
    issued_at: Option<i64>,

    /// Unix timestamp at which the credential expires.
    #[serde(default, rename = "exp")]
    expires_at: Option<i64>,

    /// Roles directly bound to the subject, grouped by domain.
    #[serde(default)]
    domain_roles_binding: Vec<DomainRoles>,
}

/// Abstraction over the credential introspection service.
#[async_trait]
pub(crate) trait AuthnService {
    /// Resolves the credential in `headers` into the subject it represents.
    async fn introspect(&self, headers: &HeaderMap) -> AuthnResult<Introspection>;
}

/// Extracts the credential from the `Authorization` header in `headers`,
/// requiring its scheme to be one of `schemes` (compared case-insensitively).
fn extract_credential(headers: &HeaderMap, schemes: &[&str]) -> AuthnResult<String> {
    let mut values = headers.get_all(AUTHORIZATION).iter();
    let value = match (values.next(), values.next()) {
        (Some(value), None) => value,
        (None, _) => {
            return Err(AuthnError::MalformedHeader("Missing authorization header".to_owned()));
        }
        (Some(_), Some(_)) => {
            return Err(AuthnError::MalformedHeader(
                "Multiple authorization headers".to_owned(),
            ));
        }
    };
    let value = value
        .to_str()
        .map_err(|e| AuthnError::MalformedHeader(format!("Invalid header encoding: {}", e)))?;

    match value.split_once(' ') {
        Some((scheme, credential)) if !scheme.is_empty() && !credential.is_empty() => {
            if !schemes.iter().any(|s| s.eq_ignore_ascii_case(scheme)) {
                return Err(AuthnError::MalformedHeader(format!(
                    "Unsupported authentication scheme '{}'",
                    scheme
                )));
            }
            Ok(credential.to_owned())
        }
        _ => Err(AuthnError::MalformedHeader(
            "Authorization header is not of the form 'scheme credential'".to_owned(),
        )),
    }
}

/// Instantiates the authentication service described by `opts`, or none at
/// all when authentication is disabled.
pub(crate) fn connect(
    opts: &AuthnOptions,
) -> Result<Option<Arc<dyn AuthnService + Send + Sync>>, String> {
    match opts {
        AuthnOptions::Disabled => {
            warn!("Authentication is disabled; all requests are anonymous");
            Ok(None)
        }
        AuthnOptions::Fake => {
            warn!("Using the fake authentication service; tokens are not verified");
            Ok(Some(Arc::new(fake::FakeAuthnService::default())))
        }
        AuthnOptions::Http { base_uri } => {
            info!("Using the HTTP authentication service at {}", base_uri);
            Ok(Some(Arc::new(http_service::HttpAuthnService::new(base_uri)?)))
        }
    }
}
