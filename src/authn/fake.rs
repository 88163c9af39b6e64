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

//! Fake authentication service for local development.

use crate::authn::{extract_credential, AuthnResult, AuthnService, Introspection};
use async_trait::async_trait;
use http::HeaderMap;

/// Subject reported for every credential the fake service sees.
const FAKE_SUBJECT: &str = "10000000";

/// An authentication service that accepts any well-formed bearer credential
/// without talking to anything.
#[derive(Default)]
pub(crate) struct FakeAuthnService {}

#[async_trait]
impl AuthnService for FakeAuthnService {
    async fn introspect(&self, headers: &HeaderMap) -> AuthnResult<Introspection> {
        let _credential = extract_credential(headers, &["Bearer"])?;
        Ok(Introspection {
            active: true,
            subject: FAKE_SUBJECT.to_owned(),
            ..Introspection::default()
        })
    }
}
