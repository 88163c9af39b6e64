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

//! Endpoint that serves the API description.

use axum::http::header;
use axum::response::IntoResponse;

/// The maintained OpenAPI document for the resource APIs.
const OPENAPI_YAML: &str = include_str!("openapi.yaml");

/// API handler.
pub(crate) async fn handler() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/yaml")], OPENAPI_YAML)
}

#[cfg(test)]
mod tests {
    use crate::rest::testutils::*;
    use axum::http::{self, header};

    fn route() -> (http::Method, String) {
        (http::Method::GET, "/openapi".to_owned())
    }

    #[tokio::test]
    async fn test_serves_the_document() {
        let context = TestContext::setup();

        OneShotBuilder::new(context.monitoring_app(), route())
            .send_empty()
            .await
            .expect_header_matches(header::CONTENT_TYPE, "^application/yaml$")
            .expect_text("openapi: ")
            .await;
    }
}
