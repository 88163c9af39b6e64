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

//! Endpoint that reports the identity of the running application.

use crate::rest::AppInfo;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

/// API handler.
pub(crate) async fn handler(State(info): State<AppInfo>) -> impl IntoResponse {
    Json(info)
}

#[cfg(test)]
mod tests {
    use crate::rest::testutils::*;
    use axum::http;
    use serde_json::Value;

    fn route() -> (http::Method, String) {
        (http::Method::GET, "/info".to_owned())
    }

    #[tokio::test]
    async fn test_reports_cargo_metadata() {
        let context = TestContext::setup();

        let info = OneShotBuilder::new(context.monitoring_app(), route())
            .send_empty()
            .await
            .expect_json::<Value>()
            .await;
        assert_eq!(env!("CARGO_PKG_NAME"), info["name"]);
        assert_eq!(env!("CARGO_PKG_VERSION"), info["version"]);
    }
}
