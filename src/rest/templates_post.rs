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

//! API to create a new template.

use crate::authn::Introspection;
use crate::driver::Driver;
use crate::model::TemplateEditable;
use crate::rest::{etag, validate, RestError};
use axum::extract::State;
use axum::http::{self, header};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use log::info;

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    introspection: Option<Extension<Introspection>>,
    Json(editable): Json<TemplateEditable>,
) -> Result<(http::StatusCode, impl IntoResponse), RestError> {
    validate(&editable)?;

    let template = driver.create_template(editable).await?;
    if let Some(Extension(introspection)) = introspection {
        info!("Subject {} created template {}", introspection.subject(), template.id());
    }

    let headers = [
        (header::LOCATION, format!("/templates/{}", template.id())),
        (header::ETAG, etag(&template)),
    ];
    Ok((http::StatusCode::CREATED, (headers, Json(template))))
}

#[cfg(test)]
mod tests {
    use crate::model::Template;
    use crate::rest::testutils::*;
    use axum::http::{self, header};
    use serde_json::json;

    fn route() -> (http::Method, String) {
        (http::Method::POST, "/templates".to_owned())
    }

    #[tokio::test]
    async fn test_create() {
        let context = TestContext::setup();

        let response = OneShotBuilder::new(context.app(), route())
            .send_json(json!({"name": "welcome"}))
            .await
            .expect_status(http::StatusCode::CREATED);
        let response = response.expect_header_matches(header::LOCATION, "^/templates/.+$");
        let template = response.expect_json::<Template>().await;

        assert_eq!("welcome", template.name());
        assert!(template.updated_at().is_none());
        assert!(context.has_template(template.id()).await);
    }

    #[tokio::test]
    async fn test_create_returns_etag() {
        let context = TestContext::setup();

        let response = OneShotBuilder::new(context.app(), route())
            .send_json(json!({"name": "welcome"}))
            .await
            .expect_status(http::StatusCode::CREATED)
            .expect_header_matches(header::ETAG, "^\"[0-9a-f]+\"$");
        let _template = response.expect_json::<Template>().await;
    }

    #[tokio::test]
    async fn test_empty_name_fails_validation() {
        let context = TestContext::setup();

        OneShotBuilder::new(context.app(), route())
            .send_json(json!({"name": ""}))
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("Data validation failed")
            .await;
    }

    #[tokio::test]
    async fn test_malformed_payload() {
        let context = TestContext::setup();

        OneShotBuilder::new(context.app(), route())
            .send_text("this is not json")
            .await
            .expect_status(http::StatusCode::UNSUPPORTED_MEDIA_TYPE)
            .take_response();
    }

    #[tokio::test]
    async fn test_duplicate_name() {
        let context = TestContext::setup();

        context.insert_template("the-id", "welcome").await;

        OneShotBuilder::new(context.app(), route())
            .send_json(json!({"name": "welcome"}))
            .await
            .expect_status(http::StatusCode::CONFLICT)
            .expect_error("Already exists")
            .await;
    }
}
