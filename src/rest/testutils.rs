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

//! Common test code for the REST server.

use crate::authn::fake::FakeAuthnService;
use crate::authn::AuthnService;
use crate::clocks::testutils::MonotonicClock;
use crate::db::memory::MemoryDb;
use crate::db::Db;
use crate::driver::Driver;
use crate::model::{Template, TemplateEditable, TemplateId};
use crate::rest::{AppInfo, ErrorResponse};
use axum::extract::Request;
use axum::http::{self, HeaderName, HeaderValue};
use axum::Router;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, OnceLock};
use time::macros::datetime;
use tower::util::ServiceExt;

/// Maximum body size for testing purposes.
const MAX_BODY_SIZE: usize = 64 * 1024;

/// Handle to the process-wide metrics recorder used by tests.
///
/// The `metrics` macros write to a process-global recorder, so tests share
/// one installed once instead of each installing their own.
fn metrics_handle() -> PrometheusHandle {
    static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
    HANDLE
        .get_or_init(|| {
            PrometheusBuilder::new()
                .install_recorder()
                .expect("Failed to install the test metrics recorder")
        })
        .clone()
}

/// State for an instance of the service under test, backed by the in-memory
/// database so tests can inspect the stored data directly.
pub(crate) struct TestContext {
    /// The store backing the app.
    db: Arc<MemoryDb>,

    /// The resource API router under test.
    app: Router,

    /// The monitoring router under test.
    monitoring: Router,
}

impl TestContext {
    /// Creates a context with authentication disabled.
    pub(crate) fn setup() -> Self {
        Self::with_authn(None)
    }

    /// Creates a context gated by the fake authentication service.
    pub(crate) fn setup_with_fake_authn() -> Self {
        Self::with_authn(Some(Arc::new(FakeAuthnService::default())))
    }

    /// Creates a context gated by the given authentication service.
    pub(crate) fn setup_with_authn(authn: Arc<dyn AuthnService + Send + Sync>) -> Self {
        Self::with_authn(Some(authn))
    }

    fn with_authn(authn: Option<Arc<dyn AuthnService + Send + Sync>>) -> Self {
        let db = Arc::new(MemoryDb::default());
        let driver = Driver::new(db.clone(), Arc::new(MonotonicClock::new(100_000)));
        let app = super::app(driver, authn);
        let monitoring =
            super::monitoring_app(AppInfo::default(), metrics_handle(), Some(db.clone()));
        Self { db, app, monitoring }
    }

    /// Returns a clone of the resource API router in the context.
    pub(crate) fn app(&self) -> Router {
        self.app.clone()
    }

    /// Consumes the context and returns the resource API router in it.
    pub(crate) fn into_app(self) -> Router {
        self.app
    }

    /// Returns a clone of the monitoring router in the context.
    pub(crate) fn monitoring_app(&self) -> Router {
        self.monitoring.clone()
    }

    /// Consumes the context and returns the monitoring router in it.
    pub(crate) fn into_monitoring_app(self) -> Router {
        self.monitoring
    }

    /// Renders the currently collected metrics.
    pub(crate) fn render_metrics(&self) -> String {
        metrics_handle().render()
    }

    /// Inserts a template with hardcoded timestamps directly into the store.
    pub(crate) async fn insert_template(&self, id: &'static str, name: &str) -> Template {
        let template = Template::new(
            TemplateId::from(id),
            TemplateEditable::new(name.to_owned()),
            datetime!(2024-05-01 10:20:30 UTC),
            None,
        );
        self.db.create_template(&template).await.unwrap();
        template
    }

    /// Fetches the template with `id` directly from the store.
    pub(crate) async fn get_template(&self, id: &'static str) -> Template {
        self.db.get_template_by_id(&TemplateId::from(id)).await.unwrap()
    }

    /// Checks whether the template with `id` exists in the store.
    pub(crate) async fn has_template(&self, id: &TemplateId) -> bool {
        self.db.get_template_by_id(id).await.is_ok()
    }
}

/// Builder for a single request to the API server.
#[must_use]
pub(crate) struct OneShotBuilder {
    /// The router for the app being tested.
    app: Router,

    /// Builder for the request that will be sent to the app.
    builder: axum::http::request::Builder,
}

impl OneShotBuilder {
    /// Creates a new request against a given `method`/`uri` pair served by an `app` router.
    pub(crate) fn new<U: AsRef<str>>(app: Router, (method, uri): (http::Method, U)) -> Self {
        let builder = Request::builder().method(method).uri(uri.as_ref());
        Self { app, builder }
    }

    /// Adds bearer authentication to the request.
    pub(crate) fn with_bearer_auth<T>(mut self, token: T) -> Self
    where
        T: fmt::Display,
    {
        let value = format!("Bearer {}", token);
        self.builder = self.builder.header(http::header::AUTHORIZATION, value);
        self
    }

    /// Sets the header `name` to `value` in the outgoing request.
    pub(crate) fn with_header<K, V>(mut self, name: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Finishes building the request and sends it with an empty payload.
    pub(crate) async fn send_empty(self) -> ResponseChecker {
        let request = self.builder.body(axum::body::Body::empty()).unwrap();
        ResponseChecker::from(self.app.oneshot(request).await.unwrap())
    }

    /// Finishes building the request and sends it with a text payload.
    pub(crate) async fn send_text<T: Into<String>>(self, text: T) -> ResponseChecker {
        let request = self
            .builder
            .header(http::header::CONTENT_TYPE, mime::TEXT_PLAIN.as_ref())
            .body(axum::body::Body::from(text.into()))
            .unwrap();
        ResponseChecker::from(self.app.oneshot(request).await.unwrap())
    }

    /// Finishes building the request and sends it with a JSON payload.
    pub(crate) async fn send_json<T: Serialize>(self, request: T) -> ResponseChecker {
        let request = self
            .builder
            .header(http::header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
            .body(axum::body::Body::from(serde_json::to_vec(&request).unwrap()))
            .unwrap();
        ResponseChecker::from(self.app.oneshot(request).await.unwrap())
    }
}

/// Type alias for the complex type returned by the `oneshot` function.
type HttpResponse = axum::response::Response;

/// Validator for the outcome of a request sent by a `OneShotBuilder`.
#[must_use]
pub(crate) struct ResponseChecker {
    /// Actual response that we received from the app.
    response: HttpResponse,

    /// Expected HTTP status code in the response above.
    exp_status: http::StatusCode,
}

impl From<HttpResponse> for ResponseChecker {
    fn from(response: HttpResponse) -> Self {
        Self { response, exp_status: http::StatusCode::OK }
    }
}

impl ResponseChecker {
    /// Sets the expected exit HTTP status to `status`.
    pub(crate) fn expect_status(mut self, status: http::StatusCode) -> Self {
        self.exp_status = status;
        self
    }

    /// Expects the header `name` to be present with a value matching `exp_re`.
    pub(crate) fn expect_header_matches(self, name: HeaderName, exp_re: &str) -> Self {
        let value = match self.response.headers().get(&name) {
            Some(value) => value.to_str().unwrap(),
            None => panic!("Header {} not present in response", name),
        };
        let re = regex::Regex::new(exp_re).unwrap();
        assert!(re.is_match(value), "Header {} value '{}' does not match re '{}'", name, value, exp_re);
        self
    }

    /// Performs common validation operations on the response.
    pub(crate) fn verify(&self) {
        assert_eq!(self.exp_status, self.response.status());
    }

    /// Finishes checking the response and returns it for manual inspection.
    pub(crate) fn take_response(self) -> HttpResponse {
        self.verify();
        self.response
    }

    /// Finishes checking the response and expects it to contain an empty body.
    pub(crate) async fn expect_empty(self) {
        self.verify();

        let body = axum::body::to_bytes(self.response.into_body(), MAX_BODY_SIZE).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.is_empty(), "Body not empty; got {}", body);
    }

    /// Finishes checking the response and expects its body to be an `ErrorResponse` that
    /// matches `exp_re`.
    pub(crate) async fn expect_error(self, exp_re: &str) {
        self.verify();

        let body = axum::body::to_bytes(self.response.into_body(), MAX_BODY_SIZE).await.unwrap();
        let response: ErrorResponse = match serde_json::from_slice(&body) {
            Ok(response) => response,
            Err(e) => {
                let body = String::from_utf8(body.to_vec()).unwrap();
                panic!("Invalid error response due to {}; content was {}", e, body);
            }
        };
        let re = regex::Regex::new(exp_re).unwrap();
        assert!(
            re.is_match(&response.message),
            "Response content '{:?}' does not match re '{}'",
            response,
            exp_re
        );
    }

    /// Finishes checking the response and expects it to contain a valid JSON object of
    /// type `T`.
    pub(crate) async fn expect_json<T: DeserializeOwned>(self) -> T {
        self.verify();

        let body = axum::body::to_bytes(self.response.into_body(), MAX_BODY_SIZE).await.unwrap();
        serde_json::from_slice::<T>(&body).unwrap()
    }

    /// Finishes checking the response and expects its body to be valid UTF-8 and to match
    /// `exp_re`.
    pub(crate) async fn expect_text(self, exp_re: &str) {
        assert!(!exp_re.is_empty(), "Use expect_empty to validate empty responses");

        self.verify();

        let body = axum::body::to_bytes(self.response.into_body(), MAX_BODY_SIZE).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        let re = regex::Regex::new(exp_re).unwrap();
        assert!(re.is_match(&body), "Response body '{}' does not match re '{}'", body, exp_re);
    }
}

/// Instantiates a test that ensures the API under `route` rejects requests
/// that carry a payload.
macro_rules! test_payload_must_be_empty {
    ( $app:expr, $route:expr ) => {
        #[tokio::test]
        async fn test_payload_must_be_empty() {
            $crate::rest::testutils::OneShotBuilder::new($app, $route)
                .send_text("some payload")
                .await
                .expect_status(axum::http::StatusCode::PAYLOAD_TOO_LARGE)
                .expect_error("Content should be empty")
                .await;
        }
    };
}

pub(crate) use test_payload_must_be_empty;
