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

//! Boilerplate REST API service over pluggable storage backends.
//!
//! This crate is a starting template for new services, not a complete product.
//! It is structured as the following layers, from the bottom up:
//!
//! 1.  `model`: High-level data types that represent concepts in the domain of
//!     the application.  There is no logic in here other than validation.
//!
//! 1.  `db`: The persistence layer.  The `Db` trait declares the operations
//!     every storage backend must support, and each backend lives in its own
//!     submodule.  Exactly one backend is instantiated at startup based on the
//!     service configuration.
//!
//! 1.  `authn`: The authentication layer.  The `AuthnService` trait declares
//!     the single token introspection capability, with a fake implementation
//!     for development and an HTTP client for production.
//!
//! 1.  `driver`: The business logic layer.  The `Driver` type coordinates
//!     access to the database and holds no other mutable state.
//!
//! 1.  `rest`: The HTTP layer, offering the REST APIs plus the cross-cutting
//!     middleware (authentication gate, request metrics, CORS and panic
//!     recovery).
//!
//! 1.  `main`: The app launcher.  Its sole purpose is to gather configuration
//!     data from environment variables and call `serve` to start the service.
//!
//! There are result and error types in every layer, such as `DbResult` and
//! `DbError`.  Errors float to the top of the app using the `?` operator and
//! are translated to HTTP status codes once returned from the REST layer.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use crate::clocks::SystemClock;
use crate::driver::Driver;
use crate::rest::AppInfo;
use metrics_exporter_prometheus::PrometheusHandle;
use std::error::Error;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::net::TcpListener;

mod authn;
mod clocks;
pub mod config;
mod db;
mod driver;
mod env;
mod model;
mod rest;

pub use config::Config;

/// Instantiates all resources and serves the application until it is stopped.
///
/// Two listeners are set up: the API router on the configured API port and the
/// monitoring router (health, info, OpenAPI schema, Prometheus metrics and the
/// in-memory data export) on the monitoring port.
///
/// While it'd be nice to push this responsibility to `main`, doing so would
/// force us to expose many crate-internal types to the public, which in turn
/// would make dead code detection harder.
pub async fn serve(config: Config, metrics: PrometheusHandle) -> Result<(), Box<dyn Error>> {
    let conn = db::connect(&config.db).await?;
    let authn = authn::connect(&config.authn)?;

    let driver = Driver::new(conn.db.clone(), Arc::new(SystemClock::default()));
    let app = rest::app(driver, authn);
    let monitoring = rest::monitoring_app(AppInfo::default(), metrics, conn.memory.clone());

    let monitoring_listener =
        TcpListener::bind((Ipv4Addr::UNSPECIFIED, config.monitoring_port)).await?;
    log::info!("Serving monitoring APIs on port {}", config.monitoring_port);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(monitoring_listener, monitoring).await {
            log::error!("Monitoring server failed: {}", e);
        }
    });

    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, config.port)).await?;
    log::info!("Serving API on port {}", config.port);
    axum::serve(listener, app).await?;
    Ok(())
}
