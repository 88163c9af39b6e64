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

//! Service configuration.
//!
//! All configuration is sourced from environment variables prefixed with
//! `API_`.  Logging is configured separately through `RUST_LOG` by
//! `env_logger`.

use crate::env::get_optional_var;

/// Default port for the API listener.
const DEFAULT_PORT: u16 = 8080;

/// Default port for the monitoring listener.
const DEFAULT_MONITORING_PORT: u16 = 8081;

/// Options describing which storage backend to instantiate.
///
/// The selection rules in `db::connect` inspect these fields in order: the
/// mock flag, the in-memory flag and finally the connection URI prefix.
#[derive(Clone, Default)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub(crate) struct DbOptions {
    /// Replace the database with a test double that has no behavior.
    pub(crate) mock: bool,

    /// Use the process-local in-memory backend.
    pub(crate) in_memory: bool,

    /// Path to a JSON dataset to pre-load into the in-memory backend.
    pub(crate) in_memory_import_file: Option<String>,

    /// Connection URI for the PostgreSQL or MongoDB backends.
    pub(crate) connection_uri: Option<String>,

    /// Database name, required by the MongoDB backend.
    pub(crate) db_name: Option<String>,
}

/// Options describing which authentication service to instantiate.
#[derive(Clone)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub(crate) enum AuthnOptions {
    /// No authentication service; all routes are public.
    Disabled,

    /// Fake service that accepts any well-formed bearer token.
    Fake,

    /// HTTP client against a remote token introspection service.
    Http {
        /// Base URI of the introspection service.
        base_uri: String,
    },
}

/// Runtime configuration for the service.
#[cfg_attr(test, derive(Debug))]
pub struct Config {
    /// Port the API listener binds to.
    pub(crate) port: u16,

    /// Port the monitoring listener binds to.
    pub(crate) monitoring_port: u16,

    /// Storage backend selection.
    pub(crate) db: DbOptions,

    /// Authentication service selection.
    pub(crate) authn: AuthnOptions,
}

impl Config {
    /// Initializes the configuration from `API_`-prefixed environment
    /// variables.
    pub fn from_env() -> Result<Config, String> {
        let db = DbOptions {
            mock: get_optional_var::<bool>("API", "DB_MOCK")?.unwrap_or(false),
            in_memory: get_optional_var::<bool>("API", "DB_IN_MEMORY")?.unwrap_or(false),
            in_memory_import_file: get_optional_var::<String>("API", "DB_IN_MEMORY_IMPORT_FILE")?,
            connection_uri: get_optional_var::<String>("API", "DB_CONNECTION_URI")?,
            db_name: get_optional_var::<String>("API", "DB_NAME")?,
        };

        let authn = if get_optional_var::<bool>("API", "AUTHN_SERVICE_FAKE")?.unwrap_or(false) {
            AuthnOptions::Fake
        } else if let Some(base_uri) = get_optional_var::<String>("API", "AUTHN_SERVICE_URI")? {
            AuthnOptions::Http { base_uri }
        } else {
            AuthnOptions::Disabled
        };

        Ok(Config {
            port: get_optional_var::<u16>("API", "PORT")?.unwrap_or(DEFAULT_PORT),
            monitoring_port: get_optional_var::<u16>("API", "MONITORING_PORT")?
                .unwrap_or(DEFAULT_MONITORING_PORT),
            db,
            authn,
        })
    }
}
