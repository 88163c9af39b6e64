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

//! High-level data types for the service.

use derive_getters::Getters;
use derive_more::{Constructor, Display};
use serde::de::Visitor;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

/// Errors caused by invalid values for domain types.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("{0}")]
pub(crate) struct ModelError(pub(crate) String);

/// Result type for this module.
pub(crate) type ModelResult<T> = Result<T, ModelError>;

/// Unique identifier of a template.
///
/// Identifiers are assigned by the server at creation time and are immutable
/// afterwards.
#[derive(Clone, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub(crate) struct TemplateId(String);

impl TemplateId {
    /// Creates a new identifier from an untrusted string `s`, making sure it is valid.
    pub(crate) fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();
        if s.is_empty() {
            return Err(ModelError("Template id cannot be empty".to_owned()));
        }
        Ok(Self(s))
    }

    /// Generates a fresh random identifier for a new template.
    pub(crate) fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns a string view of the identifier.
    pub(crate) fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

#[cfg(test)]
impl From<&'static str> for TemplateId {
    /// Creates a new identifier from a hardcoded string, which must be valid.
    fn from(s: &'static str) -> Self {
        TemplateId::new(s).expect("Hardcoded ids must be valid")
    }
}

/// A deserialization visitor for a `TemplateId`.
struct TemplateIdVisitor;

impl Visitor<'_> for TemplateIdVisitor {
    type Value = TemplateId;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a non-empty string")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        TemplateId::new(v).map_err(|e| E::custom(e.to_string()))
    }
}

impl<'de> Deserialize<'de> for TemplateId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_str(TemplateIdVisitor)
    }
}

/// The client-editable fields of a template.
///
/// Add new model properties here; don't forget to extend the SQL statements
/// and BSON documents in the corresponding backend modules.
#[derive(Clone, Constructor, Debug, Deserialize, Getters, Serialize, Validate)]
#[cfg_attr(test, derive(PartialEq))]
pub(crate) struct TemplateEditable {
    /// Human-readable name of the template.  Uniqueness is backend-enforced.
    #[validate(length(min = 1, message = "name is required"))]
    name: String,
}

/// A stored template, combining the server-assigned identity and lifecycle
/// timestamps with the editable fields.
#[derive(Clone, Constructor, Debug, Deserialize, Getters, Serialize)]
#[cfg_attr(test, derive(PartialEq))]
pub(crate) struct Template {
    /// Unique, immutable identifier of this template.
    id: TemplateId,

    /// The client-editable fields.
    #[serde(flatten)]
    editable: TemplateEditable,

    /// Time at which the template was created.
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,

    /// Time of the last update, if the template was ever updated.
    #[serde(with = "time::serde::rfc3339::option")]
    updated_at: Option<OffsetDateTime>,
}

impl Template {
    /// Convenience accessor for the name inside the editable fields.
    pub(crate) fn name(&self) -> &str {
        self.editable.name()
    }

    /// Returns the opaque version marker of this template.
    ///
    /// The marker is served as the `ETag` of the entity and compared against
    /// the `If-Match` header on updates to detect concurrent modifications.
    pub(crate) fn version_token(&self) -> String {
        let ts = self.updated_at.unwrap_or(self.created_at);
        format!("{:x}", ts.unix_timestamp_nanos() / 1_000_000)
    }

    /// Returns this template with its editable fields replaced by `editable`
    /// and its update timestamp set to `now`.
    pub(crate) fn with_edits(self, editable: TemplateEditable, now: OffsetDateTime) -> Template {
        Template { editable, updated_at: Some(now), ..self }
    }
}
