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

//! Business logic for template management.

use crate::driver::{Driver, DriverError, DriverResult};
use crate::model::{Template, TemplateEditable, TemplateId};

impl Driver {
    /// Returns all templates, ordered by name.
    pub(crate) async fn get_templates(self) -> DriverResult<Vec<Template>> {
        Ok(self.db.get_all_templates().await?)
    }

    /// Returns the template with `id`.
    pub(crate) async fn get_template(self, id: &TemplateId) -> DriverResult<Template> {
        Ok(self.db.get_template_by_id(id).await?)
    }

    /// Creates a new template out of `editable`, assigning it a fresh
    /// identifier and the current time as its creation time.
    pub(crate) async fn create_template(
        self,
        editable: TemplateEditable,
    ) -> DriverResult<Template> {
        let template =
            Template::new(TemplateId::random(), editable, self.clock.now_utc(), None);
        self.db.create_template(&template).await?;
        Ok(template)
    }

    /// Replaces the editable fields of the template with `id`.
    ///
    /// `version` must name the current version of the stored template or the
    /// operation fails without modifying anything.
    pub(crate) async fn update_template(
        self,
        id: &TemplateId,
        version: &str,
        editable: TemplateEditable,
    ) -> DriverResult<Template> {
        let template = self.db.get_template_by_id(id).await?;
        if template.version_token() != version {
            return Err(DriverError::VersionMismatch);
        }
        let template = template.with_edits(editable, self.clock.now_utc());
        self.db.update_template(&template).await?;
        Ok(template)
    }

    /// Deletes the template with `id`.
    pub(crate) async fn delete_template(self, id: &TemplateId) -> DriverResult<()> {
        let _exists = self.db.get_template_by_id(id).await?;
        Ok(self.db.delete_template(id).await?)
    }
}
