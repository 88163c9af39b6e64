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

//! Implementation of the database abstraction with an in-memory map.
//!
//! This backend holds all data in a process-local map and loses it on
//! shutdown.  It is intended for local development and for tests.  The map is
//! shared by all request-handling tasks, so every operation, reads included,
//! serializes behind a single lock.

use crate::db::{Db, DbError, DbResult};
use crate::model::{Template, TemplateId};
use async_trait::async_trait;
use futures::lock::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;

/// The whole dataset held by a `MemoryDb`, as exposed by the bulk export
/// operation and as expected in import files.
#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct Dataset {
    /// All templates, ordered by name.
    templates: Vec<Template>,
}

impl Dataset {
    /// The templates in the dataset.
    #[cfg(test)]
    pub(crate) fn templates(&self) -> &[Template] {
        &self.templates
    }
}

/// A database backed by a process-local map.
#[derive(Default)]
#[cfg_attr(test, derive(Debug))]
pub(crate) struct MemoryDb {
    /// All stored templates, keyed by id.
    templates: Mutex<HashMap<TemplateId, Template>>,
}

impl MemoryDb {
    /// Creates a backend pre-loaded with the JSON dataset stored at `path`.
    pub(crate) fn load(path: &str) -> Result<MemoryDb, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Cannot read import file {}: {}", path, e))?;
        let dataset: Dataset = serde_json::from_str(&content)
            .map_err(|e| format!("Invalid dataset in import file {}: {}", path, e))?;

        let mut templates = HashMap::with_capacity(dataset.templates.len());
        for template in dataset.templates {
            if templates.insert(template.id().clone(), template).is_some() {
                return Err(format!("Duplicate template id in import file {}", path));
            }
        }
        Ok(MemoryDb { templates: Mutex::new(templates) })
    }

    /// Returns a copy of the whole dataset.
    ///
    /// This is only used by the operational export endpoint and is not part
    /// of the `Db` contract.
    pub(crate) async fn export(&self) -> Dataset {
        let templates = self.templates.lock().await;
        let mut templates: Vec<Template> = templates.values().cloned().collect();
        templates.sort_by(|a, b| a.name().cmp(b.name()));
        Dataset { templates }
    }
}

#[async_trait]
impl Db for MemoryDb {
    async fn get_all_templates(&self) -> DbResult<Vec<Template>> {
        let templates = self.templates.lock().await;
        let mut all: Vec<Template> = templates.values().cloned().collect();
        all.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(all)
    }

    async fn get_template_by_id(&self, id: &TemplateId) -> DbResult<Template> {
        let templates = self.templates.lock().await;
        templates.get(id).cloned().ok_or(DbError::NotFound)
    }

    async fn create_template(&self, template: &Template) -> DbResult<()> {
        let mut templates = self.templates.lock().await;
        if templates.contains_key(template.id())
            || templates.values().any(|t| t.name() == template.name())
        {
            return Err(DbError::AlreadyExists);
        }
        templates.insert(template.id().clone(), template.clone());
        Ok(())
    }

    async fn update_template(&self, template: &Template) -> DbResult<()> {
        let mut templates = self.templates.lock().await;
        if !templates.contains_key(template.id()) {
            return Err(DbError::NotFound);
        }
        if templates.values().any(|t| t.id() != template.id() && t.name() == template.name()) {
            return Err(DbError::AlreadyExists);
        }
        templates.insert(template.id().clone(), template.clone());
        Ok(())
    }

    async fn delete_template(&self, id: &TemplateId) -> DbResult<()> {
        let mut templates = self.templates.lock().await;
        match templates.remove(id) {
            Some(_) => Ok(()),
            None => Err(DbError::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::generate_db_tests;
    use crate::model::TemplateEditable;
    use std::sync::Arc;
    use time::macros::datetime;

    generate_db_tests!(Arc::new(MemoryDb::default()));

    /// Creates a template with hardcoded timestamps for export tests.
    fn template(id: &'static str, name: &str) -> Template {
        Template::new(
            TemplateId::from(id),
            TemplateEditable::new(name.to_owned()),
            datetime!(2024-05-01 10:20:30 UTC),
            None,
        )
    }

    #[tokio::test]
    async fn test_export_returns_everything_sorted_by_name() {
        let db = MemoryDb::default();
        db.create_template(&template("id2", "second")).await.unwrap();
        db.create_template(&template("id1", "first")).await.unwrap();

        let dataset = db.export().await;
        assert_eq!(
            vec!["first".to_owned(), "second".to_owned()],
            dataset.templates.iter().map(|t| t.name().to_owned()).collect::<Vec<String>>()
        );
    }

    #[test]
    fn test_load_rejects_duplicate_ids() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"templates": [
                {{"id": "abc", "name": "one", "created_at": "2024-05-01T10:20:30Z",
                  "updated_at": null}},
                {{"id": "abc", "name": "two", "created_at": "2024-05-01T10:20:30Z",
                  "updated_at": null}}
            ]}}"#
        )
        .unwrap();

        let err = MemoryDb::load(&file.path().to_string_lossy()).unwrap_err();
        assert!(err.contains("Duplicate template id"), "{}", err);
    }

    #[test]
    fn test_load_missing_file() {
        let err = MemoryDb::load("/this/does/not/exist.json").unwrap_err();
        assert!(err.contains("Cannot read import file"), "{}", err);
    }
}
