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

//! Template storage backed by a MongoDB database.

use crate::db::{Db, DbError, DbResult};
use crate::model::{Template, TemplateEditable, TemplateId};
use async_trait::async_trait;
use bson::doc;
use futures::TryStreamExt;
use log::info;
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, IndexModel};
use serde::{Deserialize, Serialize};

/// Name of the collection that holds the templates.
const TEMPLATES_COLLECTION: &str = "templates";

/// Wire representation of a template document.
///
/// BSON datetimes have millisecond resolution, which matches the resolution
/// our clocks provide, so the conversions below are lossless.
#[derive(Deserialize, Serialize)]
struct TemplateDoc {
    /// Identifier of the template, used as the document key.
    #[serde(rename = "_id")]
    id: String,

    /// Name of the template.
    name: String,

    /// Time when the template was created.
    created_at: bson::DateTime,

    /// Time of the last update to the template, if any.
    updated_at: Option<bson::DateTime>,
}

impl TemplateDoc {
    /// Converts a model template into its document form.
    fn from_template(template: &Template) -> TemplateDoc {
        TemplateDoc {
            id: template.id().as_str().to_owned(),
            name: template.name().to_owned(),
            created_at: bson::DateTime::from_time_0_3(*template.created_at()),
            updated_at: template.updated_at().map(bson::DateTime::from_time_0_3),
        }
    }

    /// Converts a document back into a model template.
    fn into_template(self) -> DbResult<Template> {
        Ok(Template::new(
            TemplateId::new(self.id)?,
            TemplateEditable::new(self.name),
            self.created_at.to_time_0_3(),
            self.updated_at.map(bson::DateTime::to_time_0_3),
        ))
    }
}

/// Converts an `e` returned by the MongoDB driver into our generic error
/// types, recognizing key collisions on the unique indexes.
fn map_mongo_error(e: mongodb::error::Error) -> DbError {
    use mongodb::error::{ErrorKind, WriteFailure};
    match e.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(we)) if we.code == 11000 => {
            DbError::AlreadyExists
        }
        ErrorKind::Command(ce) if ce.code == 11000 => DbError::AlreadyExists,
        _ => DbError::BackendError(e.to_string()),
    }
}

/// A database instance backed by a MongoDB database.
pub(crate) struct MongoDb {
    /// Handle to the templates collection.
    templates: Collection<TemplateDoc>,
}

/// Connects to the server identified by `uri`, selects the `name` database,
/// and ensures the unique index on template names exists.
pub(crate) async fn connect(uri: &str, name: &str) -> Result<MongoDb, String> {
    let client = Client::with_uri_str(uri)
        .await
        .map_err(|e| format!("Cannot connect to MongoDB: {}", e))?;
    let templates = client.database(name).collection::<TemplateDoc>(TEMPLATES_COLLECTION);

    let index = IndexModel::builder()
        .keys(doc! { "name": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build();
    templates
        .create_index(index)
        .await
        .map_err(|e| format!("Cannot create MongoDB indexes: {}", e))?;

    info!("Connected to MongoDB backend");
    Ok(MongoDb { templates })
}

#[async_trait]
impl Db for MongoDb {
    async fn get_all_templates(&self) -> DbResult<Vec<Template>> {
        let cursor = self
            .templates
            .find(doc! {})
            .sort(doc! { "name": 1 })
            .await
            .map_err(map_mongo_error)?;
        let docs: Vec<TemplateDoc> = cursor.try_collect().await.map_err(map_mongo_error)?;
        docs.into_iter().map(TemplateDoc::into_template).collect()
    }

    async fn get_template_by_id(&self, id: &TemplateId) -> DbResult<Template> {
        let doc = self
            .templates
            .find_one(doc! { "_id": id.as_str() })
            .await
            .map_err(map_mongo_error)?;
        match doc {
            Some(doc) => doc.into_template(),
            None => Err(DbError::NotFound),
        }
    }

    async fn create_template(&self, template: &Template) -> DbResult<()> {
        self.templates
            .insert_one(TemplateDoc::from_template(template))
            .await
            .map_err(map_mongo_error)?;
        Ok(())
    }

    async fn update_template(&self, template: &Template) -> DbResult<()> {
        let result = self
            .templates
            .replace_one(
                doc! { "_id": template.id().as_str() },
                TemplateDoc::from_template(template),
            )
            .await
            .map_err(map_mongo_error)?;
        if result.matched_count == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    async fn delete_template(&self, id: &TemplateId) -> DbResult<()> {
        let result = self
            .templates
            .delete_one(doc! { "_id": id.as_str() })
            .await
            .map_err(map_mongo_error)?;
        if result.deleted_count == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}
