//! MongoDB binding for the document store adapter.

use async_trait::async_trait;
use mongodb::bson::{Bson, doc, oid::ObjectId};
use mongodb::{Client, Collection};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::identifier::ObjectIdCodec;
use super::store::{DocumentCollection, DocumentStoreRepository};
use crate::errors::BoxError;

/// Stored shape of a text document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextRecord {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub text: String,
}

#[async_trait]
impl DocumentCollection for Collection<TextRecord> {
    type Key = ObjectId;

    async fn insert_text(&self, text: &str) -> Result<ObjectId, BoxError> {
        let record = TextRecord {
            id: None,
            text: text.to_string(),
        };
        let result = self.insert_one(&record).await?;

        match result.inserted_id {
            Bson::ObjectId(oid) => Ok(oid),
            other => Err(format!("store allocated a non-ObjectId key: {other}").into()),
        }
    }

    async fn find_text(&self, key: &ObjectId) -> Result<Option<String>, BoxError> {
        let record = self.find_one(doc! { "_id": *key }).await?;
        Ok(record.map(|r| r.text))
    }

    async fn update_text(&self, key: &ObjectId, text: &str) -> Result<u64, BoxError> {
        let result = self
            .update_one(doc! { "_id": *key }, doc! { "$set": { "text": text } })
            .await?;
        Ok(result.matched_count)
    }

    async fn delete_key(&self, key: &ObjectId) -> Result<u64, BoxError> {
        let result = self.delete_one(doc! { "_id": *key }).await?;
        Ok(result.deleted_count)
    }
}

pub type MongoTextRepository = DocumentStoreRepository<Collection<TextRecord>, ObjectIdCodec>;

impl MongoTextRepository {
    #[must_use]
    pub fn from_client(client: &Client, database: &str, collection: &str) -> Self {
        let collection = client.database(database).collection::<TextRecord>(collection);
        DocumentStoreRepository::new(collection, ObjectIdCodec)
    }
}

/// Connects to MongoDB and verifies the deployment answers a ping.
///
/// # Errors
///
/// Returns an error if the URI is invalid or the server is unreachable.
pub async fn connect(uri: &str) -> Result<Client, mongodb::error::Error> {
    let client = Client::with_uri_str(uri).await?;
    client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await?;
    info!("Connected to MongoDB");
    Ok(client)
}
