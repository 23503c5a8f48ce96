//! The document store adapter.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::TextRepository;
use super::identifier::KeyCodec;
use crate::context::OpContext;
use crate::core::models::TextDocument;
use crate::errors::{BoxError, RepositoryError};

/// Driver-level operations on one keyed collection of text records.
///
/// Counts returned by `update_text` and `delete_key` are what the backend
/// reports as matched/deleted.
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    type Key: Send + Sync;

    /// Creates a record and returns the key the backend allocated for it.
    async fn insert_text(&self, text: &str) -> Result<Self::Key, BoxError>;

    async fn find_text(&self, key: &Self::Key) -> Result<Option<String>, BoxError>;

    async fn update_text(&self, key: &Self::Key, text: &str) -> Result<u64, BoxError>;

    async fn delete_key(&self, key: &Self::Key) -> Result<u64, BoxError>;
}

#[async_trait]
impl<C> DocumentCollection for Arc<C>
where
    C: DocumentCollection + ?Sized,
{
    type Key = C::Key;

    async fn insert_text(&self, text: &str) -> Result<Self::Key, BoxError> {
        (**self).insert_text(text).await
    }

    async fn find_text(&self, key: &Self::Key) -> Result<Option<String>, BoxError> {
        (**self).find_text(key).await
    }

    async fn update_text(&self, key: &Self::Key, text: &str) -> Result<u64, BoxError> {
        (**self).update_text(key, text).await
    }

    async fn delete_key(&self, key: &Self::Key) -> Result<u64, BoxError> {
        (**self).delete_key(key).await
    }
}

/// Realizes [`TextRepository`] over a [`DocumentCollection`].
///
/// Every identifier-taking operation decodes the identifier before touching
/// the collection. Every collection call is raced against the context's
/// cancellation and deadline.
#[derive(Debug, Clone)]
pub struct DocumentStoreRepository<C, K> {
    collection: C,
    codec: K,
}

impl<C, K> DocumentStoreRepository<C, K> {
    pub fn new(collection: C, codec: K) -> Self {
        Self { collection, codec }
    }

    pub fn collection(&self) -> &C {
        &self.collection
    }
}

async fn backend_call<T, F>(
    ctx: &OpContext,
    operation: &'static str,
    call: F,
) -> Result<T, RepositoryError>
where
    F: Future<Output = Result<T, BoxError>>,
{
    match ctx.run(call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => Err(RepositoryError::backend(operation, source)),
        Err(reason) => {
            debug!(operation, ?reason, "Document store call interrupted");
            Err(RepositoryError::interrupted(operation, reason))
        }
    }
}

#[async_trait]
impl<C, K> TextRepository for DocumentStoreRepository<C, K>
where
    C: DocumentCollection,
    K: KeyCodec<Key = C::Key>,
{
    async fn insert(
        &self,
        ctx: &OpContext,
        doc: &TextDocument,
    ) -> Result<TextDocument, RepositoryError> {
        let key = backend_call(ctx, "insert", self.collection.insert_text(&doc.text)).await?;
        let id = self.codec.encode(&key);
        debug!(id = %id, "Inserted text document");

        Ok(TextDocument {
            id: Some(id),
            text: doc.text.clone(),
        })
    }

    async fn find_by_id(
        &self,
        ctx: &OpContext,
        id: &str,
    ) -> Result<Option<TextDocument>, RepositoryError> {
        let key = self.codec.decode(id)?;
        let found = backend_call(ctx, "find", self.collection.find_text(&key)).await?;

        Ok(found.map(|text| TextDocument {
            id: Some(self.codec.encode(&key)),
            text,
        }))
    }

    async fn update(
        &self,
        ctx: &OpContext,
        id: &str,
        doc: &TextDocument,
    ) -> Result<(), RepositoryError> {
        let key = self.codec.decode(id)?;
        let matched =
            backend_call(ctx, "update", self.collection.update_text(&key, &doc.text)).await?;
        if matched == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }

        debug!(id = %id, matched, "Updated text document");
        Ok(())
    }

    async fn delete(&self, ctx: &OpContext, id: &str) -> Result<(), RepositoryError> {
        let key = self.codec.decode(id)?;
        let deleted = backend_call(ctx, "delete", self.collection.delete_key(&key)).await?;
        if deleted == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }

        debug!(id = %id, deleted, "Deleted text document");
        Ok(())
    }
}
