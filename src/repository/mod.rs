//! Storage-agnostic persistence for text documents.
//!
//! Callers depend on [`TextRepository`] only. [`DocumentStoreRepository`] is
//! the adapter that realizes it over any [`DocumentCollection`]: MongoDB in
//! production, [`memory::MemoryCollection`] in tests and local runs.

pub mod identifier;
pub mod memory;
pub mod mongo;
pub mod store;

use async_trait::async_trait;

use crate::context::OpContext;
use crate::core::models::TextDocument;
use crate::errors::RepositoryError;

pub use identifier::{KeyCodec, ObjectIdCodec};
pub use memory::{MemoryCollection, MemoryTextRepository};
pub use mongo::{MongoTextRepository, TextRecord};
pub use store::{DocumentCollection, DocumentStoreRepository};

/// The capability set every backend provides.
///
/// Identifiers are opaque strings; only the implementing backend knows their
/// syntax.
#[async_trait]
pub trait TextRepository: Send + Sync {
    /// Stores `doc.text` under a freshly allocated identifier. Any `doc.id` on
    /// input is ignored. Returns the stored document with its new identifier.
    async fn insert(
        &self,
        ctx: &OpContext,
        doc: &TextDocument,
    ) -> Result<TextDocument, RepositoryError>;

    /// Looks a document up by identifier.
    ///
    /// A well-formed identifier that matches nothing yields `Ok(None)`, not
    /// `NotFound`. `update` and `delete` treat the same condition as an error.
    async fn find_by_id(
        &self,
        ctx: &OpContext,
        id: &str,
    ) -> Result<Option<TextDocument>, RepositoryError>;

    /// Replaces the content of the document addressed by `id`. The identifier
    /// itself is never changed; `doc.id` is ignored.
    async fn update(
        &self,
        ctx: &OpContext,
        id: &str,
        doc: &TextDocument,
    ) -> Result<(), RepositoryError>;

    async fn delete(&self, ctx: &OpContext, id: &str) -> Result<(), RepositoryError>;
}
