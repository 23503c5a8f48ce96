//! textstore - persists small text records behind a storage-agnostic repository,
//! with every persistence call traced as part of a distributed trace.
//!
//! # Architecture
//!
//! - [`repository::TextRepository`] is the contract callers depend on
//! - [`repository::DocumentStoreRepository`] implements it over MongoDB (or the
//!   in-memory collection) and owns identifier translation
//! - [`telemetry`] opens spans from an explicit [`telemetry::TracerProvider`]
//! - [`context::OpContext`] carries cancellation, deadline, and the active span
//! - [`api`] serves `POST /save-text` and `/texts/{id}` as a Lambda handler
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use textstore::context::OpContext;
//! use textstore::core::models::TextDocument;
//! use textstore::repository::{MemoryCollection, MemoryTextRepository, TextRepository};
//! use textstore::telemetry::{RecordingSpanProcessor, TracerProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let recorder = Arc::new(RecordingSpanProcessor::default());
//!     let provider = TracerProvider::builder("persistence-api")
//!         .with_processor(recorder.clone())
//!         .build();
//!     let tracer = provider.tracer("example");
//!     let repo = MemoryTextRepository::in_memory(Arc::new(MemoryCollection::new()));
//!
//!     let (ctx, mut span) = tracer.start(&OpContext::background(), "save");
//!     let saved = repo.insert(&ctx, &TextDocument::new("hello")).await?;
//!     span.add_event("document saved");
//!     span.end();
//!
//!     let id = saved.id.unwrap();
//!     let found = repo.find_by_id(&OpContext::background(), &id).await?;
//!     assert_eq!(found.unwrap().text, "hello");
//!     assert_eq!(recorder.ended(), 1);
//!
//!     provider.shutdown()?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod context;
pub mod core;
pub mod errors;
pub mod repository;
pub mod telemetry;

pub use errors::{ApiError, RepositoryError};

/// Configure structured logging with JSON format for AWS Lambda environments.
///
/// This function sets up tracing-subscriber with a JSON formatter suitable for
/// `CloudWatch` Logs integration. The filter comes from `RUST_LOG` and defaults
/// to `info` (`debug` with the `debug-logs` feature). Calling it more than once
/// is harmless.
///
/// # Example
///
/// ```
/// textstore::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::prelude::*;

    let default_level = if cfg!(feature = "debug-logs") {
        "debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
