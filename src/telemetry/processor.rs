//! Span processors: where closed spans go.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, info, warn};

use super::span::SpanData;
use crate::errors::TelemetryError;

/// Receives span lifecycle notifications from a [`super::TracerProvider`].
pub trait SpanProcessor: Send + Sync + std::fmt::Debug {
    fn on_start(&self, _span: &SpanData) {}

    fn on_end(&self, span: SpanData);

    /// # Errors
    ///
    /// Returns an error if buffered spans could not be flushed.
    fn shutdown(&self) -> Result<(), TelemetryError> {
        Ok(())
    }
}

/// Writes each closed span as one structured log record.
///
/// This is the export point: a processor that ships spans to a collector
/// (OTLP or similar) implements [`SpanProcessor`] and replaces this one in
/// the provider builder.
#[derive(Debug, Default)]
pub struct LogSpanProcessor;

impl SpanProcessor for LogSpanProcessor {
    fn on_start(&self, span: &SpanData) {
        debug!(
            target: "textstore::span",
            trace_id = %span.context.trace_id,
            span_id = %span.context.span_id,
            name = %span.name,
            "span started"
        );
    }

    fn on_end(&self, span: SpanData) {
        let parent_id = span
            .parent_span_id
            .map(|id| id.to_hex())
            .unwrap_or_default();
        let events = span
            .events
            .iter()
            .map(|e| e.name.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let duration_ms = span.duration_ms().unwrap_or_default();

        match &span.status {
            super::SpanStatus::Error { description } => warn!(
                target: "textstore::span",
                service = %span.service_name,
                scope = %span.scope,
                trace_id = %span.context.trace_id,
                span_id = %span.context.span_id,
                parent_id = %parent_id,
                name = %span.name,
                status = "error",
                error = %description,
                duration_ms,
                events = %events,
                "span closed"
            ),
            status => info!(
                target: "textstore::span",
                service = %span.service_name,
                scope = %span.scope,
                trace_id = %span.context.trace_id,
                span_id = %span.context.span_id,
                parent_id = %parent_id,
                name = %span.name,
                status = status.as_str(),
                duration_ms,
                events = %events,
                "span closed"
            ),
        }
    }
}

/// Keeps every closed span in memory and counts opens and closes.
///
/// Meant for tests and local inspection.
#[derive(Debug, Default)]
pub struct RecordingSpanProcessor {
    started: AtomicUsize,
    ended: AtomicUsize,
    finished: Mutex<Vec<SpanData>>,
}

impl RecordingSpanProcessor {
    #[must_use]
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn ended(&self) -> usize {
        self.ended.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn finished_spans(&self) -> Vec<SpanData> {
        self.finished
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Most recently closed span with the given name.
    #[must_use]
    pub fn span_named(&self, name: &str) -> Option<SpanData> {
        self.finished
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .find(|s| s.name == name)
            .cloned()
    }

    /// Number of closed spans with the given name.
    #[must_use]
    pub fn count_named(&self, name: &str) -> usize {
        self.finished
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| s.name == name)
            .count()
    }
}

impl SpanProcessor for RecordingSpanProcessor {
    fn on_start(&self, _span: &SpanData) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn on_end(&self, span: SpanData) {
        self.ended.fetch_add(1, Ordering::SeqCst);
        self.finished
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(span);
    }
}
