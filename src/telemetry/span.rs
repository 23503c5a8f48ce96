//! Span records and the guard that closes them.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::propagation::{SpanContext, SpanId};
use super::provider::ProviderInner;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SpanStatus {
    #[default]
    Unset,
    Ok,
    Error {
        description: String,
    },
}

impl SpanStatus {
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, SpanStatus::Error { .. })
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SpanStatus::Unset => "unset",
            SpanStatus::Ok => "ok",
            SpanStatus::Error { .. } => "error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpanEvent {
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub attributes: Vec<(String, String)>,
}

/// Everything recorded about one unit of work.
#[derive(Debug, Clone)]
pub struct SpanData {
    pub name: String,
    pub scope: Arc<str>,
    pub service_name: Arc<str>,
    pub context: SpanContext,
    pub parent_span_id: Option<SpanId>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub attributes: Vec<(String, String)>,
    pub events: Vec<SpanEvent>,
    pub status: SpanStatus,
}

impl SpanData {
    #[must_use]
    pub fn duration_ms(&self) -> Option<i64> {
        self.end_time
            .map(|end| (end - self.start_time).num_milliseconds())
    }

    #[must_use]
    pub fn has_event(&self, name: &str) -> bool {
        self.events.iter().any(|e| e.name == name)
    }
}

/// An open unit of work.
///
/// The span is closed exactly once: either by [`Span::end`] or when the guard
/// is dropped, whichever happens first. Every early return and `?` in the
/// owning scope therefore closes it.
#[derive(Debug)]
#[must_use = "dropping a span closes it immediately"]
pub struct Span {
    data: Option<SpanData>,
    context: SpanContext,
    recording: bool,
    provider: Arc<ProviderInner>,
}

impl Span {
    pub(super) fn start(provider: Arc<ProviderInner>, data: SpanData) -> Self {
        let recording = provider.on_start(&data);
        Self {
            context: data.context,
            data: Some(data),
            recording,
            provider,
        }
    }

    #[must_use]
    pub fn span_context(&self) -> SpanContext {
        self.context
    }

    /// Whether processors observe this span. Spans opened after the provider
    /// shut down still propagate context but are not exported.
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn add_event(&mut self, name: impl Into<String>) {
        self.add_event_with_attributes(name, Vec::new());
    }

    pub fn add_event_with_attributes(
        &mut self,
        name: impl Into<String>,
        attributes: Vec<(String, String)>,
    ) {
        if let Some(data) = self.data.as_mut() {
            data.events.push(SpanEvent {
                name: name.into(),
                timestamp: Utc::now(),
                attributes,
            });
        }
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        if let Some(data) = self.data.as_mut() {
            data.attributes.push((key.into(), value.into()));
        }
    }

    pub fn set_status(&mut self, status: SpanStatus) {
        if let Some(data) = self.data.as_mut() {
            // An error status is sticky.
            if !data.status.is_error() {
                data.status = status;
            }
        }
    }

    /// Marks the span failed and records the error as an `exception` event.
    pub fn record_error(&mut self, error: &dyn std::error::Error) {
        let description = error.to_string();
        self.add_event_with_attributes(
            "exception",
            vec![("exception.message".to_string(), description.clone())],
        );
        if let Some(data) = self.data.as_mut() {
            data.status = SpanStatus::Error { description };
        }
    }

    /// Closes the span now.
    pub fn end(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        let Some(mut data) = self.data.take() else {
            return;
        };
        data.end_time = Some(Utc::now());
        if self.recording {
            self.provider.on_end(data);
        }
    }
}

impl Drop for Span {
    fn drop(&mut self) {
        self.finish();
    }
}
