//! Tracer provider lifecycle.
//!
//! The provider is an explicit handle built once at startup and passed to
//! whatever opens spans. There is no process-global tracer.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tracing::{error, info};

use super::processor::SpanProcessor;
use super::propagation::{SpanContext, SpanId, TraceId};
use super::span::{Span, SpanData, SpanStatus};
use crate::context::OpContext;
use crate::errors::TelemetryError;

#[derive(Debug)]
pub(crate) struct ProviderInner {
    service_name: Arc<str>,
    processors: Vec<Arc<dyn SpanProcessor>>,
    shut_down: AtomicBool,
}

impl ProviderInner {
    /// Returns whether the span is recorded.
    pub(crate) fn on_start(&self, data: &SpanData) -> bool {
        if self.shut_down.load(Ordering::Acquire) {
            return false;
        }
        for processor in &self.processors {
            processor.on_start(data);
        }
        true
    }

    pub(crate) fn on_end(&self, data: SpanData) {
        if let Some((last, rest)) = self.processors.split_last() {
            for processor in rest {
                processor.on_end(data.clone());
            }
            last.on_end(data);
        }
    }
}

#[derive(Debug, Clone)]
pub struct TracerProvider {
    inner: Arc<ProviderInner>,
}

#[derive(Debug)]
pub struct TracerProviderBuilder {
    service_name: String,
    processors: Vec<Arc<dyn SpanProcessor>>,
}

impl TracerProviderBuilder {
    #[must_use]
    pub fn with_processor(mut self, processor: Arc<dyn SpanProcessor>) -> Self {
        self.processors.push(processor);
        self
    }

    #[must_use]
    pub fn build(self) -> TracerProvider {
        TracerProvider {
            inner: Arc::new(ProviderInner {
                service_name: self.service_name.into(),
                processors: self.processors,
                shut_down: AtomicBool::new(false),
            }),
        }
    }
}

impl TracerProvider {
    #[must_use]
    pub fn builder(service_name: impl Into<String>) -> TracerProviderBuilder {
        TracerProviderBuilder {
            service_name: service_name.into(),
            processors: Vec::new(),
        }
    }

    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.inner.service_name
    }

    #[must_use]
    pub fn tracer(&self, scope: &str) -> Tracer {
        Tracer {
            inner: Arc::clone(&self.inner),
            scope: scope.into(),
        }
    }

    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.inner.shut_down.load(Ordering::Acquire)
    }

    /// Stops recording new spans and shuts down every processor.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyShutdown` on a second call, or the first processor
    /// failure encountered.
    pub fn shutdown(&self) -> Result<(), TelemetryError> {
        if self.inner.shut_down.swap(true, Ordering::AcqRel) {
            return Err(TelemetryError::AlreadyShutdown);
        }
        info!(service = %self.inner.service_name, "Shutting down tracer provider");

        let mut first_err = None;
        for processor in &self.inner.processors {
            if let Err(e) = processor.shutdown() {
                error!("Span processor shutdown failed: {}", e);
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Wraps the provider so it is shut down when the guard goes out of scope.
    #[must_use]
    pub fn into_guard(self) -> ProviderGuard {
        ProviderGuard { provider: self }
    }
}

/// Shuts the provider down on drop unless it already was.
#[derive(Debug)]
pub struct ProviderGuard {
    provider: TracerProvider,
}

impl ProviderGuard {
    #[must_use]
    pub fn provider(&self) -> &TracerProvider {
        &self.provider
    }
}

impl Drop for ProviderGuard {
    fn drop(&mut self) {
        if self.provider.is_shutdown() {
            return;
        }
        if let Err(e) = self.provider.shutdown() {
            error!("Tracer provider shutdown failed: {}", e);
        }
    }
}

/// Opens spans on behalf of one instrumentation scope.
#[derive(Debug, Clone)]
pub struct Tracer {
    inner: Arc<ProviderInner>,
    scope: Arc<str>,
}

impl Tracer {
    /// Opens a span as a child of the span active on `ctx`, or as the root of a
    /// new trace when there is none. The returned context carries the new span
    /// as active, so calls made with it nest underneath.
    pub fn start(&self, ctx: &OpContext, name: impl Into<String>) -> (OpContext, Span) {
        let parent = ctx.span();
        let span_context = SpanContext {
            trace_id: parent.map_or_else(TraceId::random, |p| p.trace_id),
            span_id: SpanId::random(),
            sampled: parent.is_none_or(|p| p.sampled),
            remote: false,
        };

        let data = SpanData {
            name: name.into(),
            scope: Arc::clone(&self.scope),
            service_name: Arc::clone(&self.inner.service_name),
            context: span_context,
            parent_span_id: parent.map(|p| p.span_id),
            start_time: Utc::now(),
            end_time: None,
            attributes: Vec::new(),
            events: Vec::new(),
            status: SpanStatus::Unset,
        };

        let span = Span::start(Arc::clone(&self.inner), data);
        (ctx.with_span(span_context), span)
    }
}
