//! Span creation, propagation, and export.
//!
//! A [`TracerProvider`] is built once at startup with one or more
//! [`SpanProcessor`]s. Components that open spans receive a [`Tracer`] from
//! it; spans are RAII guards closed exactly once.

mod processor;
mod propagation;
mod provider;
mod span;

pub use processor::{LogSpanProcessor, RecordingSpanProcessor, SpanProcessor};
pub use propagation::{Baggage, SpanContext, SpanId, TraceId};
pub use provider::{ProviderGuard, Tracer, TracerProvider, TracerProviderBuilder};
pub use span::{Span, SpanData, SpanEvent, SpanStatus};
