//! API Lambda handler and request processing

pub mod handler;
pub mod helpers;
pub mod parsing;
pub mod texts;

use std::sync::Arc;

use crate::core::config::AppConfig;
use crate::repository::TextRepository;
use crate::telemetry::Tracer;

// Re-export the main handler for convenience
pub use handler::{handler, route};

/// Everything a request handler needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn TextRepository>,
    pub tracer: Tracer,
    pub fault_marker: Option<String>,
}

impl AppState {
    pub fn new(repo: Arc<dyn TextRepository>, tracer: Tracer, config: &AppConfig) -> Self {
        Self {
            repo,
            tracer,
            fault_marker: config.fault_marker.clone(),
        }
    }
}
