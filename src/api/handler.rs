//! API Lambda handler - thin router that delegates to the text handlers.
//!
//! This module handles:
//! - Trace context extraction from request headers
//! - The request span wrapping every route
//! - Routing by method and path
//! - The invocation deadline

use std::time::Duration;

use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;
use tokio::time::Instant;
use tracing::info;

use super::{AppState, helpers, parsing, texts};
use crate::context::OpContext;
use crate::telemetry::SpanStatus;

pub use self::function_handler as handler;

/// Lambda handler for the API entrypoint.
///
/// # Errors
///
/// Never fails for a well-formed invocation; every request outcome, including
/// persistence failures, is reported through the HTTP status in the response.
#[tracing::instrument(level = "info", skip(state, event), fields(request_id = %event.context.request_id))]
pub async fn function_handler(
    state: &AppState,
    event: LambdaEvent<Value>,
) -> Result<Value, Error> {
    let mut ctx = parsing::request_context(&event.payload);
    if let Some(deadline) = invocation_deadline(event.context.deadline) {
        ctx = ctx.with_deadline(deadline);
    }

    Ok(route(state, &ctx, &event.payload).await)
}

/// Converts the Lambda deadline (epoch milliseconds) into a monotonic instant.
fn invocation_deadline(deadline_ms: u64) -> Option<Instant> {
    if deadline_ms == 0 {
        return None;
    }
    let now_ms = chrono::Utc::now().timestamp_millis();
    let remaining = i64::try_from(deadline_ms).ok()?.saturating_sub(now_ms).max(0);
    let remaining = u64::try_from(remaining).ok()?;
    Some(Instant::now() + Duration::from_millis(remaining))
}

/// Routes one API Gateway request under a request span that is a child of the
/// caller's remote span, if any.
pub async fn route(state: &AppState, ctx: &OpContext, payload: &Value) -> Value {
    let method = parsing::request_method(payload);
    let path = parsing::request_path(payload);
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    let route_name = match segments.as_slice() {
        ["save-text"] => "/save-text",
        ["texts", _] => "/texts/{id}",
        _ => path,
    };
    let (ctx, mut span) = state.tracer.start(ctx, format!("{method} {route_name}"));
    span.set_attribute("http.request.method", method.clone());
    span.set_attribute("http.route", route_name);
    info!(method = %method, path = %path, "Routing request");

    let response = match (method.as_str(), segments.as_slice()) {
        ("POST", ["save-text"]) => texts::save_text(state, &ctx, payload).await,
        ("GET", ["texts", id]) => {
            texts::get_text(state, &ctx, &parsing::decode_path_segment(id)).await
        }
        ("PUT", ["texts", id]) => {
            texts::update_text(state, &ctx, &parsing::decode_path_segment(id), payload).await
        }
        ("DELETE", ["texts", id]) => {
            texts::delete_text(state, &ctx, &parsing::decode_path_segment(id)).await
        }
        (_, ["save-text"] | ["texts", _]) => helpers::err_response(405, "Method not allowed"),
        _ => helpers::err_response(404, "Not found"),
    };

    let status = helpers::status_of(&response);
    span.set_attribute("http.response.status_code", status.to_string());
    if status >= 500 {
        span.set_status(SpanStatus::Error {
            description: format!("HTTP {status}"),
        });
    } else {
        span.set_status(SpanStatus::Ok);
    }

    response
}
