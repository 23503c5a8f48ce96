//! Route handlers for text documents.
//!
//! Each handler opens its own span under the request span, records milestones
//! and failures on it, and lets the guard close it on the way out.

use serde_json::{Value, json};
use tracing::{error, info, warn};

use super::AppState;
use super::helpers;
use super::parsing;
use crate::context::OpContext;
use crate::core::models::TextDocument;
use crate::errors::ApiError;
use crate::telemetry::{Span, SpanStatus};

/// Maps a handler outcome to a response and records it on `span`.
fn respond(span: &mut Span, result: Result<Value, ApiError>) -> Value {
    match result {
        Ok(body) => {
            span.set_status(SpanStatus::Ok);
            helpers::ok_json(&body)
        }
        Err(e) => {
            let status = e.status_code();
            if status >= 500 {
                error!(status, "Request failed: {}", e);
            } else {
                warn!(status, "Request rejected: {}", e);
            }
            span.record_error(&e);
            helpers::err_response(status, &e.to_string())
        }
    }
}

/// `POST /save-text`
pub async fn save_text(state: &AppState, ctx: &OpContext, payload: &Value) -> Value {
    let (ctx, mut span) = state.tracer.start(ctx, "save-text");
    let result = save_text_inner(state, &ctx, &mut span, payload).await;
    respond(&mut span, result)
}

async fn save_text_inner(
    state: &AppState,
    ctx: &OpContext,
    span: &mut Span,
    payload: &Value,
) -> Result<Value, ApiError> {
    let request = parsing::parse_text_body(payload)?;
    span.add_event("bind ok");

    #[cfg(feature = "debug-logs")]
    info!("Saving text: {:?}", request.text);

    #[cfg(not(feature = "debug-logs"))]
    info!(text_len = request.text.len(), "Saving text");

    if let Some(marker) = state.fault_marker.as_deref() {
        if request.text.contains(marker) {
            return Err(ApiError::FaultInjected(marker.to_string()));
        }
    }

    let saved = state
        .repo
        .insert(ctx, &TextDocument::new(request.text))
        .await?;
    let id = saved.id.unwrap_or_default();
    span.set_attribute("document.id", id.clone());
    span.add_event("document saved");

    Ok(json!({
        "status": format!("Text '{}' saved", saved.text),
        "id": id,
    }))
}

/// `GET /texts/{id}`
pub async fn get_text(state: &AppState, ctx: &OpContext, id: &str) -> Value {
    let (ctx, mut span) = state.tracer.start(ctx, "get-text");
    span.set_attribute("document.id", id);

    let result = match state.repo.find_by_id(&ctx, id).await {
        Ok(Some(doc)) => {
            span.add_event("document loaded");
            Ok(json!({ "id": doc.id, "text": doc.text }))
        }
        Ok(None) => Err(ApiError::DocumentMissing(id.to_string())),
        Err(e) => Err(e.into()),
    };
    respond(&mut span, result)
}

/// `PUT /texts/{id}`
pub async fn update_text(state: &AppState, ctx: &OpContext, id: &str, payload: &Value) -> Value {
    let (ctx, mut span) = state.tracer.start(ctx, "update-text");
    span.set_attribute("document.id", id);

    let result = async {
        let request = parsing::parse_text_body(payload)?;
        span.add_event("bind ok");
        state
            .repo
            .update(&ctx, id, &TextDocument::new(request.text))
            .await?;
        span.add_event("document updated");
        Ok::<_, ApiError>(json!({ "status": format!("Text '{id}' updated") }))
    }
    .await;
    respond(&mut span, result)
}

/// `DELETE /texts/{id}`
pub async fn delete_text(state: &AppState, ctx: &OpContext, id: &str) -> Value {
    let (ctx, mut span) = state.tracer.start(ctx, "delete-text");
    span.set_attribute("document.id", id);

    let result = match state.repo.delete(&ctx, id).await {
        Ok(()) => {
            span.add_event("document deleted");
            Ok(json!({ "status": format!("Text '{id}' deleted") }))
        }
        Err(e) => Err(e.into()),
    };
    respond(&mut span, result)
}
