//! Endpoint dispatch and fault containment.
//!
//! Every endpoint invocation passes through here. Whatever the
//! endpoint does, the session's storage lease is released on the way
//! out and faults are reported per the disclosure policy instead of
//! escaping to the transport layer.

use std::sync::Arc;

use axum::http::StatusCode;

use drydock_core::{Endpoint, ErrorEnvelope, InputMap, ServerContext, Session};

use crate::serialize::{serialize, WireResponse};

/// Invoke an endpoint with fault containment.
///
/// The storage lease is released at exactly one point, after the
/// endpoint returns, on success and failure alike.
pub async fn invoke_contained(
    ctx: &ServerContext,
    endpoint: &Arc<dyn Endpoint>,
    path: &str,
    session: &mut Session,
    input: &InputMap,
) -> WireResponse {
    let result = endpoint.invoke(ctx, session, input).await;
    session.release_storage();
    match result {
        Ok(outcome) => serialize(outcome),
        Err(fault) => contain_fault(ctx, path, &fault),
    }
}

fn contain_fault(
    ctx: &ServerContext,
    path: &str,
    fault: &drydock_core::EndpointFault,
) -> WireResponse {
    let envelope = ErrorEnvelope::from_fault(fault);
    if ctx.config.server.traceback_disclosure {
        return WireResponse::text(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("API error occurred: \n{}", envelope.detail_text()),
        );
    }
    tracing::error!("API Endpoint {path} got into trouble ({}):", envelope.id);
    for line in envelope.log_lines() {
        tracing::error!("{line}");
    }
    WireResponse::text(
        StatusCode::INTERNAL_SERVER_ERROR,
        format!(
            "API error occurred. The application journal will have information. Error ID: {}",
            envelope.id
        ),
    )
}
