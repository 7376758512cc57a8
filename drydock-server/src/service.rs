//! The HTTP service: one fallback handler funnels every request
//! through the parse, route, session and dispatch pipeline.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, Request};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tower_http::trace::TraceLayer;

use drydock_core::{ServerContext, Session};

use crate::body::parse_input;
use crate::dispatch::invoke_contained;
use crate::error::ServiceError;
use crate::registry::EndpointRegistry;
use crate::router::route;
use crate::serialize::WireResponse;

/// Largest request body the service will read.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "drydock_session";

/// Shared per-process application state.
pub struct App {
    pub ctx: ServerContext,
    pub registry: EndpointRegistry,
}

/// Build the axum router around the shared application state.
pub fn create_app(app: Arc<App>) -> Router {
    Router::new()
        .fallback(handle_request)
        .with_state(app)
        .layer(TraceLayer::new_for_http())
}

async fn handle_request(State(app): State<Arc<App>>, request: Request<Body>) -> Response {
    let mut response = match run_pipeline(&app, request).await {
        Ok(wire) => wire.into_response(),
        Err(error) => error.into_response(),
    };
    response.headers_mut().insert(header::SERVER, server_banner());
    response
}

async fn run_pipeline(app: &App, request: Request<Body>) -> Result<WireResponse, ServiceError> {
    let path = request.uri().path().to_owned();
    let query = request.uri().query().map(str::to_owned);
    let token = session_token(request.headers());

    let (name, format) = route(&path);
    let name = name.to_owned();

    let body = axum::body::to_bytes(request.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|error| ServiceError::BodyRead(error.to_string()))?;

    // Input is validated before the endpoint lookup, so a malformed
    // body on an unknown path answers 400, not 404.
    let input = parse_input(format, query.as_deref(), &body)?;

    let Some(endpoint) = app.registry.get(&name) else {
        return Err(ServiceError::UnknownEndpoint);
    };

    let mut session = Session::attach(&app.ctx, token.as_deref()).await;
    Ok(invoke_contained(&app.ctx, endpoint, &path, &mut session, &input).await)
}

/// Extract the session token from the Cookie header, if present.
fn session_token(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_owned())
    })
}

fn server_banner() -> HeaderValue {
    HeaderValue::from_static(concat!("drydock/", env!("CARGO_PKG_VERSION")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let parsed = match HeaderValue::from_str(value) {
            Ok(v) => v,
            Err(e) => panic!("test cookie must be a valid header: {e}"),
        };
        headers.insert(header::COOKIE, parsed);
        headers
    }

    #[test]
    fn session_token_found_among_other_cookies() {
        let headers = headers_with_cookie("theme=dark; drydock_session=tok-abc; lang=en");
        assert_eq!(session_token(&headers), Some("tok-abc".to_owned()));
    }

    #[test]
    fn missing_cookie_header_yields_no_token() {
        assert_eq!(session_token(&HeaderMap::new()), None);
    }

    #[test]
    fn other_cookies_alone_yield_no_token() {
        let headers = headers_with_cookie("theme=dark; lang=en");
        assert_eq!(session_token(&headers), None);
    }

    #[test]
    fn cookie_name_must_match_exactly() {
        let headers = headers_with_cookie("drydock_session_old=tok-abc");
        assert_eq!(session_token(&headers), None);
    }

    #[test]
    fn server_banner_names_the_crate_version() {
        let banner = server_banner();
        let text = match banner.to_str() {
            Ok(t) => t,
            Err(e) => panic!("banner must be ascii: {e}"),
        };
        assert!(text.starts_with("drydock/"));
    }
}
