//! The endpoint contract between the dispatch core and its plugins.

use async_trait::async_trait;

use crate::config::Config;
use crate::session::Session;
use crate::storage::StoragePool;

/// Parsed request input: field name to JSON value.
pub type InputMap = serde_json::Map<String, serde_json::Value>;

/// A fault raised by an endpoint during invocation.
///
/// Endpoints express expected conditions (bad input, permission
/// denials) as structured response values; a fault is reserved for
/// failures the endpoint cannot answer. Faults are contained at the
/// dispatch boundary and never reach the transport layer uncaught.
pub type EndpointFault = Box<dyn std::error::Error + Send + Sync>;

/// Immutable per-process state handed to every endpoint invocation.
#[derive(Debug, Clone)]
pub struct ServerContext {
    pub config: Config,
    pub storage: StoragePool,
}

/// A response an endpoint has already formed; passed to the client
/// verbatim, bypassing JSON serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
}

/// The value an endpoint hands back to the dispatch core.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A JSON-serializable value, encoded by the response serializer.
    Value(serde_json::Value),
    /// A pre-built response the serializer passes through unchanged.
    Raw(RawResponse),
}

impl Outcome {
    /// The common `{okay, message}` reply shape.
    #[must_use]
    pub fn reply(okay: bool, message: impl Into<String>) -> Self {
        Self::Value(serde_json::json!({ "okay": okay, "message": message.into() }))
    }
}

/// A named unit of request-handling logic registered under a single
/// path segment.
///
/// Implementations must be `Send + Sync`; one instance serves all
/// concurrent request tasks.
#[async_trait]
pub trait Endpoint: Send + Sync {
    /// Handle one request.
    ///
    /// Missing credentials are an expected state, not a fault: the
    /// session's `credentials` field is `None` and the endpoint decides
    /// how to answer.
    ///
    /// # Errors
    /// Any fault returned here is contained by the dispatcher and
    /// reported according to the disclosure policy.
    async fn invoke(
        &self,
        ctx: &ServerContext,
        session: &mut Session,
        input: &InputMap,
    ) -> Result<Outcome, EndpointFault>;
}
