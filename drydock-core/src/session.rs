//! Per-request sessions and the credentials they may carry.

use serde::{Deserialize, Serialize};

use crate::endpoint::ServerContext;
use crate::storage::StorageHandle;

/// An authenticated caller's identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Account id, e.g. "humbedooh".
    pub uid: String,
    /// Display name.
    pub fullname: String,
    /// Primary mail address.
    pub email: String,
    /// Infrastructure staff flag.
    pub admin: bool,
    /// Foundation member flag.
    pub member: bool,
}

/// The per-request session handed to an endpoint.
///
/// A session always exists, even for anonymous callers. Whether it
/// carries credentials is the endpoint's concern; constructing the
/// session never fails.
#[derive(Debug)]
pub struct Session {
    /// Caller identity, `None` for anonymous requests.
    pub credentials: Option<Credentials>,
    storage: Option<StorageHandle>,
}

impl Session {
    /// A session with no credentials and no storage lease.
    #[must_use]
    pub fn anonymous() -> Self {
        Self { credentials: None, storage: None }
    }

    /// A session for an authenticated caller holding a storage lease.
    #[must_use]
    pub fn authenticated(credentials: Credentials, storage: StorageHandle) -> Self {
        Self { credentials: Some(credentials), storage: Some(storage) }
    }

    /// Resolve a session token into a session.
    ///
    /// Absent, unknown, or expired tokens all yield an anonymous
    /// session. A storage failure during lookup is logged and treated
    /// the same way; the request proceeds unauthenticated.
    pub async fn attach(ctx: &ServerContext, token: Option<&str>) -> Self {
        let Some(token) = token else {
            return Self::anonymous();
        };
        match ctx.storage.lookup_token(token).await {
            Ok(Some(credentials)) => Self::authenticated(credentials, ctx.storage.lease()),
            Ok(None) => Self::anonymous(),
            Err(error) => {
                tracing::debug!(%error, "session lookup failed, continuing anonymously");
                Self::anonymous()
            }
        }
    }

    /// Whether the session currently holds a storage lease.
    #[must_use]
    pub fn has_storage(&self) -> bool {
        self.storage.is_some()
    }

    /// The storage lease, if one is held.
    #[must_use]
    pub fn storage(&self) -> Option<&StorageHandle> {
        self.storage.as_ref()
    }

    /// Drop the storage lease. Returns whether a lease was held.
    ///
    /// Safe to call more than once; only the first call releases.
    pub fn release_storage(&mut self) -> bool {
        self.storage.take().is_some()
    }
}
