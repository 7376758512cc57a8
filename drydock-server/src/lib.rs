//! The Drydock HTTP service.
//!
//! Wires the endpoint registry, request router, body parser, session
//! provider and fault-containing dispatcher into one axum application.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod background;
pub mod body;
pub mod dispatch;
pub mod error;
pub mod registry;
pub mod router;
pub mod serialize;
pub mod service;

pub use error::{ServiceError, StartupError};
pub use registry::{EndpointRegistry, RegistryBuilder, RegistryError};
pub use router::{route, BodyFormat};
pub use service::{create_app, App, SESSION_COOKIE};

use std::sync::Arc;

use drydock_core::Config;
use drydock_endpoints::RepositoryEndpoint;

/// Build the endpoint registry for a production server.
///
/// # Errors
/// Returns [`StartupError`] if an endpoint cannot be constructed or a
/// name collides.
pub fn build_registry(config: &Config) -> Result<EndpointRegistry, StartupError> {
    let repository = RepositoryEndpoint::from_config(config)?;
    let builder = RegistryBuilder::new().register("repository", Arc::new(repository))?;
    Ok(builder.build())
}
