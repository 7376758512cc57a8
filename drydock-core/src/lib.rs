//! Core types for the Drydock repository-hosting backend.
//!
//! Defines the domain surface shared by the HTTP service and the
//! endpoint plugins: configuration, per-request sessions, session
//! storage, the endpoint contract, and the error envelope used for
//! fault reporting.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod endpoint;
pub mod envelope;
pub mod session;
pub mod storage;

pub use config::{Config, ConfigError};
pub use endpoint::{Endpoint, EndpointFault, InputMap, Outcome, RawResponse, ServerContext};
pub use envelope::ErrorEnvelope;
pub use session::{Credentials, Session};
pub use storage::{StorageError, StorageHandle, StoragePool};
