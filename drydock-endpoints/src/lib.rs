//! Endpoint plugins for the Drydock backend.
//!
//! Each endpoint implements the [`drydock_core::Endpoint`] contract
//! and drives its external services (the GitHub API, local git
//! plumbing, the roster directory, outbound mail) through traits so
//! tests can swap them out.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod directory;
pub mod error;
pub mod gitbox;
pub mod github;
pub mod notify;
pub mod repository;

pub use directory::{DirectoryService, ProjectRoster, RosterDirectory};
pub use error::OpsError;
pub use gitbox::{GitControl, GitboxControl};
pub use github::{GithubClient, HostOutcome, NewRepository, RepoHost};
pub use notify::{Notifier, OutboundMail, SendmailNotifier};
pub use repository::RepositoryEndpoint;
