//! GitHub organization API client for remote repository creation.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use drydock_core::config::GithubSection;

use crate::error::OpsError;

/// Timeout on every API call.
const API_TIMEOUT: Duration = Duration::from_secs(15);

/// A repository creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRepository {
    /// Full repository name including the `.git` suffix.
    pub name: String,
    /// One-line description.
    pub description: String,
    /// Project homepage.
    pub homepage: String,
    /// Whether the repository is private to the organization.
    pub private: bool,
}

/// What the hosting API said about a creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOutcome {
    /// The repository now exists remotely.
    Created,
    /// The API refused; the payload is its response body, passed to
    /// the requester verbatim.
    Rejected(String),
}

/// A remote repository host.
#[async_trait]
pub trait RepoHost: Send + Sync {
    /// Create a repository under the configured organization.
    ///
    /// # Errors
    /// Returns [`OpsError::Http`] only when the API cannot be reached
    /// at all; an unhappy API answer is a [`HostOutcome::Rejected`].
    async fn create_repository(&self, repo: &NewRepository) -> Result<HostOutcome, OpsError>;
}

#[derive(Serialize)]
struct CreatePayload<'a> {
    name: &'a str,
    description: &'a str,
    homepage: &'a str,
    private: bool,
    has_issues: bool,
    has_projects: bool,
    has_wiki: bool,
}

/// The production GitHub client.
pub struct GithubClient {
    http: reqwest::Client,
    org: String,
    token: String,
    api_root: String,
}

impl GithubClient {
    /// Build a client from the GitHub configuration section.
    ///
    /// # Errors
    /// Returns [`OpsError::Http`] if the underlying HTTP client cannot
    /// be constructed.
    pub fn new(section: &GithubSection) -> Result<Self, OpsError> {
        let http = reqwest::Client::builder()
            .connect_timeout(API_TIMEOUT)
            .read_timeout(API_TIMEOUT)
            .user_agent(concat!("drydock/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            org: section.org.clone(),
            token: section.token.clone(),
            api_root: section.api_root.clone(),
        })
    }
}

#[async_trait]
impl RepoHost for GithubClient {
    async fn create_repository(&self, repo: &NewRepository) -> Result<HostOutcome, OpsError> {
        let url = format!("{}/orgs/{}/repos", self.api_root, self.org);
        let payload = CreatePayload {
            name: &repo.name,
            description: &repo.description,
            homepage: &repo.homepage,
            private: repo.private,
            has_issues: false,
            has_projects: false,
            has_wiki: false,
        };
        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("token {}", self.token))
            .json(&payload)
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::CREATED {
            tracing::info!(repo = %repo.name, org = %self.org, "remote repository created");
            return Ok(HostOutcome::Created);
        }
        let body = response.text().await.unwrap_or_default();
        Ok(HostOutcome::Rejected(body))
    }
}
