//! The project membership directory, read from a JSON roster file.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::OpsError;

/// Membership lists for one project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProjectRoster {
    /// Accounts with commit access.
    #[serde(default)]
    pub committers: Vec<String>,
    /// (I)PMC members, the only ones who may request repositories.
    #[serde(default)]
    pub pmc: Vec<String>,
}

/// Resolves project names to membership rosters.
#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// The roster for a project, or `None` if the project is unknown.
    ///
    /// # Errors
    /// Returns [`OpsError`] if the directory itself cannot be
    /// consulted.
    async fn project_roster(&self, project: &str) -> Result<Option<ProjectRoster>, OpsError>;
}

/// Roster directory backed by a JSON file on disk.
///
/// The file is re-read on every lookup so roster updates land without
/// a restart.
pub struct RosterDirectory {
    path: PathBuf,
}

impl RosterDirectory {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl DirectoryService for RosterDirectory {
    async fn project_roster(&self, project: &str) -> Result<Option<ProjectRoster>, OpsError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let mut rosters: HashMap<String, ProjectRoster> = serde_json::from_str(&content)?;
        Ok(rosters.remove(project))
    }
}
