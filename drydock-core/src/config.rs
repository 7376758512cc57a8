//! Configuration loading and management.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML or is missing required fields.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level server configuration, loaded from a TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// HTTP listener and fault-disclosure policy.
    pub server: ServerSection,
    /// Session database.
    pub database: DatabaseSection,
    /// GitHub organization the repositories are created under.
    pub github: GithubSection,
    /// Local repository hosting layout.
    pub repos: ReposSection,
    /// Project membership directory.
    pub directory: DirectorySection,
    /// Outbound notification mail.
    pub mail: MailSection,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    /// Address to bind to (e.g. "127.0.0.1:8080").
    pub addr: SocketAddr,
    /// When true, handler faults are returned to the client in full.
    /// When false, faults are logged under a short error id and the
    /// client receives only the id.
    #[serde(default)]
    pub traceback_disclosure: bool,
}

/// Session database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSection {
    /// Path to the SQLite session database.
    pub path: String,
    /// Seconds between expired-session sweeps.
    #[serde(default = "default_purge_interval")]
    pub purge_interval_secs: u64,
}

/// GitHub API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubSection {
    /// Organization repositories are created under.
    pub org: String,
    /// API token with repository-creation rights on the organization.
    pub token: String,
    /// API root, overridable for testing against a stub server.
    #[serde(default = "default_api_root")]
    pub api_root: String,
}

/// Local repository hosting layout.
#[derive(Debug, Clone, Deserialize)]
pub struct ReposSection {
    /// Directory holding public repositories.
    pub public_root: PathBuf,
    /// Directory holding private repositories, one subdirectory per project.
    pub private_root: PathBuf,
    /// Clone helper invoked after remote creation.
    #[serde(default = "default_clone_tool")]
    pub clone_tool: PathBuf,
    /// Directory the web server reads per-project auth config from.
    #[serde(default = "default_httpd_conf_dir")]
    pub httpd_conf_dir: PathBuf,
}

/// Project membership directory configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectorySection {
    /// JSON roster file mapping project names to committer/PMC lists.
    pub roster_path: PathBuf,
    /// Projects foundation members may create repositories for without
    /// a roster check.
    #[serde(default = "default_exec_projects")]
    pub exec_projects: Vec<String>,
}

/// Outbound mail configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MailSection {
    /// Sender address on notification mail.
    #[serde(default = "default_sender")]
    pub sender: String,
    /// Address receiving a copy of every new-repository notification.
    pub notify_address: String,
    /// Delivery agent the notifier pipes messages to.
    #[serde(default = "default_sendmail")]
    pub sendmail_path: PathBuf,
}

fn default_purge_interval() -> u64 {
    900
}

fn default_api_root() -> String {
    "https://api.github.com".to_owned()
}

fn default_clone_tool() -> PathBuf {
    PathBuf::from("/x1/gitbox/bin/gitbox-clone")
}

fn default_httpd_conf_dir() -> PathBuf {
    PathBuf::from("/x1/gitbox/conf/httpd")
}

fn default_exec_projects() -> Vec<String> {
    vec!["board".to_owned(), "members".to_owned(), "foundation".to_owned()]
}

fn default_sender() -> String {
    "GitBox <gitbox@apache.org>".to_owned()
}

fn default_sendmail() -> PathBuf {
    PathBuf::from("/usr/sbin/sendmail")
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not valid TOML.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
