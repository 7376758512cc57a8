//! Local git hosting plumbing: private project provisioning, the
//! clone helper and per-repository configuration.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt as _;
use tokio::process::Command;

use drydock_core::config::ReposSection;

use crate::error::OpsError;

/// Local repository hosting operations.
#[async_trait]
pub trait GitControl: Send + Sync {
    /// Whether a repository already exists at the given path.
    fn repo_exists(&self, path: &Path) -> bool;

    /// First-time setup for a project's private repository directory:
    /// create it and install the web server auth configuration. A
    /// no-op when the directory already exists.
    ///
    /// # Errors
    /// Returns [`OpsError::CommandFailed`] if the web server refuses
    /// to reload the new auth configuration, [`OpsError::Io`] on
    /// filesystem failure.
    async fn provision_private_project(&self, project: &str) -> Result<(), OpsError>;

    /// Write (or rewrite) the project's private gitweb configuration.
    ///
    /// # Errors
    /// Returns [`OpsError::Io`] on filesystem failure.
    async fn write_project_gitweb(&self, project: &str) -> Result<(), OpsError>;

    /// Clone a freshly created remote repository to its local path.
    ///
    /// # Errors
    /// Returns [`OpsError::CommandFailed`] with the helper's stderr if
    /// it exits nonzero.
    async fn clone_repository(
        &self,
        origin: &str,
        destination: &Path,
        commit_mail: &str,
        title: &str,
    ) -> Result<(), OpsError>;

    /// Append the dev/issue mail target to a repository's git config.
    ///
    /// # Errors
    /// Returns [`OpsError::Io`] on filesystem failure.
    async fn append_dev_target(&self, repo_path: &Path, issue_mail: &str) -> Result<(), OpsError>;
}

/// The production implementation driving the gitbox host layout.
pub struct GitboxControl {
    clone_tool: PathBuf,
    httpd_conf_dir: PathBuf,
    private_root: PathBuf,
}

impl GitboxControl {
    #[must_use]
    pub fn from_section(section: &ReposSection) -> Self {
        Self {
            clone_tool: section.clone_tool.clone(),
            httpd_conf_dir: section.httpd_conf_dir.clone(),
            private_root: section.private_root.clone(),
        }
    }
}

/// The web server auth stanza protecting a project's private repos.
fn htaccess_config(project: &str) -> String {
    format!(
        r#"
<Location /repos/private/{project}>
AuthType Basic
AuthName "ASF Private Repos for Apache {project}"
AuthBasicProvider ldap
AuthLDAPUrl "ldaps://ldap-eu-ro.apache.org/ou=people,dc=apache,dc=org?uid"
AuthLDAPGroupAttribute owner
AuthLDAPGroupAttributeIsDN on
Require ldap-group cn={project},ou=project,ou=groups,dc=apache,dc=org
</Location>
"#
    )
}

/// The gitweb configuration for a project's private repository view.
fn gitweb_config(project: &str, project_root: &Path) -> String {
    format!(
        r#"
our $projectroot = "{root}";
our $site_name = "Private repositories for Apache {project}";
our $site_header = "<h1>Apache {project} Private Git Repos</h1>";
our @stylesheets = ("/static/gitweb.css");
our $logo = "/static/git-logo.png";
our $favicon = "/static/git-favicon.png";
our $javascript = "/static/gitweb.js";
$feature{{'avatar'}}{{'default'}} = ['gravatar'];
$feature{{'highlight'}}{{'default'}} = [1];
"#,
        root = project_root.display()
    )
}

async fn run_checked(command: &mut Command, label: &str) -> Result<(), OpsError> {
    let output = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await?;
    if output.status.success() {
        return Ok(());
    }
    Err(OpsError::CommandFailed {
        command: label.to_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
    })
}

#[async_trait]
impl GitControl for GitboxControl {
    fn repo_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    async fn provision_private_project(&self, project: &str) -> Result<(), OpsError> {
        let project_dir = self.private_root.join(project);
        if project_dir.is_dir() {
            return Ok(());
        }
        tokio::fs::create_dir_all(&project_dir).await?;
        tokio::fs::write(
            self.httpd_conf_dir.join(format!("htaccess.{project}")),
            htaccess_config(project),
        )
        .await?;
        tracing::info!(project, "provisioned private repository directory");
        run_checked(
            Command::new("/usr/bin/sudo").args(["/usr/sbin/service", "apache2", "graceful"]),
            "apache2 graceful reload",
        )
        .await
    }

    async fn write_project_gitweb(&self, project: &str) -> Result<(), OpsError> {
        let project_dir = self.private_root.join(project);
        tokio::fs::write(
            self.httpd_conf_dir.join(format!("gitweb.{project}.pl")),
            gitweb_config(project, &project_dir),
        )
        .await?;
        Ok(())
    }

    async fn clone_repository(
        &self,
        origin: &str,
        destination: &Path,
        commit_mail: &str,
        title: &str,
    ) -> Result<(), OpsError> {
        run_checked(
            Command::new(&self.clone_tool)
                .arg("-c")
                .arg(commit_mail)
                .arg("-d")
                .arg(title)
                .arg(origin)
                .arg(destination),
            &self.clone_tool.display().to_string(),
        )
        .await
    }

    async fn append_dev_target(&self, repo_path: &Path, issue_mail: &str) -> Result<(), OpsError> {
        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .open(repo_path.join("config"))
            .await?;
        file.write_all(format!("\n[apache]\n    dev = {issue_mail}\n").as_bytes())
            .await?;
        Ok(())
    }
}
