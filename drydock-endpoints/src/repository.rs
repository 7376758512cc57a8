//! The repository self-service endpoint: validates a creation
//! request, runs the membership gates, creates the remote repository
//! and wires up the local clone.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;

use drydock_core::{Config, Endpoint, EndpointFault, InputMap, Outcome, ServerContext, Session};

use crate::directory::{DirectoryService, RosterDirectory};
use crate::error::OpsError;
use crate::github::{GithubClient, HostOutcome, NewRepository, RepoHost};
use crate::gitbox::{GitControl, GitboxControl};
use crate::notify::{Notifier, OutboundMail, SendmailNotifier};

/// Accepted repository names: an optional `incubator-` prefix, the
/// project name, an optional suffix, and the `.git` extension.
/// `httpd.git` and `sling-foo.git` both pass; the project is the
/// first group.
static REPO_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:incubator-)?([a-z0-9]+)(-[-0-9a-z]+)?\.git$")
        .expect("static pattern compiles")
});

/// The `/api/repository` endpoint.
pub struct RepositoryEndpoint {
    host: Arc<dyn RepoHost>,
    directory: Arc<dyn DirectoryService>,
    notifier: Arc<dyn Notifier>,
    git: Arc<dyn GitControl>,
}

impl RepositoryEndpoint {
    /// Assemble the endpoint from explicit collaborators.
    #[must_use]
    pub fn new(
        host: Arc<dyn RepoHost>,
        directory: Arc<dyn DirectoryService>,
        notifier: Arc<dyn Notifier>,
        git: Arc<dyn GitControl>,
    ) -> Self {
        Self { host, directory, notifier, git }
    }

    /// Assemble the production endpoint from configuration.
    ///
    /// # Errors
    /// Returns [`OpsError::Http`] if the hosting API client cannot be
    /// built.
    pub fn from_config(config: &Config) -> Result<Self, OpsError> {
        Ok(Self::new(
            Arc::new(GithubClient::new(&config.github)?),
            Arc::new(RosterDirectory::new(config.directory.roster_path.clone())),
            Arc::new(SendmailNotifier::new(config.mail.sendmail_path.clone())),
            Arc::new(GitboxControl::from_section(&config.repos)),
        ))
    }

    async fn create(
        &self,
        ctx: &ServerContext,
        credentials: &drydock_core::Credentials,
        input: &InputMap,
    ) -> Result<Outcome, EndpointFault> {
        let reponame = field(input, "repository").unwrap_or_default().to_owned();
        let Some(captures) = REPO_NAME.captures(&reponame) else {
            return Ok(Outcome::reply(false, "Invalid repository name specified"));
        };
        let project = captures[1].to_owned();
        let private = flag(input, "private");
        let title = field(input, "title")
            .map_or_else(|| format!("Apache {project}"), str::to_owned);

        // Infrastructure staff skip the membership gate, as do
        // foundation members for the executive projects.
        let exec_member = credentials.member
            && ctx.config.directory.exec_projects.iter().any(|p| p == &project);
        if !credentials.admin && !exec_member {
            let roster = self.directory.project_roster(&project).await?;
            let pmc = roster.map(|r| r.pmc).unwrap_or_default();
            if pmc.is_empty() {
                return Ok(Outcome::reply(
                    false,
                    format!("Invalid project prefix '{project}' specified"),
                ));
            }
            if !pmc.contains(&credentials.uid) {
                return Ok(Outcome::reply(
                    false,
                    "Only (I)PMC members of this project may create repositories",
                ));
            }
        }

        let org = &ctx.config.github.org;
        let repourl_gh = format!("https://github.com/{org}/{reponame}");
        let mut repourl_gb = format!("https://gitbox.apache.org/repos/asf/{reponame}");

        let repo_path = if private {
            if !credentials.admin {
                return Ok(Outcome::reply(
                    false,
                    "Private repositories can only be created by Infrastructure staff",
                ));
            }
            repourl_gb = format!("https://gitbox.apache.org/repos/private/{project}/{reponame}");
            if let Err(error) = self.git.provision_private_project(&project).await {
                if let OpsError::CommandFailed { stderr, .. } = error {
                    return Ok(Outcome::reply(
                        false,
                        format!("Could not apply pre-create security controls: {stderr}"),
                    ));
                }
                return Err(error.into());
            }
            ctx.config.repos.private_root.join(&project).join(&reponame)
        } else {
            ctx.config.repos.public_root.join(&reponame)
        };
        if self.git.repo_exists(&repo_path) {
            return Ok(Outcome::reply(false, "A repository by that name already exists"));
        }

        let commit_mail = field(input, "commit")
            .map_or_else(|| format!("commits@{project}.apache.org"), str::to_owned);
        let issue_mail = field(input, "issue")
            .map_or_else(|| format!("dev@{project}.apache.org"), str::to_owned);

        if private {
            self.git.write_project_gitweb(&project).await?;
        }

        let request = NewRepository {
            name: reponame.clone(),
            description: title.clone(),
            homepage: format!("https://{project}.apache.org/"),
            private,
        };
        if let HostOutcome::Rejected(message) = self.host.create_repository(&request).await? {
            return Ok(Outcome::reply(false, message));
        }

        let origin = format!("git@github:{org}/{reponame}");
        if let Err(error) = self
            .git
            .clone_repository(&origin, &repo_path, &commit_mail, &title)
            .await
        {
            if let OpsError::CommandFailed { stderr, .. } = error {
                return Ok(Outcome::reply(false, stderr));
            }
            return Err(error.into());
        }
        self.git.append_dev_target(&repo_path, &issue_mail).await?;

        let mail = OutboundMail {
            sender: ctx.config.mail.sender.clone(),
            recipients: vec![
                ctx.config.mail.notify_address.clone(),
                format!("private@{project}.apache.org"),
            ],
            subject: format!("New GitBox/GitHub repository set up: {reponame}"),
            body: notification_body(
                &credentials.uid,
                &reponame,
                &commit_mail,
                &issue_mail,
                &repourl_gb,
                &repourl_gh,
            ),
        };
        self.notifier.send(&mail).await?;

        Ok(Outcome::reply(true, "Repository created!"))
    }
}

#[async_trait]
impl Endpoint for RepositoryEndpoint {
    async fn invoke(
        &self,
        ctx: &ServerContext,
        session: &mut Session,
        input: &InputMap,
    ) -> Result<Outcome, EndpointFault> {
        let Some(credentials) = session.credentials.clone() else {
            return Ok(Outcome::reply(false, "You need to be logged in to access this end point"));
        };
        match field(input, "action") {
            Some("create") => self.create(ctx, &credentials, input).await,
            _ => Ok(Outcome::Value(serde_json::Value::Null)),
        }
    }
}

fn notification_body(
    uid: &str,
    reponame: &str,
    commit_mail: &str,
    issue_mail: &str,
    repourl_gb: &str,
    repourl_gh: &str,
) -> String {
    format!(
        "\nA new repository has been set up by {uid}@apache.org: {reponame}\n\
         \n\
         Commit mail target: {commit_mail}\n\
         Dev/issue mail target: {issue_mail}\n\
         \n\
         The repository can be found at:\n\
         GitBox: {repourl_gb}\n\
         GitHub: {repourl_gh}\n\
         \n\
         With regards,\n\
         Drydock Git Management Services\n"
    )
}

fn field<'a>(input: &'a InputMap, name: &str) -> Option<&'a str> {
    input.get(name).and_then(serde_json::Value::as_str)
}

fn flag(input: &InputMap, name: &str) -> bool {
    match input.get(name) {
        Some(serde_json::Value::Bool(b)) => *b,
        Some(serde_json::Value::String(s)) => matches!(s.as_str(), "true" | "1" | "yes"),
        _ => false,
    }
}
