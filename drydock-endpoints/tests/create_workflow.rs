//! End-to-end tests for the repository creation workflow, with every
//! external service stubbed out.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use drydock_core::{
    Config, Credentials, Endpoint, InputMap, Outcome, ServerContext, Session, StoragePool,
};
use drydock_endpoints::{
    DirectoryService, GitControl, HostOutcome, NewRepository, Notifier, OpsError, OutboundMail,
    ProjectRoster, RepoHost, RepositoryEndpoint,
};

struct StubHost {
    outcome: HostOutcome,
    requests: Mutex<Vec<NewRepository>>,
}

impl StubHost {
    fn accepting() -> Arc<Self> {
        Arc::new(Self { outcome: HostOutcome::Created, requests: Mutex::new(Vec::new()) })
    }

    fn rejecting(message: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: HostOutcome::Rejected(message.to_owned()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<NewRepository> {
        match self.requests.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl RepoHost for StubHost {
    async fn create_repository(&self, repo: &NewRepository) -> Result<HostOutcome, OpsError> {
        if let Ok(mut guard) = self.requests.lock() {
            guard.push(repo.clone());
        }
        Ok(self.outcome.clone())
    }
}

struct StubDirectory {
    rosters: HashMap<String, ProjectRoster>,
}

impl StubDirectory {
    fn with_project(project: &str, pmc: &[&str]) -> Arc<Self> {
        let roster = ProjectRoster {
            committers: pmc.iter().map(|&s| s.to_owned()).collect(),
            pmc: pmc.iter().map(|&s| s.to_owned()).collect(),
        };
        let mut rosters = HashMap::new();
        rosters.insert(project.to_owned(), roster);
        Arc::new(Self { rosters })
    }

    fn empty() -> Arc<Self> {
        Arc::new(Self { rosters: HashMap::new() })
    }
}

#[async_trait]
impl DirectoryService for StubDirectory {
    async fn project_roster(&self, project: &str) -> Result<Option<ProjectRoster>, OpsError> {
        Ok(self.rosters.get(project).cloned())
    }
}

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<OutboundMail>>,
}

impl RecordingNotifier {
    fn sent(&self) -> Vec<OutboundMail> {
        match self.sent.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, mail: &OutboundMail) -> Result<(), OpsError> {
        if let Ok(mut guard) = self.sent.lock() {
            guard.push(mail.clone());
        }
        Ok(())
    }
}

#[derive(Default)]
struct StubGit {
    existing: Vec<PathBuf>,
    provision_fails: bool,
    clone_fails: bool,
    provisioned: Mutex<Vec<String>>,
    gitweb_written: Mutex<Vec<String>>,
    cloned: Mutex<Vec<(String, PathBuf, String, String)>>,
    appended: Mutex<Vec<(PathBuf, String)>>,
}

impl StubGit {
    fn provisioned(&self) -> Vec<String> {
        match self.provisioned.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn cloned(&self) -> Vec<(String, PathBuf, String, String)> {
        match self.cloned.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn appended(&self) -> Vec<(PathBuf, String)> {
        match self.appended.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl GitControl for StubGit {
    fn repo_exists(&self, path: &Path) -> bool {
        self.existing.iter().any(|p| p == path)
    }

    async fn provision_private_project(&self, project: &str) -> Result<(), OpsError> {
        if self.provision_fails {
            return Err(OpsError::CommandFailed {
                command: "apache2 graceful reload".to_owned(),
                stderr: "reload refused".to_owned(),
            });
        }
        if let Ok(mut guard) = self.provisioned.lock() {
            guard.push(project.to_owned());
        }
        Ok(())
    }

    async fn write_project_gitweb(&self, project: &str) -> Result<(), OpsError> {
        if let Ok(mut guard) = self.gitweb_written.lock() {
            guard.push(project.to_owned());
        }
        Ok(())
    }

    async fn clone_repository(
        &self,
        origin: &str,
        destination: &Path,
        commit_mail: &str,
        title: &str,
    ) -> Result<(), OpsError> {
        if self.clone_fails {
            return Err(OpsError::CommandFailed {
                command: "gitbox-clone".to_owned(),
                stderr: "remote hung up".to_owned(),
            });
        }
        if let Ok(mut guard) = self.cloned.lock() {
            guard.push((
                origin.to_owned(),
                destination.to_path_buf(),
                commit_mail.to_owned(),
                title.to_owned(),
            ));
        }
        Ok(())
    }

    async fn append_dev_target(&self, repo_path: &Path, issue_mail: &str) -> Result<(), OpsError> {
        if let Ok(mut guard) = self.appended.lock() {
            guard.push((repo_path.to_path_buf(), issue_mail.to_owned()));
        }
        Ok(())
    }
}

async fn test_ctx() -> ServerContext {
    let toml = r#"
[server]
addr = "127.0.0.1:8080"

[database]
path = "sqlite::memory:"

[github]
org = "apache"
token = "ghp_test"

[repos]
public_root = "/x1/repos/asf"
private_root = "/x1/repos/private"

[directory]
roster_path = "/x1/drydock/rosters.json"

[mail]
notify_address = "private@infra.apache.org"
"#;
    let config: Config = match toml::from_str(toml) {
        Ok(c) => c,
        Err(e) => panic!("test config must parse: {e}"),
    };
    let storage = match StoragePool::open("sqlite::memory:").await {
        Ok(p) => p,
        Err(e) => panic!("in-memory pool must open: {e}"),
    };
    ServerContext { config, storage }
}

fn pmc_member() -> Credentials {
    Credentials {
        uid: "humbedooh".to_owned(),
        fullname: "Daniel Gruno".to_owned(),
        email: "humbedooh@apache.org".to_owned(),
        admin: false,
        member: false,
    }
}

fn infra_admin() -> Credentials {
    Credentials { admin: true, ..pmc_member() }
}

fn foundation_member() -> Credentials {
    Credentials { member: true, ..pmc_member() }
}

fn create_input(fields: &[(&str, &str)]) -> InputMap {
    let mut input = InputMap::new();
    input.insert("action".to_owned(), serde_json::Value::String("create".to_owned()));
    for (name, value) in fields {
        input.insert((*name).to_owned(), serde_json::Value::String((*value).to_owned()));
    }
    input
}

fn reply_of(outcome: &Outcome) -> (bool, String) {
    let Outcome::Value(value) = outcome else {
        panic!("expected a value outcome");
    };
    let okay = match value["okay"].as_bool() {
        Some(b) => b,
        None => panic!("reply must carry an okay flag: {value}"),
    };
    let message = match value["message"].as_str() {
        Some(m) => m.to_owned(),
        None => panic!("reply must carry a message: {value}"),
    };
    (okay, message)
}

async fn invoke(
    endpoint: &RepositoryEndpoint,
    ctx: &ServerContext,
    credentials: Option<Credentials>,
    input: &InputMap,
) -> Outcome {
    let mut session = match credentials {
        Some(creds) => Session::authenticated(creds, ctx.storage.lease()),
        None => Session::anonymous(),
    };
    match endpoint.invoke(ctx, &mut session, input).await {
        Ok(outcome) => outcome,
        Err(fault) => panic!("invocation must not fault: {fault}"),
    }
}

#[tokio::test]
async fn anonymous_caller_is_asked_to_log_in() {
    let ctx = test_ctx().await;
    let endpoint = RepositoryEndpoint::new(
        StubHost::accepting(),
        StubDirectory::empty(),
        Arc::new(RecordingNotifier::default()),
        Arc::new(StubGit::default()),
    );
    let outcome = invoke(&endpoint, &ctx, None, &create_input(&[])).await;
    let (okay, message) = reply_of(&outcome);
    assert!(!okay);
    assert_eq!(message, "You need to be logged in to access this end point");
}

#[tokio::test]
async fn unknown_action_yields_empty_content() {
    let ctx = test_ctx().await;
    let endpoint = RepositoryEndpoint::new(
        StubHost::accepting(),
        StubDirectory::empty(),
        Arc::new(RecordingNotifier::default()),
        Arc::new(StubGit::default()),
    );
    let mut input = InputMap::new();
    input.insert("action".to_owned(), serde_json::Value::String("destroy".to_owned()));
    let outcome = invoke(&endpoint, &ctx, Some(infra_admin()), &input).await;
    assert_eq!(outcome, Outcome::Value(serde_json::Value::Null));
}

#[tokio::test]
async fn malformed_repository_name_is_refused() {
    let ctx = test_ctx().await;
    let endpoint = RepositoryEndpoint::new(
        StubHost::accepting(),
        StubDirectory::empty(),
        Arc::new(RecordingNotifier::default()),
        Arc::new(StubGit::default()),
    );
    for name in ["foo", "Foo.git", "foo_bar.git", ""] {
        let outcome =
            invoke(&endpoint, &ctx, Some(infra_admin()), &create_input(&[("repository", name)]))
                .await;
        let (okay, message) = reply_of(&outcome);
        assert!(!okay, "name {name:?} must be refused");
        assert_eq!(message, "Invalid repository name specified");
    }
}

#[tokio::test]
async fn unknown_project_prefix_is_refused() {
    let ctx = test_ctx().await;
    let endpoint = RepositoryEndpoint::new(
        StubHost::accepting(),
        StubDirectory::empty(),
        Arc::new(RecordingNotifier::default()),
        Arc::new(StubGit::default()),
    );
    let outcome = invoke(
        &endpoint,
        &ctx,
        Some(pmc_member()),
        &create_input(&[("repository", "ghost-site.git")]),
    )
    .await;
    let (okay, message) = reply_of(&outcome);
    assert!(!okay);
    assert_eq!(message, "Invalid project prefix 'ghost' specified");
}

#[tokio::test]
async fn non_pmc_caller_is_refused() {
    let ctx = test_ctx().await;
    let endpoint = RepositoryEndpoint::new(
        StubHost::accepting(),
        StubDirectory::with_project("foo", &["someone-else"]),
        Arc::new(RecordingNotifier::default()),
        Arc::new(StubGit::default()),
    );
    let outcome = invoke(
        &endpoint,
        &ctx,
        Some(pmc_member()),
        &create_input(&[("repository", "foo-site.git")]),
    )
    .await;
    let (okay, message) = reply_of(&outcome);
    assert!(!okay);
    assert_eq!(message, "Only (I)PMC members of this project may create repositories");
}

#[tokio::test]
async fn pmc_member_creates_a_public_repository() {
    let ctx = test_ctx().await;
    let host = StubHost::accepting();
    let notifier = Arc::new(RecordingNotifier::default());
    let git = Arc::new(StubGit::default());
    let endpoint = RepositoryEndpoint::new(
        Arc::clone(&host) as Arc<dyn RepoHost>,
        StubDirectory::with_project("foo", &["humbedooh"]),
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        Arc::clone(&git) as Arc<dyn GitControl>,
    );
    let outcome = invoke(
        &endpoint,
        &ctx,
        Some(pmc_member()),
        &create_input(&[("repository", "foo-site.git")]),
    )
    .await;
    let (okay, message) = reply_of(&outcome);
    assert!(okay, "creation must succeed: {message}");
    assert_eq!(message, "Repository created!");

    let requests = host.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].name, "foo-site.git");
    assert_eq!(requests[0].description, "Apache foo");
    assert_eq!(requests[0].homepage, "https://foo.apache.org/");
    assert!(!requests[0].private);

    let cloned = git.cloned();
    assert_eq!(cloned.len(), 1);
    let (origin, destination, commit_mail, title) = &cloned[0];
    assert_eq!(origin, "git@github:apache/foo-site.git");
    assert_eq!(destination, &PathBuf::from("/x1/repos/asf/foo-site.git"));
    assert_eq!(commit_mail, "commits@foo.apache.org");
    assert_eq!(title, "Apache foo");

    let appended = git.appended();
    assert_eq!(appended.len(), 1);
    assert_eq!(appended[0].1, "dev@foo.apache.org");

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "New GitBox/GitHub repository set up: foo-site.git");
    assert_eq!(
        sent[0].recipients,
        vec!["private@infra.apache.org".to_owned(), "private@foo.apache.org".to_owned()]
    );
    assert!(sent[0].body.contains("GitBox: https://gitbox.apache.org/repos/asf/foo-site.git"));
    assert!(sent[0].body.contains("GitHub: https://github.com/apache/foo-site.git"));
}

#[tokio::test]
async fn custom_mail_targets_and_title_are_respected() {
    let ctx = test_ctx().await;
    let git = Arc::new(StubGit::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let endpoint = RepositoryEndpoint::new(
        StubHost::accepting(),
        StubDirectory::empty(),
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        Arc::clone(&git) as Arc<dyn GitControl>,
    );
    let outcome = invoke(
        &endpoint,
        &ctx,
        Some(infra_admin()),
        &create_input(&[
            ("repository", "foo-site.git"),
            ("title", "Apache Foo Website"),
            ("commit", "cvs@foo.apache.org"),
            ("issue", "issues@foo.apache.org"),
        ]),
    )
    .await;
    let (okay, _) = reply_of(&outcome);
    assert!(okay);
    let cloned = git.cloned();
    assert_eq!(cloned[0].2, "cvs@foo.apache.org");
    assert_eq!(cloned[0].3, "Apache Foo Website");
    assert_eq!(git.appended()[0].1, "issues@foo.apache.org");
    assert!(notifier.sent()[0].body.contains("Commit mail target: cvs@foo.apache.org"));
}

#[tokio::test]
async fn foundation_member_may_create_exec_project_repos() {
    let ctx = test_ctx().await;
    let git = Arc::new(StubGit::default());
    let endpoint = RepositoryEndpoint::new(
        StubHost::accepting(),
        StubDirectory::empty(),
        Arc::new(RecordingNotifier::default()),
        Arc::clone(&git) as Arc<dyn GitControl>,
    );
    let outcome = invoke(
        &endpoint,
        &ctx,
        Some(foundation_member()),
        &create_input(&[("repository", "board-site.git")]),
    )
    .await;
    let (okay, message) = reply_of(&outcome);
    assert!(okay, "exec project creation must skip the roster gate: {message}");
}

#[tokio::test]
async fn existing_repository_is_refused() {
    let ctx = test_ctx().await;
    let git = Arc::new(StubGit {
        existing: vec![PathBuf::from("/x1/repos/asf/foo-site.git")],
        ..StubGit::default()
    });
    let endpoint = RepositoryEndpoint::new(
        StubHost::accepting(),
        StubDirectory::empty(),
        Arc::new(RecordingNotifier::default()),
        Arc::clone(&git) as Arc<dyn GitControl>,
    );
    let outcome = invoke(
        &endpoint,
        &ctx,
        Some(infra_admin()),
        &create_input(&[("repository", "foo-site.git")]),
    )
    .await;
    let (okay, message) = reply_of(&outcome);
    assert!(!okay);
    assert_eq!(message, "A repository by that name already exists");
    assert!(git.cloned().is_empty(), "nothing is cloned for a refused request");
}

#[tokio::test]
async fn private_repository_requires_infrastructure_staff() {
    let ctx = test_ctx().await;
    let endpoint = RepositoryEndpoint::new(
        StubHost::accepting(),
        StubDirectory::with_project("foo", &["humbedooh"]),
        Arc::new(RecordingNotifier::default()),
        Arc::new(StubGit::default()),
    );
    let outcome = invoke(
        &endpoint,
        &ctx,
        Some(pmc_member()),
        &create_input(&[("repository", "foo-site.git"), ("private", "true")]),
    )
    .await;
    let (okay, message) = reply_of(&outcome);
    assert!(!okay);
    assert_eq!(message, "Private repositories can only be created by Infrastructure staff");
}

#[tokio::test]
async fn admin_creates_a_private_repository() {
    let ctx = test_ctx().await;
    let host = StubHost::accepting();
    let notifier = Arc::new(RecordingNotifier::default());
    let git = Arc::new(StubGit::default());
    let endpoint = RepositoryEndpoint::new(
        Arc::clone(&host) as Arc<dyn RepoHost>,
        StubDirectory::empty(),
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        Arc::clone(&git) as Arc<dyn GitControl>,
    );
    let outcome = invoke(
        &endpoint,
        &ctx,
        Some(infra_admin()),
        &create_input(&[("repository", "foo-secrets.git"), ("private", "true")]),
    )
    .await;
    let (okay, message) = reply_of(&outcome);
    assert!(okay, "private creation must succeed: {message}");

    assert_eq!(git.provisioned(), vec!["foo".to_owned()]);
    assert!(host.requests()[0].private);
    let cloned = git.cloned();
    assert_eq!(cloned[0].1, PathBuf::from("/x1/repos/private/foo/foo-secrets.git"));
    assert!(notifier.sent()[0]
        .body
        .contains("GitBox: https://gitbox.apache.org/repos/private/foo/foo-secrets.git"));
}

#[tokio::test]
async fn failed_provisioning_reports_the_security_control_error() {
    let ctx = test_ctx().await;
    let git = Arc::new(StubGit { provision_fails: true, ..StubGit::default() });
    let endpoint = RepositoryEndpoint::new(
        StubHost::accepting(),
        StubDirectory::empty(),
        Arc::new(RecordingNotifier::default()),
        Arc::clone(&git) as Arc<dyn GitControl>,
    );
    let outcome = invoke(
        &endpoint,
        &ctx,
        Some(infra_admin()),
        &create_input(&[("repository", "foo-secrets.git"), ("private", "true")]),
    )
    .await;
    let (okay, message) = reply_of(&outcome);
    assert!(!okay);
    assert_eq!(message, "Could not apply pre-create security controls: reload refused");
}

#[tokio::test]
async fn host_rejection_is_passed_to_the_requester() {
    let ctx = test_ctx().await;
    let notifier = Arc::new(RecordingNotifier::default());
    let endpoint = RepositoryEndpoint::new(
        StubHost::rejecting("name already exists on this account"),
        StubDirectory::empty(),
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        Arc::new(StubGit::default()),
    );
    let outcome = invoke(
        &endpoint,
        &ctx,
        Some(infra_admin()),
        &create_input(&[("repository", "foo-site.git")]),
    )
    .await;
    let (okay, message) = reply_of(&outcome);
    assert!(!okay);
    assert_eq!(message, "name already exists on this account");
    assert!(notifier.sent().is_empty(), "no mail for a rejected request");
}

#[tokio::test]
async fn failed_clone_reports_the_helper_stderr() {
    let ctx = test_ctx().await;
    let git = Arc::new(StubGit { clone_fails: true, ..StubGit::default() });
    let endpoint = RepositoryEndpoint::new(
        StubHost::accepting(),
        StubDirectory::empty(),
        Arc::new(RecordingNotifier::default()),
        Arc::clone(&git) as Arc<dyn GitControl>,
    );
    let outcome = invoke(
        &endpoint,
        &ctx,
        Some(infra_admin()),
        &create_input(&[("repository", "foo-site.git")]),
    )
    .await;
    let (okay, message) = reply_of(&outcome);
    assert!(!okay);
    assert_eq!(message, "remote hung up");
    assert!(git.appended().is_empty(), "no config append after a failed clone");
}
