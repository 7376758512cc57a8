//! Errors raised by endpoint collaborators.

/// Failures from the services an endpoint drives: the GitHub API,
/// local git plumbing, the roster directory and outbound mail.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum OpsError {
    /// An HTTP request to the hosting API failed outright.
    #[error("hosting API request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A local helper command exited nonzero.
    #[error("{command} failed: {stderr}")]
    CommandFailed {
        /// The command that was run.
        command: String,
        /// Its stderr output, trimmed.
        stderr: String,
    },

    /// The roster file is not valid JSON.
    #[error("roster parse failed: {0}")]
    RosterParse(#[from] serde_json::Error),

    /// Mail handoff to the delivery agent failed.
    #[error("mail delivery failed: {0}")]
    Mail(String),

    /// A filesystem operation failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
