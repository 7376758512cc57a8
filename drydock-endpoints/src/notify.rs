//! Outbound notification mail, handed to a local delivery agent.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt as _;
use tokio::process::Command;

use crate::error::OpsError;

/// One notification message, ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMail {
    pub sender: String,
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

impl OutboundMail {
    /// Render the message with headers, as handed to the delivery
    /// agent's stdin.
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "From: {}\r\nTo: {}\r\nSubject: {}\r\n\r\n{}",
            self.sender,
            self.recipients.join(", "),
            self.subject,
            self.body
        )
    }
}

/// Sends notification mail.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message.
    ///
    /// # Errors
    /// Returns [`OpsError::Mail`] if the delivery agent cannot be run
    /// or exits nonzero.
    async fn send(&self, mail: &OutboundMail) -> Result<(), OpsError>;
}

/// Notifier piping messages to a sendmail-compatible delivery agent.
pub struct SendmailNotifier {
    sendmail_path: PathBuf,
}

impl SendmailNotifier {
    #[must_use]
    pub fn new(sendmail_path: PathBuf) -> Self {
        Self { sendmail_path }
    }
}

#[async_trait]
impl Notifier for SendmailNotifier {
    async fn send(&self, mail: &OutboundMail) -> Result<(), OpsError> {
        let mut child = Command::new(&self.sendmail_path)
            .arg("-i")
            .args(&mail.recipients)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| OpsError::Mail(format!("cannot run delivery agent: {e}")))?;

        if let Some(stdin) = child.stdin.as_mut() {
            stdin
                .write_all(mail.render().as_bytes())
                .await
                .map_err(|e| OpsError::Mail(format!("cannot write to delivery agent: {e}")))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| OpsError::Mail(format!("delivery agent did not finish: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
            return Err(OpsError::Mail(stderr));
        }
        tracing::info!(subject = %mail.subject, "notification mail delivered");
        Ok(())
    }
}
