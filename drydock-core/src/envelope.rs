//! Fault envelope: correlates an opaque client-visible failure with
//! its full detail in the operational log.

use uuid::Uuid;

use crate::endpoint::EndpointFault;

/// Length of the short error id included in opaque failure responses.
const ERROR_ID_LEN: usize = 18;

/// A failed handler invocation, flattened to loggable lines.
///
/// In the disclosure mode the detail is returned to the caller and
/// nothing is logged; in the opaque mode every line goes to the log
/// prefixed with `id` and the caller sees only the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEnvelope {
    /// Short unique token correlating the response with the log.
    pub id: String,
    /// One line per error in the fault's source chain.
    pub detail: Vec<String>,
}

impl ErrorEnvelope {
    /// Build an envelope from a fault, walking its source chain.
    #[must_use]
    pub fn from_fault(fault: &EndpointFault) -> Self {
        let mut detail = vec![fault.to_string()];
        let mut source = fault.source();
        while let Some(cause) = source {
            detail.push(format!("caused by: {cause}"));
            source = cause.source();
        }
        Self { id: short_id(), detail }
    }

    /// The detail as a single block of text, one line per entry.
    ///
    /// This is exactly the text the opaque mode writes to the log,
    /// minus the id prefixes.
    #[must_use]
    pub fn detail_text(&self) -> String {
        self.detail.join("\n")
    }

    /// The detail formatted for the operational log, every line
    /// prefixed with the envelope id so interleaved reports from
    /// concurrent requests can be reassembled.
    #[must_use]
    pub fn log_lines(&self) -> Vec<String> {
        self.detail
            .iter()
            .map(|line| format!("{}: {line}", self.id))
            .collect()
    }
}

/// A fresh short unique token.
fn short_id() -> String {
    let mut id = Uuid::new_v4().to_string();
    id.truncate(ERROR_ID_LEN);
    id
}
