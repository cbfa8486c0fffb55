use thiserror::Error;

use crate::messaging::MessagingError;

/// Why a panel workflow ended in the Error state.
/// The `Display` text is what the panel shows in its output area.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Required profile fields are empty. Detected before any message is sent.
    #[error("{0}")]
    Validation(String),

    /// No active tab, or the page could not answer.
    #[error("{0}")]
    AgentUnavailable(String),

    /// The orchestrator reported a backend failure; the message is the gateway's, verbatim.
    #[error("{0}")]
    Remote(String),

    /// The content agent reached the page but could not write the value,
    /// e.g. the described field disappeared after it was read.
    #[error("{0}")]
    WriteFailed(String),

    #[error("Mapping successful ({path}), but no value found in resume data.")]
    Resolution { path: String },

    #[error("Another workflow is already running")]
    Busy,

    #[error("Messaging error: {0}")]
    Messaging(#[from] MessagingError),
}
