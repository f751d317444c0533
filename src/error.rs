//! Error types for the assistant core.

/// Top-level error type for the assistant.
///
/// Most of these never reach the user directly: collaborator boundaries
/// convert them to spoken/displayed sentences. Only persistence failures on
/// save propagate to callers.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    /// Profile or transcript could not be written (or read, where fatal).
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Remote dialogue or weather backend failure.
    #[error("backend error: {0}")]
    Backend(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AssistantError>;
