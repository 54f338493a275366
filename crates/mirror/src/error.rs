//! Errors that callers need to tell apart from generic I/O failures

/// Conditions with a defined meaning for the caller.
///
/// These travel inside `anyhow::Error`; use `downcast_ref::<MirrorError>()`
/// to recognise them.
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    /// The archive mailbox is not in the server's mailbox listing
    #[error("Mailbox '{archive}' not found on the server")]
    ArchiveMissing { archive: String },

    /// The server rejected the login
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The user interrupted the run
    #[error("Interrupted")]
    Cancelled,
}

/// Check whether an error chain was caused by cancellation
pub fn is_cancelled(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<MirrorError>(), Some(MirrorError::Cancelled))
}
