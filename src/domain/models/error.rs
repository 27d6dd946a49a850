use thiserror::Error;

/// Input problems caught before any request is made. None of these mutate
/// state.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a query or upload an image")]
    EmptySearch,

    #[error("Please select or create a session")]
    NoSession,

    #[error("Please enter a message or upload an image")]
    EmptyFollowUp,

    #[error("File {name} is too large (max 10MB)")]
    ImageTooLarge { name: String, size: usize },

    #[error("File {name} was rejected: {reason}")]
    ImageRejected { name: String, reason: String },

    #[error("{0} is already in progress")]
    Busy(String),

    #[error("Open a follow-up conversation first")]
    ConversationClosed,

    #[error("There is no response to work with yet")]
    NoResponse,

    #[error("Alternative approaches are not available for this result")]
    AlternativesUnavailable,

    #[error("{0} is not an alternative approach. Use optimized, simplified or different")]
    UnsupportedApproach(String),

    #[error("No code to copy")]
    NoCode,

    #[error("{0} is out of bounds.")]
    OutOfBounds(usize),
}

/// Failures reported by the backend itself.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Unauthorized, please log in again with `codequest login`")]
    Unauthorized,

    #[error("Request to {path} failed with status {status}: {detail}")]
    Status {
        path: String,
        status: u16,
        detail: String,
    },

    #[error("Could not reach {url}: {reason}")]
    Transport { url: String, reason: String },
}

impl ApiError {
    pub fn is_unauthorized(err: &anyhow::Error) -> bool {
        return matches!(err.downcast_ref::<ApiError>(), Some(ApiError::Unauthorized));
    }

    pub fn is_not_found(err: &anyhow::Error) -> bool {
        return matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::Status { status: 404, .. })
        );
    }
}
