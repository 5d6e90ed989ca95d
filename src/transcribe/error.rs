use thiserror::Error;

/// Coarse failure class used by the retry policy to decide whether an
/// attempt is worth repeating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// The request itself is malformed; retrying cannot help.
    BadRequest,
    /// Network or service transport failure; typically transient.
    Transport,
    /// Reading from the audio source failed.
    Io,
    /// A consumer requested non-positive demand.
    InvalidDemand,
    /// Anything that does not fit the classes above.
    Internal,
}

/// Error surface for one logical transcription.
#[derive(Debug, Error)]
pub enum TranscribeError {
    #[error("malformed transcription request: {0}")]
    BadRequest(String),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("audio read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("demand must be positive, got {0}")]
    InvalidDemand(i64),

    #[error("internal failure: {0}")]
    Internal(String),
}

impl TranscribeError {
    pub fn class(&self) -> ErrorClass {
        match self {
            TranscribeError::BadRequest(_) => ErrorClass::BadRequest,
            TranscribeError::Transport(_) => ErrorClass::Transport,
            TranscribeError::Io(_) => ErrorClass::Io,
            TranscribeError::InvalidDemand(_) => ErrorClass::InvalidDemand,
            TranscribeError::Internal(_) => ErrorClass::Internal,
        }
    }
}
