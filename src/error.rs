// ⚠️ Error Types - one enum per boundary
// Orchestration code wraps these in anyhow with context; callers that need
// to branch (retry, skip, abort) match on the variants here.

use thiserror::Error;

// ============================================================================
// DIRECTORY ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The service asked us to slow down. Retried by `RetryPolicy`.
    #[error("Rate limit exceeded: {message}")]
    RateLimited { message: String },

    /// No person with this id exists in the directory
    #[error("Person {id} not found")]
    NotFound { id: String },

    /// Any other 4xx/5xx answer from the service
    #[error("Directory request failed with status {status}: {message}")]
    Client { status: u16, message: String },

    /// The request never got an answer (DNS, TLS, timeout...)
    #[error("Directory transport error: {0}")]
    Transport(String),

    /// The answer was not the JSON:API document we expected
    #[error("Unexpected directory response: {0}")]
    Decode(String),

    /// A retry cap was configured and every attempt was rate limited
    #[error("Still rate limited after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },
}

impl DirectoryError {
    /// Build the error for a non-success HTTP answer.
    ///
    /// The service signals overload with a 429 and a body mentioning
    /// "Rate limit exceeded"; either is enough to classify it as retryable.
    pub fn from_status(status: u16, body: String) -> Self {
        if status == 429 || body.contains("Rate limit exceeded") {
            DirectoryError::RateLimited { message: body }
        } else {
            DirectoryError::Client {
                status,
                message: body,
            }
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, DirectoryError::RateLimited { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DirectoryError::NotFound { .. })
    }
}

impl From<reqwest::Error> for DirectoryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DirectoryError::Decode(err.to_string())
        } else {
            DirectoryError::Transport(err.to_string())
        }
    }
}

// ============================================================================
// RESOLUTION ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ResolveError {
    /// The operator picked an index outside the candidate list
    #[error("Selection {index} is out of range (0..{count})")]
    InvalidSelection { index: usize, count: usize },

    /// The operator's answer could not be read as what was asked for
    #[error("Could not understand input {0:?}")]
    MalformedInput(String),

    /// Input closed while we were waiting for an answer
    #[error("Input closed while waiting for an answer")]
    InputClosed,

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error("Console I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// UPLOAD (PRE-FLIGHT) ERRORS
// ============================================================================

#[derive(Debug, Error, PartialEq)]
pub enum UploadError {
    #[error("{mentors} for {name} does not appear to be a valid mentor.")]
    UnknownMentor { name: String, mentors: String },

    #[error("{session} for {name} does not appear to be a valid class session.")]
    UnknownSession { name: String, session: String },
}

// ============================================================================
// CONFIGURATION ERRORS
// ============================================================================

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{0} is required for this command")]
    Missing(&'static str),
}
