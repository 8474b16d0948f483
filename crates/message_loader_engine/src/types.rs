use std::fmt;

use message_loader_core::{MessagesEmptyError, TaskUrlMismatchError};

use crate::DecodeError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: Vec<u8>,
    pub metadata: FetchMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub original_url: String,
    pub final_url: String,
    pub redirect_count: usize,
    pub content_type: Option<String>,
    pub byte_len: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("fetching {url} failed ({kind}): {message}")]
pub struct FetchError {
    pub url: String,
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(url: impl Into<String>, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Why one fetch task failed. The elements under its URL are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("decoding messages from {url} failed: {source}")]
    Decode { url: String, source: DecodeError },
    #[error(transparent)]
    MessagesEmpty(#[from] MessagesEmptyError),
    #[error(transparent)]
    UrlMismatch(#[from] TaskUrlMismatchError),
}

impl TaskError {
    pub fn url(&self) -> &str {
        match self {
            TaskError::Fetch(err) => &err.url,
            TaskError::Decode { url, .. } => url,
            TaskError::MessagesEmpty(err) => &err.url,
            TaskError::UrlMismatch(err) => &err.expected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSuccess {
    /// Number of independent draws made.
    pub groups: usize,
    /// Number of elements written.
    pub elements: usize,
    /// Size of the message pool drawn from.
    pub messages: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub url: String,
    pub result: Result<TaskSuccess, TaskError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderEvent {
    /// The document was ready and grouping finished.
    Started { urls: usize, elements: usize },
    TaskSettled(TaskOutcome),
    /// Every task has settled. Emitted exactly once per run.
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoaderError {
    #[error("document was dropped before it finished loading")]
    DocumentAbandoned,
    #[error("marker attribute {attribute:?} is not usable in a selector: {message}")]
    InvalidMarker { attribute: String, message: String },
}
