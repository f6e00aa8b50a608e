use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type SubscriptionId = u64;
pub type SessionId = u64;

/// Everything the engine reports back to the client loop, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    ProjectsFetched(Result<Vec<ProjectEntry>, ClientError>),
    ChatAnswered {
        session: SessionId,
        result: Result<ChatReply, ClientError>,
    },
    StreamFrame {
        subscription: SubscriptionId,
        raw: String,
    },
    StreamFailed {
        subscription: SubscriptionId,
        error: ClientError,
    },
    StreamEnded {
        subscription: SubscriptionId,
    },
}

/// One element of `GET /projectslist`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProjectEntry {
    pub name: String,
}

/// Body of `POST /chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub query: String,
    pub project_name: String,
}

/// Reply of `POST /chat`. Both fields may be missing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ClientError {
    pub kind: FailureKind,
    pub message: String,
}

impl ClientError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
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
    Decode,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Decode => write!(f, "malformed response"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
