//! Repochat engine: HTTP and event-stream IO against the ingestion backend.
mod backend;
mod engine;
mod sse;
mod types;

pub use backend::{Backend, BackendSettings, ChatTuning, FrameSink, ReqwestBackend, StreamEnd};
pub use engine::{EngineError, EngineHandle};
pub use sse::SseDecoder;
pub use types::{
    ChatReply, ChatRequest, ClientError, EngineEvent, FailureKind, ProjectEntry, SessionId,
    SubscriptionId,
};
