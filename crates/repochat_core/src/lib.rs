//! Repochat core: pure state machines for the ingestion stream, chat sessions
//! and the project directory, plus view-model helpers.
mod chat;
mod directory;
mod effect;
mod frame;
mod ingestion;
mod msg;
mod state;
mod update;
mod view_model;

pub use chat::{
    greeting, ChatMessage, ChatSession, Sender, SessionId, CHAT_FAILURE_NOTICE,
    CHAT_FALLBACK_TEXT, EMPTY_QUERY_NOTICE,
};
pub use directory::{Project, ProjectDirectory};
pub use effect::{Effect, Transition};
pub use frame::{FrameError, ProgressFrame, FRAME_MARKER};
pub use ingestion::{
    IngestionJob, JobState, ProgressStream, SubscriptionId, INVALID_URL_FEEDBACK,
    STARTING_STATUS, STREAM_FAILURE_STATUS, SUCCESS_FEEDBACK,
};
pub use msg::Msg;
pub use state::AppState;
pub use update::update;
pub use view_model::{AppViewModel, ChatView, DirectoryView, IngestionView};
