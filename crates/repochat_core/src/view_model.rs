use crate::{ChatMessage, IngestionJob, Project, SessionId};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub directory: DirectoryView,
    pub ingestion: IngestionView,
    pub chats: Vec<ChatView>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirectoryView {
    pub projects: Vec<Project>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IngestionView {
    pub job: IngestionJob,
    pub feedback: Option<String>,
    pub subscription_open: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatView {
    pub project: String,
    pub session: SessionId,
    pub transcript: Vec<ChatMessage>,
    pub pending: bool,
    pub notice: Option<String>,
}
