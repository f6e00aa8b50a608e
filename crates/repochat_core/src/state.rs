use std::collections::BTreeMap;

use crate::view_model::{AppViewModel, ChatView, DirectoryView, IngestionView};
use crate::{ChatSession, ProgressStream, ProjectDirectory, SessionId, Transition};

/// Aggregate client state. Each component exclusively owns its entity; the
/// only cross-component link is the refresh request raised by the stream.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    pub(crate) directory: ProjectDirectory,
    pub(crate) ingestion: ProgressStream,
    chats: BTreeMap<String, ChatSession>,
    last_session: SessionId,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            directory: DirectoryView {
                projects: self.directory.projects().to_vec(),
                loading: self.directory.is_loading(),
                error: self.directory.error().map(ToOwned::to_owned),
            },
            ingestion: IngestionView {
                job: self.ingestion.job().clone(),
                feedback: self.ingestion.feedback().map(ToOwned::to_owned),
                subscription_open: self.ingestion.subscription().is_some(),
            },
            chats: self
                .chats
                .values()
                .map(|chat| ChatView {
                    project: chat.project().to_string(),
                    session: chat.id(),
                    transcript: chat.transcript().to_vec(),
                    pending: chat.is_pending(),
                    notice: chat.notice().map(ToOwned::to_owned),
                })
                .collect(),
            dirty: self.dirty,
        }
    }

    pub fn directory(&self) -> &ProjectDirectory {
        &self.directory
    }

    pub fn ingestion(&self) -> &ProgressStream {
        &self.ingestion
    }

    pub fn chat(&self, project: &str) -> Option<&ChatSession> {
        self.chats.get(project)
    }

    /// Returns whether anything observable changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Opens a project view if it is not open yet.
    pub(crate) fn open_chat(&mut self, project: &str) -> Transition {
        if self.chats.contains_key(project) {
            return Transition::unchanged();
        }
        self.last_session += 1;
        let session = ChatSession::new(self.last_session, project);
        self.chats.insert(project.to_string(), session);
        Transition::changed()
    }

    pub(crate) fn close_chat(&mut self, project: &str) -> Transition {
        match self.chats.remove(project) {
            Some(_) => Transition::changed(),
            None => Transition::unchanged(),
        }
    }

    pub(crate) fn chat_mut(&mut self, project: &str) -> Option<&mut ChatSession> {
        self.chats.get_mut(project)
    }

    pub(crate) fn chat_by_session_mut(&mut self, session: SessionId) -> Option<&mut ChatSession> {
        self.chats.values_mut().find(|chat| chat.id() == session)
    }
}
