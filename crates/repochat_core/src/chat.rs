use repochat_logging::{repochat_debug, repochat_warn};

use crate::{Effect, Transition};

pub type SessionId = u64;

pub const CHAT_FALLBACK_TEXT: &str = "Sorry, I could not find an answer to that.";
pub const CHAT_FAILURE_NOTICE: &str =
    "Error: Unable to reach the chat service. Please try again.";
pub const EMPTY_QUERY_NOTICE: &str = "Please enter a question.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Bot,
            text: text.into(),
        }
    }
}

/// Greeting that seeds every new transcript.
pub fn greeting(project: &str) -> String {
    format!("Hi! Ask me anything about {project}.")
}

/// Transcript and in-flight marker for one project view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSession {
    id: SessionId,
    project: String,
    transcript: Vec<ChatMessage>,
    pending: bool,
    notice: Option<String>,
}

impl ChatSession {
    pub fn new(id: SessionId, project: impl Into<String>) -> Self {
        let project = project.into();
        let transcript = vec![ChatMessage::bot(greeting(&project))];
        Self {
            id,
            project,
            transcript,
            pending: false,
            notice: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Appends the user's question and issues exactly one request. A second
    /// call while a request is pending is rejected without touching the
    /// transcript, whatever the caller's input affordance is doing.
    pub fn send(&mut self, text: &str) -> Transition {
        let query = text.trim();
        if query.is_empty() {
            self.notice = Some(EMPTY_QUERY_NOTICE.to_string());
            return Transition::changed();
        }
        if self.pending {
            repochat_warn!(
                "Rejected chat query for {}: a request is already pending",
                self.project
            );
            return Transition::unchanged();
        }

        self.notice = None;
        self.transcript.push(ChatMessage::user(query));
        self.pending = true;
        Transition::changed().with_effect(Effect::SendChat {
            session: self.id,
            project: self.project.clone(),
            query: query.to_string(),
        })
    }

    /// Appends the single bot reply for the pending request.
    pub fn resolve(&mut self, result: Result<Option<String>, String>) -> Transition {
        if !self.pending {
            repochat_debug!("Dropping chat reply for {}: nothing pending", self.project);
            return Transition::unchanged();
        }

        let reply = match result {
            Ok(Some(text)) if !text.trim().is_empty() => text,
            Ok(_) => CHAT_FALLBACK_TEXT.to_string(),
            Err(reason) => {
                repochat_warn!("Chat request for {} failed: {}", self.project, reason);
                CHAT_FAILURE_NOTICE.to_string()
            }
        };
        self.transcript.push(ChatMessage::bot(reply));
        self.pending = false;
        Transition::changed()
    }
}
