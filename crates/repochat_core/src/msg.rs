use crate::{Project, SessionId, SubscriptionId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Client mounted; triggers the initial directory load.
    AppStarted,
    /// User asked for a directory refresh.
    RefreshClicked,
    /// Directory request finished.
    ProjectsLoaded(Result<Vec<Project>, String>),
    /// User submitted a repository URL for ingestion.
    IngestSubmitted { url: String },
    /// User cancelled (or reset) the ingestion view.
    CancelClicked,
    /// One raw frame from a progress subscription.
    StreamFrame {
        subscription: SubscriptionId,
        raw: String,
    },
    /// Transport-level failure on a progress subscription.
    StreamFailed {
        subscription: SubscriptionId,
        reason: String,
    },
    /// The server closed a progress subscription.
    StreamEnded { subscription: SubscriptionId },
    /// A project view was opened.
    ProjectOpened { project: String },
    /// A project view was closed; its transcript is discarded.
    ProjectClosed { project: String },
    /// User submitted a chat question for a project.
    ChatSubmitted { project: String, text: String },
    /// Chat request finished. `Ok(None)` means the backend sent no answer text.
    ChatResolved {
        session: SessionId,
        result: Result<Option<String>, String>,
    },
    /// Fallback for placeholder wiring.
    NoOp,
}
