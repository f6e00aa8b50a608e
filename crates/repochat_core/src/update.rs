use repochat_logging::repochat_debug;

use crate::{AppState, Effect, Msg, Transition};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let transition = match msg {
        Msg::AppStarted | Msg::RefreshClicked => state.directory.refresh(),
        Msg::ProjectsLoaded(result) => state.directory.apply(result),
        Msg::IngestSubmitted { url } => state.ingestion.start(&url),
        Msg::CancelClicked => state.ingestion.cancel(),
        Msg::StreamFrame { subscription, raw } => state.ingestion.apply_frame(subscription, &raw),
        Msg::StreamFailed {
            subscription,
            reason,
        } => state.ingestion.fail(subscription, &reason),
        Msg::StreamEnded { subscription } => state.ingestion.ended(subscription),
        Msg::ProjectOpened { project } => state.open_chat(&project),
        Msg::ProjectClosed { project } => state.close_chat(&project),
        Msg::ChatSubmitted { project, text }
            if text.trim().is_empty() && state.chat(&project).is_none() =>
        {
            repochat_debug!("Ignoring empty chat query for unopened project {}", project);
            Transition::unchanged()
        }
        Msg::ChatSubmitted { project, text } => {
            // Asking about a project implies its view is open.
            let opened = state.open_chat(&project);
            match state.chat_mut(&project) {
                Some(chat) => opened.then(chat.send(&text)),
                None => opened,
            }
        }
        Msg::ChatResolved { session, result } => match state.chat_by_session_mut(session) {
            Some(chat) => chat.resolve(result),
            None => {
                repochat_debug!("Dropping chat reply for closed session {}", session);
                Transition::unchanged()
            }
        },
        Msg::NoOp => Transition::unchanged(),
    };

    let transition = if transition.refresh_requested() {
        transition.then(state.directory.refresh())
    } else {
        transition
    };

    if transition.is_changed() {
        state.mark_dirty();
    }
    (state, transition.into_effects())
}
