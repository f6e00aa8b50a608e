use std::sync::mpsc;
use std::thread;

use repochat_core::{Effect, Msg, Project};
use repochat_engine::{BackendSettings, EngineError, EngineEvent, EngineHandle};
use repochat_logging::{repochat_info, repochat_warn};

use super::commands::Input;

pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(
        settings: BackendSettings,
        input_tx: mpsc::Sender<Input>,
    ) -> Result<Self, EngineError> {
        let (event_tx, event_rx) = mpsc::channel();
        let engine = EngineHandle::new(settings, event_tx)?;
        spawn_event_loop(event_rx, input_tx);
        Ok(Self { engine })
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::FetchProjects => self.engine.fetch_projects(),
                Effect::OpenProgressStream {
                    subscription,
                    source_url,
                } => {
                    repochat_info!(
                        "OpenProgressStream subscription={} url={}",
                        subscription,
                        source_url
                    );
                    self.engine.open_stream(subscription, source_url);
                }
                Effect::CloseProgressStream { subscription } => {
                    self.engine.close_stream(subscription);
                }
                Effect::SendChat {
                    session,
                    project,
                    query,
                } => {
                    repochat_info!(
                        "SendChat session={} project={} query_len={}",
                        session,
                        project,
                        query.len()
                    );
                    self.engine.send_chat(session, project, query);
                }
            }
        }
    }
}

/// Forwards engine events to the client loop one by one, preserving order.
fn spawn_event_loop(event_rx: mpsc::Receiver<EngineEvent>, input_tx: mpsc::Sender<Input>) {
    thread::spawn(move || {
        while let Ok(event) = event_rx.recv() {
            if input_tx.send(Input::Msg(map_event(event))).is_err() {
                break;
            }
        }
    });
}

fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::ProjectsFetched(result) => Msg::ProjectsLoaded(
            result
                .map(|entries| {
                    entries
                        .into_iter()
                        .map(|entry| Project::new(entry.name))
                        .collect()
                })
                .map_err(|err| format!("Failed to fetch projects ({err})")),
        ),
        EngineEvent::ChatAnswered { session, result } => Msg::ChatResolved {
            session,
            result: result
                .map(|reply| {
                    if let Some(error) = reply.error.as_deref() {
                        repochat_warn!("Chat backend reported an error: {}", error);
                    }
                    reply.response
                })
                .map_err(|err| err.to_string()),
        },
        EngineEvent::StreamFrame { subscription, raw } => Msg::StreamFrame { subscription, raw },
        EngineEvent::StreamFailed {
            subscription,
            error,
        } => Msg::StreamFailed {
            subscription,
            reason: error.to_string(),
        },
        EngineEvent::StreamEnded { subscription } => Msg::StreamEnded { subscription },
    }
}
