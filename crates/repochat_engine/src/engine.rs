use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex, MutexGuard};

use repochat_logging::{repochat_debug, repochat_info};
use thiserror::Error;
use tokio::runtime::{Handle, Runtime};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::backend::{Backend, BackendSettings, FrameSink, ReqwestBackend, StreamEnd};
use crate::{ChatRequest, ClientError, EngineEvent, SessionId, SubscriptionId};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start engine runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Client(#[from] ClientError),
}

enum EngineCommand {
    FetchProjects,
    SendChat {
        session: SessionId,
        request: ChatRequest,
    },
}

struct OpenStream {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

type StreamRegistry = Arc<Mutex<HashMap<SubscriptionId, OpenStream>>>;

/// Owns the IO runtime. Every result is delivered on one ordered channel so
/// the client loop applies stream frames exactly in arrival order.
pub struct EngineHandle {
    runtime: Option<Runtime>,
    handle: Handle,
    backend: Arc<dyn Backend>,
    event_tx: mpsc::Sender<EngineEvent>,
    streams: StreamRegistry,
}

impl EngineHandle {
    pub fn new(
        settings: BackendSettings,
        event_tx: mpsc::Sender<EngineEvent>,
    ) -> Result<Self, EngineError> {
        let backend = ReqwestBackend::new(settings)?;
        Self::with_backend(Arc::new(backend), event_tx)
    }

    pub fn with_backend(
        backend: Arc<dyn Backend>,
        event_tx: mpsc::Sender<EngineEvent>,
    ) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("repochat-engine")
            .enable_all()
            .build()?;
        let handle = runtime.handle().clone();
        Ok(Self {
            runtime: Some(runtime),
            handle,
            backend,
            event_tx,
            streams: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    pub fn fetch_projects(&self) {
        self.spawn_command(EngineCommand::FetchProjects);
    }

    pub fn send_chat(
        &self,
        session: SessionId,
        project: impl Into<String>,
        query: impl Into<String>,
    ) {
        self.spawn_command(EngineCommand::SendChat {
            session,
            request: ChatRequest {
                query: query.into(),
                project_name: project.into(),
            },
        });
    }

    /// Opens a progress subscription. Reusing a live id closes the old one.
    pub fn open_stream(&self, subscription: SubscriptionId, repo_url: impl Into<String>) {
        let repo_url = repo_url.into();
        let cancel = CancellationToken::new();
        let task = self.handle.spawn(run_stream(
            self.backend.clone(),
            subscription,
            repo_url,
            self.event_tx.clone(),
            cancel.clone(),
        ));
        let replaced = lock(&self.streams).insert(subscription, OpenStream { cancel, task });
        if let Some(replaced) = replaced {
            self.release(subscription, replaced);
        }
    }

    /// Closes a subscription and releases its connection before returning.
    /// Once this returns no further event for `subscription` is sent.
    pub fn close_stream(&self, subscription: SubscriptionId) {
        let open = lock(&self.streams).remove(&subscription);
        match open {
            Some(open) => self.release(subscription, open),
            None => repochat_debug!("Subscription {} already closed", subscription),
        }
    }

    pub fn open_stream_count(&self) -> usize {
        lock(&self.streams).len()
    }

    fn release(&self, subscription: SubscriptionId, open: OpenStream) {
        open.cancel.cancel();
        open.task.abort();
        // Waiting is only possible off the runtime; inside it the abort
        // drops the response on the task's next poll.
        if Handle::try_current().is_err() {
            let _ = self.handle.block_on(open.task);
        }
        repochat_info!("Subscription {} closed", subscription);
    }

    fn spawn_command(&self, command: EngineCommand) {
        let backend = self.backend.clone();
        let event_tx = self.event_tx.clone();
        self.handle.spawn(async move {
            handle_command(backend.as_ref(), command, event_tx).await;
        });
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        let streams: Vec<OpenStream> = lock(&self.streams)
            .drain()
            .map(|(_, open)| open)
            .collect();
        for open in streams {
            open.cancel.cancel();
            open.task.abort();
        }
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

async fn handle_command(
    backend: &dyn Backend,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let event = match command {
        EngineCommand::FetchProjects => EngineEvent::ProjectsFetched(backend.list_projects().await),
        EngineCommand::SendChat { session, request } => EngineEvent::ChatAnswered {
            session,
            result: backend.chat(&request).await,
        },
    };
    let _ = event_tx.send(event);
}

struct ChannelFrameSink {
    subscription: SubscriptionId,
    event_tx: mpsc::Sender<EngineEvent>,
    cancel: CancellationToken,
}

impl FrameSink for ChannelFrameSink {
    fn frame(&self, raw: String) {
        if self.cancel.is_cancelled() {
            return;
        }
        let _ = self.event_tx.send(EngineEvent::StreamFrame {
            subscription: self.subscription,
            raw,
        });
    }
}

async fn run_stream(
    backend: Arc<dyn Backend>,
    subscription: SubscriptionId,
    repo_url: String,
    event_tx: mpsc::Sender<EngineEvent>,
    cancel: CancellationToken,
) {
    let sink = ChannelFrameSink {
        subscription,
        event_tx: event_tx.clone(),
        cancel: cancel.clone(),
    };
    let outcome = backend.stream_progress(&repo_url, &sink, &cancel).await;
    if cancel.is_cancelled() {
        return;
    }
    let event = match outcome {
        Ok(StreamEnd::ServerClosed) => EngineEvent::StreamEnded { subscription },
        Ok(StreamEnd::Cancelled) => return,
        Err(error) => EngineEvent::StreamFailed {
            subscription,
            error,
        },
    };
    let _ = event_tx.send(event);
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
