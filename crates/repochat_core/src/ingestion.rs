use repochat_logging::{repochat_debug, repochat_info, repochat_warn};

use crate::{Effect, ProgressFrame, Transition};

pub type SubscriptionId = u64;

pub const STARTING_STATUS: &str = "Starting process...";
pub const STREAM_FAILURE_STATUS: &str = "Error: Unable to retrieve progress.";
pub const INVALID_URL_FEEDBACK: &str = "Please enter a valid URL.";
pub const SUCCESS_FEEDBACK: &str = "Repository processed successfully!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobState {
    #[default]
    Idle,
    Connecting,
    Running,
    Succeeded,
    Failed,
}

impl JobState {
    /// Connecting and Running share one "subscription active" phase.
    pub fn is_active(self) -> bool {
        matches!(self, JobState::Connecting | JobState::Running)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IngestionJob {
    pub source_url: String,
    pub progress: u8,
    pub status: String,
    pub state: JobState,
    pub detail: Option<String>,
    pub repository_name: Option<String>,
}

/// Lifecycle of the single ingestion subscription owned by one client.
///
/// The subscription id is the owned handle: every stream message is tagged
/// with the id it was opened under, and anything not matching the current id
/// is dropped. That is what makes "no state change after close or cancel" hold
/// even when the transport still has events in flight.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressStream {
    job: IngestionJob,
    subscription: Option<SubscriptionId>,
    last_subscription: SubscriptionId,
    feedback: Option<String>,
}

impl ProgressStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn job(&self) -> &IngestionJob {
        &self.job
    }

    pub fn subscription(&self) -> Option<SubscriptionId> {
        self.subscription
    }

    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    /// Opens a subscription for `raw_url`, replacing (and closing) any
    /// subscription that is still active.
    pub fn start(&mut self, raw_url: &str) -> Transition {
        let source_url = raw_url.trim();
        if !is_valid_source_url(source_url) {
            repochat_debug!("Rejected ingestion url {:?}", raw_url);
            self.feedback = Some(INVALID_URL_FEEDBACK.to_string());
            return Transition::changed();
        }

        let mut transition = Transition::changed();
        if let Some(previous) = self.subscription.take() {
            repochat_warn!(
                "Replacing active subscription {} ({}) with a new one for {}",
                previous,
                self.job.source_url,
                source_url
            );
            transition = transition.with_effect(Effect::CloseProgressStream {
                subscription: previous,
            });
        }

        self.last_subscription += 1;
        let subscription = self.last_subscription;
        self.subscription = Some(subscription);
        self.feedback = None;
        self.job = IngestionJob {
            source_url: source_url.to_string(),
            status: STARTING_STATUS.to_string(),
            state: JobState::Connecting,
            ..IngestionJob::default()
        };
        repochat_info!("Subscription {} opening for {}", subscription, source_url);

        transition.with_effect(Effect::OpenProgressStream {
            subscription,
            source_url: source_url.to_string(),
        })
    }

    /// Applies one raw frame. Completion closes the channel and asks for a
    /// directory refresh exactly once, since the subscription is gone after.
    pub fn apply_frame(&mut self, subscription: SubscriptionId, raw: &str) -> Transition {
        if !self.is_current(subscription) {
            repochat_debug!("Dropping frame for stale subscription {}", subscription);
            return Transition::unchanged();
        }

        let frame = match ProgressFrame::parse(raw) {
            Ok(frame) => frame,
            Err(err) => {
                repochat_warn!("Ignoring frame on subscription {}: {}", subscription, err);
                return Transition::unchanged();
            }
        };

        let mut changed = false;
        if let Some(progress) = frame.progress {
            self.job.progress = clamp_progress(progress);
            if self.job.state == JobState::Connecting {
                self.job.state = JobState::Running;
            }
            changed = true;
        }
        if let Some(status) = frame.status.as_ref() {
            self.job.status = status.clone();
            changed = true;
        }
        if let Some(message) = frame.message.as_ref() {
            self.job.detail = Some(message.clone());
            changed = true;
        }
        if let Some(name) = frame.repository_name.as_ref() {
            self.job.repository_name = Some(name.clone());
            changed = true;
        }

        if !frame.is_complete() {
            return if changed {
                Transition::changed()
            } else {
                Transition::unchanged()
            };
        }

        self.subscription = None;
        self.job.state = JobState::Succeeded;
        self.feedback = Some(SUCCESS_FEEDBACK.to_string());
        repochat_info!(
            "Subscription {} finished for {}",
            subscription,
            self.job.source_url
        );
        Transition::changed()
            .with_effect(Effect::CloseProgressStream { subscription })
            .request_refresh()
    }

    /// Transport failure on the channel: no retry, the channel is released.
    pub fn fail(&mut self, subscription: SubscriptionId, reason: &str) -> Transition {
        if !self.is_current(subscription) {
            repochat_debug!(
                "Dropping failure for stale subscription {}: {}",
                subscription,
                reason
            );
            return Transition::unchanged();
        }

        repochat_warn!("Subscription {} failed: {}", subscription, reason);
        self.subscription = None;
        self.job.state = JobState::Failed;
        self.job.status = STREAM_FAILURE_STATUS.to_string();
        self.job.detail = Some(reason.to_string());
        Transition::changed().with_effect(Effect::CloseProgressStream { subscription })
    }

    /// The server closing the stream before completion counts as an abort.
    /// A detail already reported by an error frame is kept.
    pub fn ended(&mut self, subscription: SubscriptionId) -> Transition {
        let reason = self
            .job
            .detail
            .clone()
            .unwrap_or_else(|| "stream closed before completion".to_string());
        self.fail(subscription, &reason)
    }

    /// Closes any open channel and resets to Idle. Idempotent.
    pub fn cancel(&mut self) -> Transition {
        let closing = self.subscription.take();
        let was_reset = self.job == IngestionJob::default() && self.feedback.is_none();
        self.job = IngestionJob::default();
        self.feedback = None;

        let mut transition = if was_reset && closing.is_none() {
            Transition::unchanged()
        } else {
            Transition::changed()
        };
        if let Some(subscription) = closing {
            repochat_info!("Subscription {} cancelled", subscription);
            transition = transition.with_effect(Effect::CloseProgressStream { subscription });
        }
        transition
    }

    fn is_current(&self, subscription: SubscriptionId) -> bool {
        self.subscription == Some(subscription)
    }
}

fn clamp_progress(progress: i64) -> u8 {
    progress.clamp(0, 100) as u8
}

fn is_valid_source_url(candidate: &str) -> bool {
    if candidate.is_empty() {
        return false;
    }
    match url::Url::parse(candidate) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some()
        }
        Err(_) => false,
    }
}
