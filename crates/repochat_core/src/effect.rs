use crate::{SessionId, SubscriptionId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchProjects,
    OpenProgressStream {
        subscription: SubscriptionId,
        source_url: String,
    },
    CloseProgressStream {
        subscription: SubscriptionId,
    },
    SendChat {
        session: SessionId,
        project: String,
        query: String,
    },
}

/// Result of driving one component operation: effects to run, whether any
/// observable value changed, and whether the directory must be refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transition {
    effects: Vec<Effect>,
    changed: bool,
    refresh_directory: bool,
}

impl Transition {
    pub fn unchanged() -> Self {
        Self::default()
    }

    pub fn changed() -> Self {
        Self {
            changed: true,
            ..Self::default()
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub(crate) fn request_refresh(mut self) -> Self {
        self.refresh_directory = true;
        self
    }

    /// Appends `next` after `self`, keeping effect order.
    pub fn then(mut self, next: Transition) -> Self {
        self.effects.extend(next.effects);
        self.changed |= next.changed;
        self.refresh_directory |= next.refresh_directory;
        self
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn refresh_requested(&self) -> bool {
        self.refresh_directory
    }

    pub(crate) fn into_effects(self) -> Vec<Effect> {
        self.effects
    }
}
