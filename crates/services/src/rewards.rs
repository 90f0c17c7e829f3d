//! Reward notifications raised by the session engine.
//!
//! Hooks observe scoring; they cannot change engine state.

use std::sync::{Arc, Mutex, PoisonError};

use quiz_core::achievements::Badge;

/// Something worth celebrating (or commiserating) happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewardEvent {
    Correct { streak: u32 },
    Wrong,
    LevelUp {
        level: u32,
        unlocked_theme: Option<String>,
    },
    StreakMilestone { streak: u32 },
    BadgeEarned(Badge),
    StickerEarned(String),
}

/// Observer for reward events.
pub trait RewardHook: Send + Sync {
    fn notify(&self, event: &RewardEvent);
}

/// Fan-out list of reward hooks. Empty is fine.
#[derive(Clone, Default)]
pub struct RewardBus {
    hooks: Vec<Arc<dyn RewardHook>>,
}

impl RewardBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_hook(mut self, hook: Arc<dyn RewardHook>) -> Self {
        self.subscribe(hook);
        self
    }

    pub fn subscribe(&mut self, hook: Arc<dyn RewardHook>) {
        self.hooks.push(hook);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn emit(&self, event: &RewardEvent) {
        log::debug!("reward event: {event:?}");
        for hook in &self.hooks {
            hook.notify(event);
        }
    }
}

/// Hook that buffers events until they are drained.
#[derive(Clone, Default)]
pub struct RewardLog {
    events: Arc<Mutex<Vec<RewardEvent>>>,
}

impl RewardLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every buffered event, oldest first.
    #[must_use]
    pub fn drain(&self) -> Vec<RewardEvent> {
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *events)
    }
}

impl RewardHook for RewardLog {
    fn notify(&self, event: &RewardEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
