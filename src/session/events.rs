//! Observer lists for session notifications
//!
//! Each notification kind has its own ordered list of callbacks. Callbacks
//! receive read-only event values and run synchronously at the end of a tick.

use serde::Serialize;

/// Handle returned by [`Observers::subscribe`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Ordered subscriber list for one event type
pub struct Observers<E> {
    next_id: u64,
    callbacks: Vec<(SubscriptionId, Box<dyn FnMut(&E)>)>,
}

impl<E> Observers<E> {
    pub fn new() -> Self {
        Observers {
            next_id: 0,
            callbacks: Vec::new(),
        }
    }

    /// Append a callback; it runs after all earlier subscribers
    pub fn subscribe(&mut self, callback: impl FnMut(&E) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.callbacks.push((id, Box::new(callback)));
        id
    }

    /// Remove a callback. Returns false if the id was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(existing, _)| *existing != id);
        self.callbacks.len() != before
    }

    pub fn notify(&mut self, event: &E) {
        for (_, callback) in self.callbacks.iter_mut() {
            callback(event);
        }
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl<E> Default for Observers<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Hold dwell progress in seconds
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct HoldProgress {
    pub current: f32,
    pub required: f32,
}

/// Matched position along the reference path
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PathProgress {
    pub frame: usize,
    pub total_frames: usize,
    /// In [0, 1]
    pub ratio: f32,
}

/// One notification produced during a tick
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    HoldProgress(HoldProgress),
    HoldCompleted,
    PathProgress(PathProgress),
    SafetyWarning(String),
    CheckpointPassed(String),
}

/// Subscriber lists for every notification kind a session emits
#[derive(Default)]
pub struct SessionEvents {
    pub hold_progress: Observers<HoldProgress>,
    pub hold_completed: Observers<()>,
    pub path_progress: Observers<PathProgress>,
    /// Violation messages
    pub safety_warning: Observers<String>,
    /// Segment names of passed checkpoints
    pub checkpoint_passed: Observers<String>,
}

impl SessionEvents {
    /// Route a queued event to its subscriber list
    pub fn dispatch(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::HoldProgress(progress) => self.hold_progress.notify(progress),
            SessionEvent::HoldCompleted => self.hold_completed.notify(&()),
            SessionEvent::PathProgress(progress) => self.path_progress.notify(progress),
            SessionEvent::SafetyWarning(message) => self.safety_warning.notify(message),
            SessionEvent::CheckpointPassed(segment) => self.checkpoint_passed.notify(segment),
        }
    }
}
