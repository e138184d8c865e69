//! Transient on-screen notifications.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use charisma_core::config::ClientConfig;

/// Visual category of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    /// Something finished well.
    Success,
    /// Something failed.
    Error,
    /// Needs attention.
    Warning,
    /// Informational.
    Info,
}

/// One toast.
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    /// Queue-local id.
    pub id: u64,
    /// Category.
    pub kind: ToastKind,
    /// Heading.
    pub title: String,
    /// Body.
    pub message: String,
    /// Time until auto-dismissal; `None` stays until dismissed.
    pub duration: Option<Duration>,
    /// When it was shown.
    pub shown_at: Instant,
}

impl Toast {
    fn expired(&self, now: Instant) -> bool {
        self.duration
            .is_some_and(|d| now.duration_since(self.shown_at) >= d)
    }
}

#[derive(Debug, Default)]
struct ToastState {
    next_id: u64,
    toasts: VecDeque<Toast>,
}

/// Ordered toast list shared between the feed and the renderer.
#[derive(Debug, Clone)]
pub struct ToastQueue {
    state: Arc<Mutex<ToastState>>,
    default_duration: Duration,
    max_visible: usize,
}

impl ToastQueue {
    /// Create a queue.
    pub fn new(default_duration: Duration, max_visible: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(ToastState::default())),
            default_duration,
            max_visible: max_visible.max(1),
        }
    }

    /// Create a queue from the client configuration section.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.toast_duration(), config.max_toasts)
    }

    fn lock(&self) -> MutexGuard<'_, ToastState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Show a toast that dismisses itself after the default duration.
    pub fn push(&self, kind: ToastKind, title: impl Into<String>, message: impl Into<String>) -> u64 {
        self.insert(kind, title.into(), message.into(), Some(self.default_duration))
    }

    /// Show a toast that stays until dismissed.
    pub fn push_persistent(
        &self,
        kind: ToastKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> u64 {
        self.insert(kind, title.into(), message.into(), None)
    }

    fn insert(
        &self,
        kind: ToastKind,
        title: String,
        message: String,
        duration: Option<Duration>,
    ) -> u64 {
        let mut state = self.lock();
        state.next_id += 1;
        let id = state.next_id;
        state.toasts.push_back(Toast {
            id,
            kind,
            title,
            message,
            duration,
            shown_at: Instant::now(),
        });
        while state.toasts.len() > self.max_visible {
            state.toasts.pop_front();
        }
        id
    }

    /// Remove a toast. Returns whether it was still showing.
    pub fn dismiss(&self, id: u64) -> bool {
        let mut state = self.lock();
        let before = state.toasts.len();
        state.toasts.retain(|t| t.id != id);
        state.toasts.len() != before
    }

    /// Toasts still on screen, oldest first. Expired ones are dropped.
    pub fn visible(&self) -> Vec<Toast> {
        let now = Instant::now();
        let mut state = self.lock();
        state.toasts.retain(|t| !t.expired(now));
        state.toasts.iter().cloned().collect()
    }

    /// Remove every toast.
    pub fn clear(&self) {
        self.lock().toasts.clear();
    }
}
