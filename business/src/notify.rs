//! Transient operator notifications.
//!
//! Drivers drain the queue and render however they like (toasts, stderr).
//! Warnings and errors are also written to the log.

use std::any::Any;

use keeper_states::{SnapshotClone, State, state_assign_impl};
use log::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct Notifications {
    queue: Vec<Toast>,
}

impl Notifications {
    pub fn push(&mut self, level: ToastLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            ToastLevel::Success => info!("{message}"),
            ToastLevel::Warning => warn!("{message}"),
            ToastLevel::Error => error!("{message}"),
        }
        self.queue.push(Toast { level, message });
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(ToastLevel::Success, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(ToastLevel::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(ToastLevel::Error, message);
    }

    pub fn pending(&self) -> &[Toast] {
        &self.queue
    }

    /// Take every queued toast, oldest first.
    pub fn drain(&mut self) -> Vec<Toast> {
        std::mem::take(&mut self.queue)
    }
}

impl SnapshotClone for Notifications {}

impl State for Notifications {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn assign_box(&mut self, new_self: Box<dyn Any + Send>) {
        state_assign_impl(self, new_self);
    }
}
