// crates/network/src/task.rs
//! Generic task lifecycle: status, events and listener fan-out

use crate::error::{FailureReason, NetworkResult};
use std::fmt;
use std::sync::Arc;

/// Lifecycle state of a task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// Constructed, not yet started
    Idle,
    /// Started and waiting for its terminal event
    Running,
    Succeeded,
    Failed(FailureReason),
    /// Stopped on request; not a failure
    Cancelled,
}

impl TaskStatus {
    /// Returns true for Succeeded, Failed and Cancelled
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Succeeded | TaskStatus::Failed(_) | TaskStatus::Cancelled
        )
    }

    /// Returns the terminal event announcing this status, if it is terminal
    pub fn terminal_event(&self) -> Option<TaskEvent> {
        match self {
            TaskStatus::Succeeded => Some(TaskEvent::Succeeded),
            TaskStatus::Failed(reason) => Some(TaskEvent::Failed(reason.clone())),
            TaskStatus::Cancelled => Some(TaskEvent::Cancelled),
            TaskStatus::Idle | TaskStatus::Running => None,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed(reason) => write!(f, "failed: {}", reason),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Notification emitted by a task to its listeners
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    Started,
    Progress { received: u64, total: Option<u64> },
    Succeeded,
    Failed(FailureReason),
    Cancelled,
}

impl TaskEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskEvent::Succeeded | TaskEvent::Failed(_) | TaskEvent::Cancelled
        )
    }
}

/// Listener callback type
pub type TaskListener = Arc<dyn Fn(&TaskEvent) + Send + Sync>;

/// Delivers task events to listeners, at most one terminal event per task
#[derive(Default)]
pub struct TaskReporter {
    listeners: Vec<TaskListener>,
    terminal_sent: bool,
}

impl TaskReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener for all subsequent events
    pub fn subscribe(&mut self, listener: TaskListener) {
        self.listeners.push(listener);
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Returns true once a terminal event has gone out
    pub fn is_closed(&self) -> bool {
        self.terminal_sent
    }

    /// Sends an event to every listener.
    ///
    /// Returns false, without notifying anyone, when a terminal event was
    /// already reported.
    pub fn emit(&mut self, event: TaskEvent) -> bool {
        if self.terminal_sent {
            log::warn!("Dropping task event after terminal report: {:?}", event);
            return false;
        }
        if event.is_terminal() {
            self.terminal_sent = true;
        }
        for listener in &self.listeners {
            listener(&event);
        }
        true
    }
}

impl fmt::Debug for TaskReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskReporter")
            .field("listeners", &self.listeners.len())
            .field("terminal_sent", &self.terminal_sent)
            .finish()
    }
}

/// A unit of cooperative work with a start/cancel lifecycle
pub trait Task {
    /// Entry point invoked when the task starts. The default does nothing.
    fn execute(&mut self) -> NetworkResult<()> {
        Ok(())
    }

    /// Current lifecycle state
    fn status(&self) -> &TaskStatus;

    /// Requests cancellation; returns false if the task was already terminal
    fn cancel(&mut self) -> bool;

    fn is_running(&self) -> bool {
        *self.status() == TaskStatus::Running
    }

    fn is_finished(&self) -> bool {
        self.status().is_terminal()
    }
}
