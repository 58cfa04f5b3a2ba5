// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Task, routing, and event types shared across the murmur runtime.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a task, assigned by the router at admission.
///
/// IDs are monotonically increasing within a process, which also makes
/// them a stable arrival-order tiebreaker.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TaskId(pub u64);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// Task priority. Ordered so that `Urgent > Normal > Background`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Background,
    Normal,
    Urgent,
}

/// Executor route for a task.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Route {
    /// On-device inference engine.
    Local,
    /// Remote model provider.
    Cloud,
}

/// Routing mode selected by the operator.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RouterMode {
    /// Complexity-threshold routing.
    #[default]
    Auto,
    /// Prefer the local engine.
    Local,
    /// Prefer cloud providers.
    Cloud,
}

/// Executor availability flags, updated by the inference engine lifecycle
/// and by credential/network probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecutorStatus {
    /// A local model is loaded and can serve prompts.
    pub local_model_loaded: bool,
    /// At least one cloud provider is reachable with valid credentials.
    pub cloud_available: bool,
}

/// A request to submit work, before the router assigns an ID and scores it.
#[derive(Debug, Clone, Default)]
pub struct TaskRequest {
    /// Originating channel identifier (e.g. "webhook", "telegram").
    pub channel: String,
    /// Originating user or session identifier within the channel.
    pub user: String,
    /// Raw message text.
    pub text: String,
    /// Arbitrary channel-supplied metadata.
    pub metadata: HashMap<String, serde_json::Value>,
}

/// One unit of work: a single user message to be answered.
///
/// Immutable after admission; the derived [`TaskProfile`] is computed
/// synchronously at submission time and travels alongside.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: TaskId,
    pub channel: String,
    pub user: String,
    pub text: String,
    pub metadata: HashMap<String, serde_json::Value>,
    /// Arrival time, milliseconds since the Unix epoch.
    pub submitted_at_ms: u64,
}

/// Scoring output derived from a task's text and the router configuration.
///
/// The route is *not* part of the profile: it is recomputed at each
/// dispatch from the profile, the live config, and executor status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskProfile {
    /// Heuristic complexity score in `[0, 10]`.
    pub complexity: u8,
    pub priority: Priority,
    /// The message asks for an immediate answer.
    pub realtime: bool,
    /// The message (or the active config) demands on-device handling.
    pub privacy: bool,
}

/// Why a task was dropped without executing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Evicted to make room for a newly-admitted task.
    QueueOverflow,
}

/// Snapshot of router state, produced on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub queue_len: usize,
    pub current: Option<TaskId>,
    pub urgent_count: usize,
    pub normal_count: usize,
    pub background_count: usize,
    pub mode: RouterMode,
    pub executors: ExecutorStatus,
}

/// Events published on the router's broadcast bus.
///
/// Every terminal event (`Complete`, `Cancelled`, `Error`, `Dropped`)
/// carries the task ID so disconnected submitters can be reconciled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskEvent {
    /// The scheduling loop is up and accepting submissions.
    Ready,
    Queued {
        id: TaskId,
        position: usize,
    },
    Routed {
        id: TaskId,
        route: Route,
        complexity: u8,
        priority: Priority,
        realtime: bool,
        privacy: bool,
    },
    Stream {
        id: TaskId,
        token: String,
    },
    Complete {
        id: TaskId,
        response: String,
    },
    Preempted {
        id: TaskId,
    },
    Cancelled {
        id: TaskId,
    },
    Dropped {
        id: TaskId,
        reason: DropReason,
    },
    Error {
        id: TaskId,
        error: String,
    },
    Status(StatusSnapshot),
}

impl TaskEvent {
    /// The task this event refers to, if any.
    pub fn task_id(&self) -> Option<TaskId> {
        match self {
            TaskEvent::Queued { id, .. }
            | TaskEvent::Routed { id, .. }
            | TaskEvent::Stream { id, .. }
            | TaskEvent::Complete { id, .. }
            | TaskEvent::Preempted { id }
            | TaskEvent::Cancelled { id }
            | TaskEvent::Dropped { id, .. }
            | TaskEvent::Error { id, .. } => Some(*id),
            TaskEvent::Ready | TaskEvent::Status(_) => None,
        }
    }

    /// True for events that end a task's lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskEvent::Complete { .. }
                | TaskEvent::Cancelled { .. }
                | TaskEvent::Error { .. }
                | TaskEvent::Dropped { .. }
        )
    }
}

/// Outcome of a cancellation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelOutcome {
    /// Removed from the queue before it ran.
    Cancelled,
    /// No queued or running task has this ID.
    NotFound,
    /// The task is the current one; cancellation was signalled to its
    /// executor and will complete cooperatively.
    AlreadyRunning,
}

/// Acknowledgement returned by `submit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitAck {
    pub id: TaskId,
    /// Number of tasks sitting in the queue after this admission.
    /// Zero when the task was dispatched immediately.
    pub queued_position: usize,
}

/// Role of a chat message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A normalized chat message, the lingua franca between the router,
/// the providers, and the local engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Current time in milliseconds since the Unix epoch.
pub fn epoch_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
