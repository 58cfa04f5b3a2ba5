// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The scheduling loop.
//!
//! One logical loop owns the queue and the current-task slot; everything
//! else talks to it through a command channel and observes it through a
//! broadcast event bus. Executors run in spawned tasks so their I/O never
//! blocks scheduling. Preemption is a cancellation signal plus a
//! front-of-tier re-insert, never a forced unwind.

use std::sync::Arc;
use std::time::Duration;

use murmur_config::{QueueConfig, RoutingConfig};
use murmur_core::{
    types::epoch_ms, CancelOutcome, ChatMessage, CloudDispatcher, ExecutorStatus,
    InferenceEngine, MurmurError, Priority, Route, StatusSnapshot, SubmitAck, Task,
    TaskEvent, TaskId, TaskRequest,
};
use murmur_memory::MemoryEngine;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::queue::{Admitted, TaskQueue};
use crate::scoring;

/// Capacity of the inbound command channel.
const COMMAND_BUFFER: usize = 64;
/// Capacity of the event bus. Slow subscribers lag rather than block.
const EVENT_BUFFER: usize = 512;

/// The executors a router dispatches to. Either side may be absent; the
/// availability flags decide what is actually used.
#[derive(Clone, Default)]
pub struct Executors {
    pub engine: Option<Arc<dyn InferenceEngine>>,
    pub cloud: Option<Arc<dyn CloudDispatcher>>,
}

enum Command {
    Submit {
        request: TaskRequest,
        reply: oneshot::Sender<Result<SubmitAck, MurmurError>>,
    },
    UpdateConfig(RoutingConfig),
    SetExecutorStatus {
        local: Option<bool>,
        cloud: Option<bool>,
    },
    Cancel {
        id: TaskId,
        reply: oneshot::Sender<CancelOutcome>,
    },
    ClearQueue,
    Status {
        reply: oneshot::Sender<StatusSnapshot>,
    },
}

/// Cloneable handle for submitting work and observing events.
#[derive(Clone)]
pub struct RouterHandle {
    cmd_tx: mpsc::Sender<Command>,
    events: broadcast::Sender<TaskEvent>,
}

impl RouterHandle {
    /// Submit a task. Scoring happens synchronously inside the loop; the
    /// ack reports the queue position (0 = dispatched immediately).
    pub async fn submit(&self, request: TaskRequest) -> Result<SubmitAck, MurmurError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Submit { request, reply }).await?;
        rx.await.map_err(|_| router_stopped())?
    }

    /// Atomically swap the routing configuration.
    pub async fn update_config(&self, config: RoutingConfig) -> Result<(), MurmurError> {
        self.send(Command::UpdateConfig(config)).await
    }

    /// Update executor availability flags; `None` leaves a flag unchanged.
    pub async fn set_executor_status(
        &self,
        local: Option<bool>,
        cloud: Option<bool>,
    ) -> Result<(), MurmurError> {
        self.send(Command::SetExecutorStatus { local, cloud }).await
    }

    /// Cancel a queued or running task.
    pub async fn cancel(&self, id: TaskId) -> Result<CancelOutcome, MurmurError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Cancel { id, reply }).await?;
        rx.await.map_err(|_| router_stopped())
    }

    /// Drop every queued task. The running task is unaffected.
    pub async fn clear_queue(&self) -> Result<(), MurmurError> {
        self.send(Command::ClearQueue).await
    }

    /// Snapshot the router state.
    pub async fn status(&self) -> Result<StatusSnapshot, MurmurError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Status { reply }).await?;
        rx.await.map_err(|_| router_stopped())
    }

    /// Subscribe to the task event bus.
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.events.subscribe()
    }

    /// Submit and block until the task reaches a terminal event.
    ///
    /// With a timeout, expiry cancels the task and returns
    /// `RequestTimeout`.
    pub async fn submit_and_wait(
        &self,
        request: TaskRequest,
        timeout: Option<Duration>,
    ) -> Result<String, MurmurError> {
        // Subscribe before submitting so no event can slip past.
        let mut events = self.subscribe();
        let ack = self.submit(request).await?;

        let wait = Self::wait_terminal(&mut events, ack.id);
        match timeout {
            None => wait.await,
            Some(duration) => match tokio::time::timeout(duration, wait).await {
                Ok(result) => result,
                Err(_) => {
                    let _ = self.cancel(ack.id).await;
                    Err(MurmurError::RequestTimeout { duration })
                }
            },
        }
    }

    async fn wait_terminal(
        events: &mut broadcast::Receiver<TaskEvent>,
        id: TaskId,
    ) -> Result<String, MurmurError> {
        loop {
            match events.recv().await {
                Ok(event) if event.task_id() == Some(id) => match event {
                    TaskEvent::Complete { response, .. } => return Ok(response),
                    TaskEvent::Error { error, .. } => {
                        return Err(MurmurError::Internal(error))
                    }
                    TaskEvent::Cancelled { .. } => return Err(MurmurError::Cancelled),
                    TaskEvent::Dropped { reason, .. } => {
                        return Err(MurmurError::Internal(format!("task dropped: {reason}")))
                    }
                    _ => continue,
                },
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return Err(router_stopped()),
            }
        }
    }

    async fn send(&self, command: Command) -> Result<(), MurmurError> {
        self.cmd_tx
            .send(command)
            .await
            .map_err(|_| router_stopped())
    }
}

fn router_stopped() -> MurmurError {
    MurmurError::Internal("router is not running".to_string())
}

/// Spawns the scheduling loop and returns its handle.
pub struct Router;

impl Router {
    pub fn spawn(
        routing: RoutingConfig,
        queue: &QueueConfig,
        memory: Arc<MemoryEngine>,
        executors: Executors,
        status: ExecutorStatus,
        shutdown: CancellationToken,
    ) -> RouterHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let (done_tx, done_rx) = mpsc::channel(COMMAND_BUFFER);

        let scheduler = Scheduler {
            config: routing,
            queue: TaskQueue::new(queue.max_depth),
            current: None,
            status,
            memory,
            executors,
            events: events.clone(),
            done_tx,
            next_id: 1,
        };
        tokio::spawn(scheduler.run(cmd_rx, done_rx, shutdown));

        RouterHandle { cmd_tx, events }
    }
}

struct Current {
    admitted: Admitted,
    cancel: CancellationToken,
}

#[derive(Clone)]
enum ExecutorKind {
    Local(Arc<dyn InferenceEngine>),
    Cloud(Arc<dyn CloudDispatcher>),
}

struct Scheduler {
    config: RoutingConfig,
    queue: TaskQueue,
    current: Option<Current>,
    status: ExecutorStatus,
    memory: Arc<MemoryEngine>,
    executors: Executors,
    events: broadcast::Sender<TaskEvent>,
    done_tx: mpsc::Sender<TaskId>,
    next_id: u64,
}

impl Scheduler {
    async fn run(
        mut self,
        mut cmd_rx: mpsc::Receiver<Command>,
        mut done_rx: mpsc::Receiver<TaskId>,
        shutdown: CancellationToken,
    ) {
        info!("router scheduling loop started");
        self.emit(TaskEvent::Ready);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                Some(id) = done_rx.recv() => self.on_done(id),
                command = cmd_rx.recv() => match command {
                    Some(command) => self.on_command(command),
                    None => break,
                },
            }
        }

        if let Some(current) = self.current.take() {
            debug!(id = %current.admitted.id(), "cancelling current task on shutdown");
            current.cancel.cancel();
        }
        info!("router scheduling loop stopped");
    }

    fn on_command(&mut self, command: Command) {
        match command {
            Command::Submit { request, reply } => {
                let _ = reply.send(self.on_submit(request));
            }
            Command::UpdateConfig(config) => {
                debug!(mode = %config.mode, threshold = config.threshold, "routing config swapped");
                self.config = config;
            }
            Command::SetExecutorStatus { local, cloud } => {
                if let Some(local) = local {
                    self.status.local_model_loaded = local;
                }
                if let Some(cloud) = cloud {
                    self.status.cloud_available = cloud;
                }
            }
            Command::Cancel { id, reply } => {
                let _ = reply.send(self.on_cancel(id));
            }
            Command::ClearQueue => {
                for admitted in self.queue.drain() {
                    self.emit(TaskEvent::Cancelled { id: admitted.id() });
                }
            }
            Command::Status { reply } => {
                let snapshot = self.snapshot();
                self.emit(TaskEvent::Status(snapshot.clone()));
                let _ = reply.send(snapshot);
            }
        }
    }

    fn on_submit(&mut self, request: TaskRequest) -> Result<SubmitAck, MurmurError> {
        let id = TaskId(self.next_id);
        self.next_id += 1;

        let profile = scoring::score(&request.text, &self.config);
        let admitted = Admitted {
            task: Task {
                id,
                channel: request.channel,
                user: request.user,
                text: request.text,
                metadata: request.metadata,
                submitted_at_ms: epoch_ms(),
            },
            profile,
        };

        // Idle router: run immediately, skip the queue.
        if self.current.is_none() {
            self.start(admitted);
            self.advance_if_idle();
            return Ok(SubmitAck {
                id,
                queued_position: 0,
            });
        }

        // Urgent arrival preempts a lower-priority current task.
        let preempts = profile.priority == Priority::Urgent
            && self
                .current
                .as_ref()
                .is_some_and(|c| c.admitted.priority() < Priority::Urgent);
        if preempts {
            if let Some(current) = self.current.take() {
                let preempted_id = current.admitted.id();
                current.cancel.cancel();
                self.emit(TaskEvent::Preempted { id: preempted_id });
                self.queue.reinsert_front(current.admitted);
                debug!(preempted = %preempted_id, by = %id, "task preempted");
            }
            self.start(admitted);
            self.advance_if_idle();
            return Ok(SubmitAck {
                id,
                queued_position: 0,
            });
        }

        let (position, evicted) = self.queue.push(admitted)?;
        if let Some(victim) = evicted {
            self.emit(TaskEvent::Dropped {
                id: victim.id(),
                reason: murmur_core::DropReason::QueueOverflow,
            });
        }
        self.emit(TaskEvent::Queued { id, position });
        Ok(SubmitAck {
            id,
            queued_position: position,
        })
    }

    fn on_cancel(&mut self, id: TaskId) -> CancelOutcome {
        if let Some(current) = self.current.take_if(|c| c.admitted.id() == id) {
            current.cancel.cancel();
            self.emit(TaskEvent::Cancelled { id });
            self.advance_if_idle();
            return CancelOutcome::AlreadyRunning;
        }
        if let Some(removed) = self.queue.remove(id) {
            self.emit(TaskEvent::Cancelled { id: removed.id() });
            return CancelOutcome::Cancelled;
        }
        CancelOutcome::NotFound
    }

    fn on_done(&mut self, id: TaskId) {
        if self.current.as_ref().is_some_and(|c| c.admitted.id() == id) {
            self.current = None;
            self.advance_if_idle();
        }
        // A Done for any other id belongs to a preempted or cancelled
        // task winding down; the slot has already moved on.
    }

    /// Fill the current slot from the queue, skipping tasks that fail at
    /// dispatch.
    fn advance_if_idle(&mut self) {
        while self.current.is_none() {
            match self.queue.pop_next() {
                Some(admitted) => self.start(admitted),
                None => break,
            }
        }
    }

    /// Route and launch one task. On success it becomes the current task;
    /// on dispatch failure an ERROR event is emitted and the slot stays
    /// free.
    fn start(&mut self, admitted: Admitted) {
        let id = admitted.id();
        let profile = admitted.profile;
        let route = scoring::decide_route(&profile, &self.config, self.status);

        self.emit(TaskEvent::Routed {
            id,
            route,
            complexity: profile.complexity,
            priority: profile.priority,
            realtime: profile.realtime,
            privacy: profile.privacy,
        });

        let executor = match route {
            Route::Local if self.status.local_model_loaded => {
                self.executors.engine.clone().map(ExecutorKind::Local)
            }
            Route::Cloud if self.status.cloud_available => {
                self.executors.cloud.clone().map(ExecutorKind::Cloud)
            }
            _ => None,
        };
        let Some(executor) = executor else {
            let error = MurmurError::NoExecutorAvailable { route };
            warn!(id = %id, %route, "dispatch failed: no executor");
            self.emit(TaskEvent::Error {
                id,
                error: error.to_string(),
            });
            return;
        };

        let cancel = CancellationToken::new();
        tokio::spawn(run_task(
            admitted.task.clone(),
            executor,
            self.memory.clone(),
            self.events.clone(),
            self.done_tx.clone(),
            cancel.clone(),
        ));
        self.current = Some(Current { admitted, cancel });
    }

    fn snapshot(&self) -> StatusSnapshot {
        let (urgent, normal, background) = self.queue.counts();
        StatusSnapshot {
            queue_len: self.queue.len(),
            current: self.current.as_ref().map(|c| c.admitted.id()),
            urgent_count: urgent,
            normal_count: normal,
            background_count: background,
            mode: self.config.mode,
            executors: self.status,
        }
    }

    fn emit(&self, event: TaskEvent) {
        // A send error only means nobody is listening right now.
        let _ = self.events.send(event);
    }
}

/// One task's execution, run outside the scheduling loop.
async fn run_task(
    task: Task,
    executor: ExecutorKind,
    memory: Arc<MemoryEngine>,
    events: broadcast::Sender<TaskEvent>,
    done_tx: mpsc::Sender<TaskId>,
    cancel: CancellationToken,
) {
    let id = task.id;
    execute(&task, executor, &memory, &events, &cancel).await;
    let _ = done_tx.send(id).await;
}

async fn execute(
    task: &Task,
    executor: ExecutorKind,
    memory: &MemoryEngine,
    events: &broadcast::Sender<TaskEvent>,
    cancel: &CancellationToken,
) {
    use futures::StreamExt;

    let id = task.id;

    // Memory failures never fail the task: fall back to the raw message.
    let context = match memory.assemble_context(&task.text).await {
        Ok(context) => context,
        Err(e) => {
            warn!(id = %id, error = %e, "context assembly failed, using raw message");
            task.text.clone()
        }
    };
    if let Err(e) = memory
        .record_turn(&task.channel, &task.user, "user", &task.text)
        .await
    {
        warn!(id = %id, error = %e, "failed to record user turn");
    }

    let stream = match &executor {
        ExecutorKind::Local(engine) => engine.generate(&context, cancel.clone()).await,
        ExecutorKind::Cloud(cloud) => {
            cloud
                .chat_stream(vec![ChatMessage::user(context.clone())], cancel.clone())
                .await
        }
    };
    let mut stream = match stream {
        Ok(stream) => stream,
        Err(e) => {
            let _ = events.send(TaskEvent::Error {
                id,
                error: e.to_string(),
            });
            return;
        }
    };

    let mut response = String::new();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            item = stream.next() => match item {
                Some(Ok(token)) => {
                    let _ = events.send(TaskEvent::Stream {
                        id,
                        token: token.clone(),
                    });
                    response.push_str(&token);
                }
                Some(Err(e)) => {
                    // Tokens already streamed are not retracted.
                    let _ = events.send(TaskEvent::Error {
                        id,
                        error: e.to_string(),
                    });
                    return;
                }
                None => break,
            },
        }
    }
    if cancel.is_cancelled() {
        return;
    }

    // Store-side failures are logged, never surfaced to the submitter.
    if let Err(e) = memory
        .record_turn(&task.channel, &task.user, "assistant", &response)
        .await
    {
        warn!(id = %id, error = %e, "failed to record assistant turn");
    }
    let _ = events.send(TaskEvent::Complete { id, response });
}
