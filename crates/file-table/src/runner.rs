//! Background task runner.
//!
//! Each scheduled task runs on its own thread and talks back through one `mpsc` channel.
//! Nothing a worker produces is applied until the owning thread calls [`TaskRunner::pump`]:
//! callbacks run there, with mutable access to the owner's state and no locking.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Unique id of a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(Uuid);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a task finished without a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The work closure panicked. Holds the panic message.
    Panicked(String),
    /// The worker thread could not be started.
    SpawnFailed(String),
}

impl std::fmt::Display for TaskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Panicked(msg) => write!(f, "Task panicked: {}", msg),
            Self::SpawnFailed(msg) => write!(f, "Failed to start task thread: {}", msg),
        }
    }
}

impl std::error::Error for TaskError {}

/// Owner-side handle of a scheduled task.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: TaskId,
    cancelled: Arc<AtomicBool>,
}

impl TaskHandle {
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Asks the work to stop. The task still completes through `on_done`.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

enum TaskMessage<P, T> {
    Progress(P),
    Done(Result<T, TaskError>),
}

struct Envelope<P, T> {
    id: TaskId,
    message: TaskMessage<P, T>,
}

/// Worker-side view of a task.
pub struct TaskContext<P, T> {
    id: TaskId,
    cancelled: Arc<AtomicBool>,
    sender: Sender<Envelope<P, T>>,
}

impl<P, T> TaskContext<P, T> {
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// The shared cancellation flag, for workers that poll it themselves.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Sends a progress value to the owner. Values arrive in the order they were reported.
    pub fn report(&self, progress: P) {
        // The owner may already be gone; nothing left to tell then
        let _ = self.sender.send(Envelope {
            id: self.id,
            message: TaskMessage::Progress(progress),
        });
    }
}

type ProgressCallback<C, P> = Box<dyn FnMut(&mut C, P)>;
type DoneCallback<C, T> = Box<dyn FnOnce(&mut C, Result<T, TaskError>)>;

struct PendingTask<C, P, T> {
    cancelled: Arc<AtomicBool>,
    on_progress: ProgressCallback<C, P>,
    on_done: DoneCallback<C, T>,
}

/// Runs work off the owner's thread and delivers its results back on it.
///
/// `C` is the owner state the callbacks mutate, `P` the progress type, `T` the result type.
pub struct TaskRunner<C, P, T> {
    sender: Sender<Envelope<P, T>>,
    receiver: Receiver<Envelope<P, T>>,
    pending: HashMap<TaskId, PendingTask<C, P, T>>,
}

impl<C, P, T> Default for TaskRunner<C, P, T>
where
    P: Send + 'static,
    T: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<C, P, T> std::fmt::Debug for TaskRunner<C, P, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRunner").field("in_flight", &self.pending.len()).finish()
    }
}

impl<C, P, T> TaskRunner<C, P, T>
where
    P: Send + 'static,
    T: Send + 'static,
{
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            pending: HashMap::new(),
        }
    }

    /// Starts `work` on a new thread.
    ///
    /// `on_progress` runs for each reported value until the task is cancelled; `on_done` runs
    /// exactly once, with `Err` if the work panicked.
    pub fn schedule<W>(
        &mut self,
        work: W,
        on_progress: impl FnMut(&mut C, P) + 'static,
        on_done: impl FnOnce(&mut C, Result<T, TaskError>) + 'static,
    ) -> TaskHandle
    where
        W: FnOnce(&TaskContext<P, T>) -> T + Send + 'static,
    {
        let id = TaskId(Uuid::new_v4());
        let cancelled = Arc::new(AtomicBool::new(false));
        self.pending.insert(
            id,
            PendingTask {
                cancelled: Arc::clone(&cancelled),
                on_progress: Box::new(on_progress),
                on_done: Box::new(on_done),
            },
        );

        let context = TaskContext {
            id,
            cancelled: Arc::clone(&cancelled),
            sender: self.sender.clone(),
        };
        let spawned = std::thread::Builder::new()
            .name(format!("task-{}", id))
            .spawn(move || {
                let result = catch_unwind(AssertUnwindSafe(|| work(&context))).map_err(|payload| {
                    let message = panic_message(payload.as_ref());
                    log::error!("TaskRunner: task {} panicked: {}", context.id, message);
                    TaskError::Panicked(message)
                });
                let _ = context.sender.send(Envelope {
                    id: context.id,
                    message: TaskMessage::Done(result),
                });
            });

        if let Err(e) = spawned {
            log::error!("TaskRunner: failed to spawn task {}: {}", id, e);
            // Delivered on the next pump, like any other completion
            let _ = self.sender.send(Envelope {
                id,
                message: TaskMessage::Done(Err(TaskError::SpawnFailed(e.to_string()))),
            });
        }

        TaskHandle { id, cancelled }
    }

    /// Applies every message that has arrived so far. Never blocks.
    /// Returns the number of callbacks run.
    pub fn pump(&mut self, owner: &mut C) -> usize {
        let mut handled = 0;
        while let Ok(envelope) = self.receiver.try_recv() {
            handled += usize::from(self.dispatch(owner, envelope));
        }
        handled
    }

    /// Waits up to `timeout` for the first message, then drains like [`pump`](Self::pump).
    pub fn pump_timeout(&mut self, owner: &mut C, timeout: Duration) -> usize {
        if self.pending.is_empty() {
            return self.pump(owner);
        }
        match self.receiver.recv_timeout(timeout) {
            Ok(envelope) => {
                let first = usize::from(self.dispatch(owner, envelope));
                first + self.pump(owner)
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => 0,
        }
    }

    /// Pumps until no task is in flight or `timeout` elapses. Returns true when idle.
    pub fn wait_idle(&mut self, owner: &mut C, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        self.pump(owner);
        while !self.pending.is_empty() {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            self.pump_timeout(owner, deadline - now);
        }
        true
    }

    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Whether the task has not yet completed through `on_done`.
    pub fn is_pending(&self, id: TaskId) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    /// Returns true if a callback ran.
    fn dispatch(&mut self, owner: &mut C, envelope: Envelope<P, T>) -> bool {
        match envelope.message {
            TaskMessage::Progress(progress) => match self.pending.get_mut(&envelope.id) {
                Some(task) if !task.cancelled.load(Ordering::Relaxed) => {
                    (task.on_progress)(owner, progress);
                    true
                }
                _ => false,
            },
            TaskMessage::Done(result) => match self.pending.remove(&envelope.id) {
                Some(task) => {
                    (task.on_done)(owner, result);
                    true
                }
                None => false,
            },
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
