//! Recursive folder-size aggregation.
//!
//! Walks a directory tree through a [`DirectoryLister`] and sums the sizes of all non-directory
//! entries. Symlinks below the root are never followed nor counted, which keeps cycles out.
//! The root itself may be a symlink to a directory.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::ignore_poison::IgnorePoison;
use crate::lister::{DirectoryLister, ListerError};

/// Partial results are reported at most this often.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(300);

/// Lifecycle of one aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationState {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl AggregationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Final result of [`DirectorySizeAggregator::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregationOutcome {
    Completed { total: u64 },
    /// `partial` is the sum accumulated before cancellation was observed.
    Cancelled { partial: u64 },
    /// The root directory itself could not be listed.
    Failed { error: ListerError },
}

impl AggregationOutcome {
    pub fn state(&self) -> AggregationState {
        match self {
            Self::Completed { .. } => AggregationState::Completed,
            Self::Cancelled { .. } => AggregationState::Cancelled,
            Self::Failed { .. } => AggregationState::Failed,
        }
    }
}

/// Read-only view of an aggregator's state, shareable with other threads.
#[derive(Debug, Clone)]
pub struct AggregationStatus {
    state: Arc<Mutex<AggregationState>>,
}

impl AggregationStatus {
    pub fn get(&self) -> AggregationState {
        *self.state.lock_ignore_poison()
    }
}

/// Computes the total size of one directory tree.
#[derive(Debug)]
pub struct DirectorySizeAggregator {
    root: String,
    cancelled: Arc<AtomicBool>,
    progress_interval: Duration,
    state: Arc<Mutex<AggregationState>>,
}

impl DirectorySizeAggregator {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            cancelled: Arc::new(AtomicBool::new(false)),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            state: Arc::new(Mutex::new(AggregationState::Pending)),
        }
    }

    /// Shares an externally owned cancellation flag.
    pub fn with_cancel_flag(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn status(&self) -> AggregationStatus {
        AggregationStatus {
            state: Arc::clone(&self.state),
        }
    }

    /// Requests cancellation. Takes effect at the next check between children.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Moves to `next` unless the current state is terminal.
    fn transition(&self, next: AggregationState) -> bool {
        let mut state = self.state.lock_ignore_poison();
        if state.is_terminal() {
            log::debug!("DirectorySizeAggregator: ignoring {:?} -> {:?} for {}", *state, next, self.root);
            return false;
        }
        *state = next;
        true
    }

    fn finish(&self, outcome: AggregationOutcome) -> AggregationOutcome {
        self.transition(outcome.state());
        outcome
    }

    /// Walks the tree, calling `on_progress` with the running total at most once per
    /// progress interval and only when it grew. Blocks until done or cancelled.
    ///
    /// Subdirectories that cannot be listed contribute zero; only a failure on the root
    /// fails the whole aggregation.
    pub fn run(self, lister: &dyn DirectoryLister, mut on_progress: impl FnMut(u64)) -> AggregationOutcome {
        if !self.transition(AggregationState::Running) {
            return AggregationOutcome::Cancelled { partial: 0 };
        }
        if self.is_cancelled() {
            return self.finish(AggregationOutcome::Cancelled { partial: 0 });
        }

        let started = Instant::now();
        let root_children = match lister.list(&self.root) {
            Ok(children) => children,
            Err(error) => {
                log::warn!("DirectorySizeAggregator: cannot list root {}: {}", self.root, error);
                return self.finish(AggregationOutcome::Failed { error });
            }
        };

        let mut total = 0u64;
        let mut last_reported = 0u64;
        let mut last_progress_time = Instant::now();
        let mut pending: Vec<String> = Vec::new();
        let mut listing = Some(root_children);

        loop {
            let children = match listing.take() {
                Some(children) => children,
                None => {
                    let Some(dir) = pending.pop() else {
                        break;
                    };
                    if self.is_cancelled() {
                        return self.finish(AggregationOutcome::Cancelled { partial: total });
                    }
                    match lister.list(&dir) {
                        Ok(children) => children,
                        Err(error) => {
                            log::debug!("DirectorySizeAggregator: skipping unreadable {}: {}", dir, error);
                            continue;
                        }
                    }
                }
            };

            let mut subdirs = Vec::new();
            for child in children {
                if self.is_cancelled() {
                    return self.finish(AggregationOutcome::Cancelled { partial: total });
                }
                if child.is_symlink {
                    continue;
                }
                if child.is_directory {
                    subdirs.push(child.path);
                    continue;
                }
                total = total.saturating_add(child.size.unwrap_or(0));
                if total != last_reported && last_progress_time.elapsed() >= self.progress_interval {
                    on_progress(total);
                    last_reported = total;
                    last_progress_time = Instant::now();
                }
            }
            // Reversed so the first listed subdirectory is the next one popped
            pending.extend(subdirs.into_iter().rev());
        }

        if self.is_cancelled() {
            return self.finish(AggregationOutcome::Cancelled { partial: total });
        }
        log::debug!(
            "DirectorySizeAggregator: root={}, total={}, took={}ms",
            self.root,
            total,
            started.elapsed().as_millis()
        );
        self.finish(AggregationOutcome::Completed { total })
    }
}
