//! Schedules folder-size aggregations for directory rows and feeds results into the model.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::aggregator::{AggregationOutcome, DEFAULT_PROGRESS_INTERVAL, DirectorySizeAggregator};
use crate::entry::SizeComputationState;
use crate::lister::DirectoryLister;
use crate::model::EntryTableModel;
use crate::runner::{TaskError, TaskHandle, TaskRunner};

/// One in-flight aggregator per directory path.
pub struct SizeCalculator {
    runner: TaskRunner<EntryTableModel, u64, AggregationOutcome>,
    lister: Arc<dyn DirectoryLister>,
    jobs: HashMap<String, TaskHandle>,
    progress_interval: Duration,
}

impl std::fmt::Debug for SizeCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SizeCalculator")
            .field("jobs", &self.jobs.keys().collect::<Vec<_>>())
            .field("progress_interval", &self.progress_interval)
            .finish()
    }
}

impl SizeCalculator {
    pub fn new(lister: Arc<dyn DirectoryLister>) -> Self {
        Self {
            runner: TaskRunner::new(),
            lister,
            jobs: HashMap::new(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Starts computing the size of the directory at `path`.
    ///
    /// Returns false (and does nothing) for paths not in the listing, non-directories, the ".."
    /// row, and directories whose size is already known or being computed.
    pub fn request(&mut self, model: &mut EntryTableModel, path: &str) -> bool {
        let Some(entry) = model.index_of(path).and_then(|index| model.entry_at(index).ok()) else {
            log::debug!("SizeCalculator::request: not in listing: {}", path);
            return false;
        };
        if entry.is_parent_ref() || !entry.is_directory() {
            return false;
        }
        if matches!(
            entry.size_state,
            SizeComputationState::Done | SizeComputationState::InProgress
        ) {
            return false;
        }
        if !model.begin_size_computation(path) {
            return false;
        }

        let root = path.to_string();
        let lister = Arc::clone(&self.lister);
        let interval = self.progress_interval;
        let progress_path = root.clone();
        let done_path = root.clone();

        let handle = self.runner.schedule(
            move |context| {
                DirectorySizeAggregator::new(root)
                    .with_cancel_flag(context.cancel_flag())
                    .with_progress_interval(interval)
                    .run(lister.as_ref(), |partial| context.report(partial))
            },
            move |model: &mut EntryTableModel, partial| {
                model.set_computed_size(&progress_path, partial, false);
            },
            move |model: &mut EntryTableModel, result: Result<AggregationOutcome, TaskError>| {
                apply_outcome(model, &done_path, result);
            },
        );
        log::debug!("SizeCalculator: started task {} for {}", handle.id(), path);
        self.jobs.insert(path.to_string(), handle);
        true
    }

    /// Requests every marked directory. Returns how many computations were started.
    pub fn request_marked(&mut self, model: &mut EntryTableModel) -> usize {
        let marked_dirs: Vec<String> = model
            .entries()
            .filter(|entry| entry.marked && entry.is_directory())
            .map(|entry| entry.path.clone())
            .collect();
        marked_dirs.iter().filter(|path| self.request(model, path)).count()
    }

    /// Cancels the computation for `path`. Its final state is applied on the next pump.
    pub fn cancel(&mut self, path: &str) -> bool {
        match self.jobs.remove(path) {
            Some(handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        if !self.jobs.is_empty() {
            log::debug!("SizeCalculator: cancelling {} computations", self.jobs.len());
        }
        for (_, handle) in self.jobs.drain() {
            handle.cancel();
        }
    }

    /// Number of aggregations whose completion has not been applied yet, cancelled ones included.
    pub fn in_flight(&self) -> usize {
        self.runner.in_flight()
    }

    /// Whether a live (not cancelled) computation exists for `path`.
    pub fn is_calculating(&self, path: &str) -> bool {
        self.jobs
            .get(path)
            .is_some_and(|handle| self.runner.is_pending(handle.id()))
    }

    /// Applies results that arrived so far. Returns the number of callbacks run.
    pub fn pump(&mut self, model: &mut EntryTableModel) -> usize {
        let handled = self.runner.pump(model);
        self.prune();
        handled
    }

    /// Pumps until every computation has completed or `timeout` elapses. Returns true when idle.
    pub fn wait_idle(&mut self, model: &mut EntryTableModel, timeout: Duration) -> bool {
        let idle = self.runner.wait_idle(model, timeout);
        self.prune();
        idle
    }

    fn prune(&mut self) {
        let runner = &self.runner;
        self.jobs.retain(|_, handle| runner.is_pending(handle.id()));
    }
}

fn apply_outcome(model: &mut EntryTableModel, path: &str, result: Result<AggregationOutcome, TaskError>) {
    match result {
        Ok(AggregationOutcome::Completed { total }) => {
            model.set_computed_size(path, total, true);
        }
        Ok(AggregationOutcome::Cancelled { .. }) => {
            model.clear_size_computation(path);
        }
        Ok(AggregationOutcome::Failed { error }) => {
            log::debug!("SizeCalculator: size of {} unavailable: {}", path, error);
            model.mark_size_failed(path);
        }
        Err(error) => {
            log::warn!("SizeCalculator: size task for {} failed: {}", path, error);
            model.mark_size_failed(path);
        }
    }
}
