//! The ordered entry store behind one file table pane.
//!
//! All access happens on the thread that owns the pane. Background workers never touch the
//! model; their results are handed back and applied through [`EntryTableModel::set_computed_size`].

use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::collections::{HashMap, HashSet};

use crate::entry::{EntryKind, EntryRecord, SizeComputationState};
use crate::marks::{MarkPolicy, MarkSet};
use crate::notifier::{ChangeNotifier, SubscriptionId, TableEvent};
use crate::sorting::{SortOrder, sort_entries};

/// Errors raised by the table model. Only programmer misuse ends up here:
/// asynchronous races (stale size results and the like) are absorbed silently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// Row index beyond the current row count.
    IndexOutOfRange { index: usize, len: usize },
}

impl std::fmt::Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IndexOutOfRange { index, len } => {
                write!(f, "Row index {} out of range (table has {} rows)", index, len)
            }
        }
    }
}

impl std::error::Error for TableError {}

/// Statistics about the current listing, for the selection info line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingStats {
    /// Total number of files (not directories)
    pub total_files: usize,
    /// Total number of directories
    pub total_dirs: usize,
    /// Total size of all files in bytes
    pub total_file_size: u64,
    pub marked_files: usize,
    pub marked_dirs: usize,
    /// Marked file bytes plus the computed sizes of marked directories
    pub marked_size: u64,
}

/// Sorted, markable view over one directory's entries.
///
/// Row 0 is the ".." entry when the listing has one; every other row is a real entry.
/// After every public mutating call returns, rows are sorted by the current [`SortOrder`].
#[derive(Debug)]
pub struct EntryTableModel {
    directory: Option<String>,
    parent: Option<EntryRecord>,
    /// Real entries in sort order, without the ".." row.
    pub(crate) entries: Vec<EntryRecord>,
    sort_order: SortOrder,
    pub(crate) marks: MarkSet,
    pub(crate) mark_policy: MarkPolicy,
    /// Path of the focused row, tracked by identity so it survives resorts.
    focused: Option<String>,
    /// path -> position in `entries`. Dropped on every structural change, rebuilt on demand.
    index_cache: OnceCell<HashMap<String, usize>>,
    notifier: ChangeNotifier<TableEvent>,
}

impl Default for EntryTableModel {
    fn default() -> Self {
        Self::new(SortOrder::default())
    }
}

impl EntryTableModel {
    pub fn new(sort_order: SortOrder) -> Self {
        Self {
            directory: None,
            parent: None,
            entries: Vec::new(),
            sort_order,
            marks: MarkSet::default(),
            mark_policy: MarkPolicy::default(),
            focused: None,
            index_cache: OnceCell::new(),
            notifier: ChangeNotifier::new(),
        }
    }

    pub fn with_mark_policy(mut self, policy: MarkPolicy) -> Self {
        self.mark_policy = policy;
        self
    }

    // ========================================================================
    // Population
    // ========================================================================

    /// Replaces the whole listing.
    ///
    /// Refreshing the same directory keeps marks, computed folder sizes, and focus for paths that
    /// are still present.
    /// Moving to a different directory clears all marks. Returns the row to focus: the
    /// previously focused path on refresh, the directory just left when moving to its parent,
    /// otherwise the first row.
    pub fn populate(
        &mut self,
        directory: impl Into<String>,
        entries: Vec<EntryRecord>,
        parent: Option<EntryRecord>,
    ) -> Option<usize> {
        let directory = directory.into();
        let previous_directory = self.directory.take();
        let same_directory = previous_directory.as_deref() == Some(directory.as_str());
        let marks_before = self.marks.len();

        if !same_directory {
            self.marks.clear();
        }

        // Folder sizes survive a refresh, like marks do
        let mut known_sizes: HashMap<String, (Option<u64>, SizeComputationState)> = if same_directory {
            self.entries
                .drain(..)
                .filter(|entry| entry.is_directory() && entry.size_state != SizeComputationState::None)
                .map(|entry| (entry.path, (entry.computed_size, entry.size_state)))
                .collect()
        } else {
            HashMap::new()
        };

        let mut seen = HashSet::with_capacity(entries.len());
        let mut rows = Vec::with_capacity(entries.len());
        for mut entry in entries {
            if entry.is_parent_ref() {
                log::debug!("populate: dropping '..' row passed as a regular entry ({})", entry.path);
                continue;
            }
            if !seen.insert(entry.path.clone()) {
                log::warn!("populate: duplicate path in listing, keeping the first: {}", entry.path);
                continue;
            }
            entry.marked = self.marks.contains(&entry.path);
            if entry.is_directory()
                && let Some((computed_size, size_state)) = known_sizes.remove(&entry.path)
            {
                entry.computed_size = computed_size;
                entry.size_state = size_state;
            }
            rows.push(entry);
        }
        self.marks.retain(|path| seen.contains(path));
        let marks_changed = marks_before != self.marks.len() || (!same_directory && marks_before > 0);

        self.parent = parent.map(|mut parent| {
            parent.kind = EntryKind::ParentRef;
            parent.marked = false;
            parent
        });
        self.entries = rows;
        sort_entries(&mut self.entries, &self.sort_order);
        self.invalidate_index();

        let preferred = if same_directory { self.focused.take() } else { previous_directory };
        self.directory = Some(directory);
        self.focused = preferred
            .filter(|path| self.index_of(path).is_some())
            .or_else(|| self.path_at(0));

        log::debug!(
            "populate: directory={}, rows={}, marks={}, same_directory={}",
            self.directory.as_deref().unwrap_or_default(),
            self.row_count_including_parent_ref(),
            self.marks.len(),
            same_directory
        );

        self.notifier.notify(&TableEvent::DataChanged { row: None });
        if marks_changed {
            self.notifier.notify(&TableEvent::MarksChanged);
        }
        self.notifier.notify(&TableEvent::SelectionChanged);
        self.focused_index()
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    pub fn current_directory(&self) -> Option<&str> {
        self.directory.as_deref()
    }

    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    pub fn parent_entry(&self) -> Option<&EntryRecord> {
        self.parent.as_ref()
    }

    /// Number of rows, the ".." row included.
    pub fn row_count_including_parent_ref(&self) -> usize {
        self.entries.len() + self.offset()
    }

    /// Number of real entries, the ".." row excluded.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count_including_parent_ref() == 0
    }

    /// Index of the first row that can be marked.
    pub fn first_markable_index(&self) -> usize {
        self.offset()
    }

    /// Row at `index`, the ".." row being row 0 when present.
    pub fn entry_at(&self, index: usize) -> Result<&EntryRecord, TableError> {
        self.row(index).ok_or_else(|| {
            let len = self.row_count_including_parent_ref();
            log::error!("entry_at: index {} out of bounds (table has {} rows)", index, len);
            TableError::IndexOutOfRange { index, len }
        })
    }

    /// Row index of the entry with the given path, if present.
    pub fn index_of(&self, path: &str) -> Option<usize> {
        if let Some(parent) = &self.parent
            && parent.path == path
        {
            return Some(0);
        }
        self.position_of(path).map(|position| position + self.offset())
    }

    /// Real entries in display order, without the ".." row.
    pub fn entries(&self) -> impl Iterator<Item = &EntryRecord> {
        self.entries.iter()
    }

    /// All rows in display order, ".." first.
    pub fn rows(&self) -> impl Iterator<Item = &EntryRecord> {
        self.parent.iter().chain(self.entries.iter())
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    pub fn mark_policy(&self) -> MarkPolicy {
        self.mark_policy
    }

    pub fn set_mark_policy(&mut self, policy: MarkPolicy) {
        self.mark_policy = policy;
    }

    // ========================================================================
    // Sorting
    // ========================================================================

    /// Re-sorts in place. Marks and focus follow their entries, not their row numbers.
    /// Returns the new row of the focused entry.
    pub fn set_sort_order(&mut self, order: SortOrder) -> Option<usize> {
        self.sort_order = order;
        self.resort()
    }

    /// Re-applies the current sort order. Size updates never reorder rows on their own,
    /// so callers sorting by size ask for this once a computation finishes.
    pub fn resort(&mut self) -> Option<usize> {
        sort_entries(&mut self.entries, &self.sort_order);
        self.invalidate_index();
        self.notifier.notify(&TableEvent::DataChanged { row: None });
        self.focused_index()
    }

    // ========================================================================
    // Focus
    // ========================================================================

    pub fn focused_index(&self) -> Option<usize> {
        self.focused.as_deref().and_then(|path| self.index_of(path))
    }

    pub fn focused_entry(&self) -> Option<&EntryRecord> {
        self.focused_index().and_then(|index| self.row(index))
    }

    pub fn set_focused_index(&mut self, index: usize) -> Result<(), TableError> {
        let path = self.entry_at(index)?.path.clone();
        self.set_focus(Some(path));
        Ok(())
    }

    /// Focuses the entry with the given path. Returns false if it is not in the listing.
    pub fn focus_path(&mut self, path: &str) -> bool {
        if self.index_of(path).is_none() {
            return false;
        }
        self.set_focus(Some(path.to_string()));
        true
    }

    fn set_focus(&mut self, path: Option<String>) {
        if self.focused != path {
            self.focused = path;
            self.notifier.notify(&TableEvent::SelectionChanged);
        }
    }

    // ========================================================================
    // Incremental mutation
    // ========================================================================

    /// Inserts a new entry or replaces the one with the same path, keeping the sort order.
    /// The mark state of a replaced entry is preserved, and so are the computed size and
    /// size state when a directory replaces a directory.
    pub fn upsert_entry(&mut self, mut entry: EntryRecord) {
        if entry.is_parent_ref() {
            log::debug!("upsert_entry: ignoring '..' row {}", entry.path);
            return;
        }
        entry.marked = self.marks.contains(&entry.path);
        match self.position_of(&entry.path) {
            Some(position) => {
                let old = &self.entries[position];
                if old.is_directory() && entry.is_directory() {
                    entry.computed_size = old.computed_size;
                    entry.size_state = old.size_state;
                }
                self.entries[position] = entry;
            }
            None => self.entries.push(entry),
        }
        sort_entries(&mut self.entries, &self.sort_order);
        self.invalidate_index();
        self.notifier.notify(&TableEvent::DataChanged { row: None });
    }

    /// Removes the entry with the given path (delete or rename-away event).
    /// Focus moves to the row that takes its place.
    pub fn remove_entry(&mut self, path: &str) -> Option<EntryRecord> {
        let position = self.position_of(path)?;
        let focused_removed = self.focused.as_deref() == Some(path);
        let removed = self.entries.remove(position);
        self.invalidate_index();
        let was_marked = self.marks.remove(path);

        if focused_removed {
            let row = (position + self.offset()).min(self.row_count_including_parent_ref().saturating_sub(1));
            let next = self.path_at(row);
            self.set_focus(next);
        }

        self.notifier.notify(&TableEvent::DataChanged { row: None });
        if was_marked {
            self.notifier.notify(&TableEvent::MarksChanged);
        }
        Some(removed)
    }

    // ========================================================================
    // Folder sizes
    // ========================================================================

    /// Flags a directory as having a size computation in flight.
    /// Returns false if the path is not a directory row of this listing.
    pub fn begin_size_computation(&mut self, path: &str) -> bool {
        let Some(row) = self.index_of(path) else {
            return false;
        };
        let Some(entry) = self.directory_entry_mut(path) else {
            return false;
        };
        entry.size_state = SizeComputationState::InProgress;
        self.notifier.notify(&TableEvent::DataChanged { row: Some(row) });
        true
    }

    /// Stores a partial (`is_final == false`) or final directory size.
    ///
    /// A path that is no longer in the listing is silently ignored: the directory was
    /// refreshed or left while the computation ran. The row keeps its position.
    /// Returns the updated row.
    pub fn set_computed_size(&mut self, path: &str, size: u64, is_final: bool) -> Option<usize> {
        let Some(row) = self.index_of(path) else {
            log::debug!("set_computed_size: stale target ignored: {}", path);
            return None;
        };
        let entry = self.directory_entry_mut(path)?;
        entry.computed_size = Some(size);
        entry.size_state = if is_final {
            SizeComputationState::Done
        } else {
            SizeComputationState::InProgress
        };
        self.notifier.notify(&TableEvent::DataChanged { row: Some(row) });
        Some(row)
    }

    /// Records that the directory's size could not be computed: the size becomes "unknown".
    pub fn mark_size_failed(&mut self, path: &str) -> Option<usize> {
        let Some(row) = self.index_of(path) else {
            log::debug!("mark_size_failed: stale target ignored: {}", path);
            return None;
        };
        let entry = self.directory_entry_mut(path)?;
        entry.computed_size = None;
        entry.size_state = SizeComputationState::Failed;
        self.notifier.notify(&TableEvent::DataChanged { row: Some(row) });
        Some(row)
    }

    /// Ends a cancelled computation. The last partial size stays visible.
    pub fn clear_size_computation(&mut self, path: &str) -> Option<usize> {
        let row = self.index_of(path)?;
        let entry = self.directory_entry_mut(path)?;
        if entry.size_state != SizeComputationState::InProgress {
            return None;
        }
        entry.size_state = SizeComputationState::None;
        self.notifier.notify(&TableEvent::DataChanged { row: Some(row) });
        Some(row)
    }

    // ========================================================================
    // Statistics
    // ========================================================================

    pub fn listing_stats(&self) -> ListingStats {
        let mut stats = ListingStats::default();
        for entry in &self.entries {
            if entry.is_directory() {
                stats.total_dirs += 1;
                if entry.marked {
                    stats.marked_dirs += 1;
                    stats.marked_size += entry.computed_size.unwrap_or(0);
                }
            } else {
                stats.total_files += 1;
                let size = entry.size.unwrap_or(0);
                stats.total_file_size += size;
                if entry.marked {
                    stats.marked_files += 1;
                    stats.marked_size += size;
                }
            }
        }
        stats
    }

    // ========================================================================
    // Observers
    // ========================================================================

    pub fn subscribe(&self, handler: impl FnMut(&TableEvent) + 'static) -> SubscriptionId {
        self.notifier.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    pub fn notifier(&self) -> &ChangeNotifier<TableEvent> {
        &self.notifier
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    pub(crate) fn offset(&self) -> usize {
        usize::from(self.parent.is_some())
    }

    pub(crate) fn row(&self, index: usize) -> Option<&EntryRecord> {
        match (&self.parent, index) {
            (Some(parent), 0) => Some(parent),
            _ => self.entries.get(index.checked_sub(self.offset())?),
        }
    }

    fn path_at(&self, index: usize) -> Option<String> {
        self.row(index).map(|entry| entry.path.clone())
    }

    /// Position in `entries` (not a row index).
    pub(crate) fn position_of(&self, path: &str) -> Option<usize> {
        self.index_cache
            .get_or_init(|| {
                self.entries
                    .iter()
                    .enumerate()
                    .map(|(position, entry)| (entry.path.clone(), position))
                    .collect()
            })
            .get(path)
            .copied()
    }

    fn directory_entry_mut(&mut self, path: &str) -> Option<&mut EntryRecord> {
        let position = self.position_of(path)?;
        let entry = &mut self.entries[position];
        entry.is_directory().then_some(entry)
    }

    fn invalidate_index(&mut self) {
        self.index_cache.take();
    }

    pub(crate) fn notify(&self, event: TableEvent) {
        self.notifier.notify(&event);
    }
}
