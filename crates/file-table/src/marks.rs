//! Mark set and the marking operations of the table model.
//!
//! Marks are keyed by entry path, so they follow entries through resorts and survive a refresh
//! of the same directory. Every mutating call emits at most one `MarksChanged`, and only when
//! the set of marked paths actually changed.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::entry::EntryRecord;
use crate::model::{EntryTableModel, TableError};
use crate::notifier::TableEvent;

/// How bulk mark operations treat directories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkPolicy {
    /// When false, "mark all" and "invert" only touch non-directories.
    pub mark_folders_with_files: bool,
}

impl MarkPolicy {
    pub fn includes(&self, entry: &EntryRecord) -> bool {
        self.mark_folders_with_files || !entry.is_directory()
    }
}

/// Paths of the currently marked entries. Never contains the ".." row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkSet {
    paths: HashSet<String>,
}

impl MarkSet {
    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    pub(crate) fn insert(&mut self, path: &str) -> bool {
        self.paths.insert(path.to_string())
    }

    pub(crate) fn remove(&mut self, path: &str) -> bool {
        self.paths.remove(path)
    }

    pub(crate) fn clear(&mut self) {
        self.paths.clear();
    }

    pub(crate) fn retain(&mut self, keep: impl FnMut(&String) -> bool) {
        self.paths.retain(keep);
    }
}

impl EntryTableModel {
    pub fn marks(&self) -> &MarkSet {
        &self.marks
    }

    pub fn is_marked(&self, path: &str) -> bool {
        self.marks.contains(path)
    }

    pub fn is_marked_at(&self, index: usize) -> Result<bool, TableError> {
        Ok(self.entry_at(index)?.marked)
    }

    pub fn marked_count(&self) -> usize {
        self.marks.len()
    }

    /// Marked entries in display order.
    pub fn marked_entries(&self) -> Vec<EntryRecord> {
        self.entries.iter().filter(|entry| entry.marked).cloned().collect()
    }

    /// Marked paths in display order.
    pub fn marked_paths(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| entry.marked)
            .map(|entry| entry.path.clone())
            .collect()
    }

    /// Marks or unmarks the entry with the given path.
    /// Unknown paths and the ".." row are ignored. No event is emitted when membership is unchanged.
    pub fn set_marked(&mut self, path: &str, marked: bool) {
        let Some(position) = self.position_of(path) else {
            log::debug!("set_marked: path not in listing: {}", path);
            return;
        };
        let changed = self.apply_mark(position, marked);
        self.finish_mark_batch(changed);
    }

    /// Marks or unmarks the row at `index`. Row 0 is a no-op when it is the ".." row.
    pub fn set_marked_at(&mut self, index: usize, marked: bool) -> Result<(), TableError> {
        self.entry_at(index)?;
        if let Some(position) = index.checked_sub(self.offset()) {
            let changed = self.apply_mark(position, marked);
            self.finish_mark_batch(changed);
        }
        Ok(())
    }

    /// Flips the mark of the row at `index`. Returns the new state (false for the ".." row).
    pub fn toggle_marked_at(&mut self, index: usize) -> Result<bool, TableError> {
        let entry = self.entry_at(index)?;
        if !entry.is_markable() {
            return Ok(false);
        }
        let marked = !entry.marked;
        self.set_marked_at(index, marked)?;
        Ok(marked)
    }

    /// Marks or unmarks every row between `from` and `to`, both inclusive, in either order.
    /// The ".." row is skipped. Both ends must be valid row indices.
    pub fn set_range_marked(&mut self, from: usize, to: usize, marked: bool) -> Result<(), TableError> {
        let (low, high) = if from <= to { (from, to) } else { (to, from) };
        self.entry_at(high)?;

        let start = low.max(self.offset()) - self.offset();
        let end = high.checked_sub(self.offset());
        let mut changed = false;
        if let Some(end) = end {
            for position in start..=end {
                changed |= self.apply_mark(position, marked);
            }
        }
        self.finish_mark_batch(changed);
        Ok(())
    }

    /// Inverts the mark of every entry the mark policy covers.
    /// With the default policy, directories are left alone.
    pub fn invert_marks(&mut self) {
        let policy = self.mark_policy;
        self.invert_marks_matching(|entry| policy.includes(entry));
    }

    /// Inverts the mark of every entry accepted by `filter`; others keep their state.
    pub fn invert_marks_matching(&mut self, mut filter: impl FnMut(&EntryRecord) -> bool) {
        let mut changed = false;
        for position in 0..self.entries.len() {
            if filter(&self.entries[position]) {
                let marked = !self.entries[position].marked;
                changed |= self.apply_mark(position, marked);
            }
        }
        self.finish_mark_batch(changed);
    }

    /// Marks (or unmarks) every entry accepted by `filter`.
    /// Emits one `MarksChanged` for the whole batch, none if membership is unchanged.
    pub fn mark_by_filter(&mut self, mut filter: impl FnMut(&EntryRecord) -> bool, marked: bool) {
        let mut changed = false;
        for position in 0..self.entries.len() {
            if filter(&self.entries[position]) {
                changed |= self.apply_mark(position, marked);
            }
        }
        self.finish_mark_batch(changed);
    }

    /// Marks every entry the mark policy covers, or unmarks everything.
    pub fn mark_all(&mut self, marked: bool) {
        if marked {
            let policy = self.mark_policy;
            self.mark_by_filter(|entry| policy.includes(entry), true);
        } else {
            self.clear_marks();
        }
    }

    pub fn clear_marks(&mut self) {
        self.mark_by_filter(|_| true, false);
    }

    /// Keeps the per-entry flag and the path set in step. Returns whether anything changed.
    fn apply_mark(&mut self, position: usize, marked: bool) -> bool {
        let Some(entry) = self.entries.get_mut(position) else {
            return false;
        };
        if !entry.is_markable() || entry.marked == marked {
            return false;
        }
        entry.marked = marked;
        if marked {
            self.marks.insert(&entry.path)
        } else {
            self.marks.remove(&entry.path)
        }
    }

    fn finish_mark_batch(&self, changed: bool) {
        if changed {
            self.notify(TableEvent::MarksChanged);
        }
    }
}
