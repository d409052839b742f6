//! One file pane: the table model, its folder-size calculator, and the lister feeding both.

use std::sync::Arc;
use std::time::Duration;

use crate::entry::EntryRecord;
use crate::lister::{DirectoryLister, ListerError};
use crate::model::EntryTableModel;
use crate::settings::TableSettings;
use crate::size_calculator::SizeCalculator;

#[derive(Debug)]
pub struct FilePane {
    model: EntryTableModel,
    sizes: SizeCalculator,
    lister: Arc<dyn DirectoryLister>,
    show_parent_folder: bool,
}

impl FilePane {
    pub fn new(lister: Arc<dyn DirectoryLister>, settings: &TableSettings) -> Self {
        let model = EntryTableModel::new(settings.sort_order()).with_mark_policy(settings.mark_policy());
        let sizes =
            SizeCalculator::new(Arc::clone(&lister)).with_progress_interval(settings.size_progress_interval());
        Self {
            model,
            sizes,
            lister,
            show_parent_folder: settings.show_parent_folder,
        }
    }

    pub fn model(&self) -> &EntryTableModel {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut EntryTableModel {
        &mut self.model
    }

    pub fn current_directory(&self) -> Option<&str> {
        self.model.current_directory()
    }

    /// Lists `directory` and replaces the table contents. Returns the row to focus.
    ///
    /// Moving to another directory cancels every folder-size computation first. On a listing
    /// error the table keeps showing the previous directory.
    pub fn load(&mut self, directory: &str) -> Result<Option<usize>, ListerError> {
        let raw = self.lister.list(directory)?;
        if self.model.current_directory() != Some(directory) {
            self.sizes.cancel_all();
        }
        // Results still queued refer to the old listing; applying them now lets stale ones drop out
        self.sizes.pump(&mut self.model);

        let entries: Vec<EntryRecord> = raw.into_iter().map(EntryRecord::from).collect();
        let parent = if self.show_parent_folder {
            self.lister.parent_of(directory).map(EntryRecord::parent_ref)
        } else {
            None
        };
        Ok(self.model.populate(directory, entries, parent))
    }

    /// Re-lists the current directory, keeping marks and focus where entries survived.
    pub fn refresh(&mut self) -> Result<Option<usize>, ListerError> {
        let Some(directory) = self.model.current_directory().map(str::to_string) else {
            return Ok(None);
        };
        self.load(&directory)
    }

    /// Moves to the parent directory, focusing the directory just left.
    /// Returns `Ok(None)` without doing anything at a root.
    pub fn go_to_parent(&mut self) -> Result<Option<usize>, ListerError> {
        let Some(parent) = self
            .model
            .current_directory()
            .and_then(|directory| self.lister.parent_of(directory))
        else {
            return Ok(None);
        };
        self.load(&parent)
    }

    /// Enters the focused row if it is a directory (".." included).
    /// Returns `Ok(None)` when nothing was entered.
    pub fn open_focused(&mut self) -> Result<Option<usize>, ListerError> {
        let Some(target) = self
            .model
            .focused_entry()
            .filter(|entry| entry.is_directory())
            .map(|entry| entry.path.clone())
        else {
            return Ok(None);
        };
        self.load(&target)
    }

    /// Starts a size computation for the focused directory.
    pub fn calculate_focused_size(&mut self) -> bool {
        let Some(path) = self.model.focused_entry().map(|entry| entry.path.clone()) else {
            return false;
        };
        self.sizes.request(&mut self.model, &path)
    }

    pub fn calculate_size(&mut self, path: &str) -> bool {
        self.sizes.request(&mut self.model, path)
    }

    /// Starts size computations for all marked directories.
    pub fn calculate_marked_sizes(&mut self) -> usize {
        self.sizes.request_marked(&mut self.model)
    }

    pub fn cancel_size(&mut self, path: &str) -> bool {
        self.sizes.cancel(path)
    }

    pub fn cancel_all_sizes(&mut self) {
        self.sizes.cancel_all();
    }

    pub fn is_calculating(&self, path: &str) -> bool {
        self.sizes.is_calculating(path)
    }

    pub fn sizes_in_flight(&self) -> usize {
        self.sizes.in_flight()
    }

    /// Applies background results that arrived so far. Call from the owning event loop.
    pub fn pump(&mut self) -> usize {
        self.sizes.pump(&mut self.model)
    }

    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        self.sizes.wait_idle(&mut self.model, timeout)
    }
}
