//! User-defined file groups, used to color rows.
//!
//! Each group is a comma-separated list of masks. `*.ext` masks go into a hash lookup on the
//! lowercased extension; any other mask is matched against the name as a wildcard.

use regex::Regex;
use std::collections::HashMap;

use crate::entry::EntryRecord;
use crate::filters::wildcard_regex;

pub const MAX_FILE_GROUPS: usize = 10;

#[derive(Debug, Clone, Default)]
pub struct FileGroupResolver {
    extensions: HashMap<String, usize>,
    wildcards: Vec<(usize, Regex)>,
}

impl FileGroupResolver {
    /// Builds a resolver from up to [`MAX_FILE_GROUPS`] mask lists. Extra lists are ignored,
    /// masks that don't compile are skipped with a warning.
    pub fn from_masks(groups: &[String]) -> Self {
        let mut resolver = Self::default();
        if groups.len() > MAX_FILE_GROUPS {
            log::warn!(
                "FileGroupResolver: {} groups configured, only the first {} are used",
                groups.len(),
                MAX_FILE_GROUPS
            );
        }
        for (group, masks) in groups.iter().take(MAX_FILE_GROUPS).enumerate() {
            for mask in masks.split(',').map(str::trim).filter(|mask| !mask.is_empty()) {
                resolver.add_mask(group, mask);
            }
        }
        resolver
    }

    fn add_mask(&mut self, group: usize, mask: &str) {
        if let Some(ext) = mask.strip_prefix("*.")
            && !ext.is_empty()
            && !ext.contains(['*', '?', '.'])
        {
            self.extensions.entry(ext.to_lowercase()).or_insert(group);
            return;
        }
        match wildcard_regex(mask, false) {
            Ok(regex) => self.wildcards.push((group, regex)),
            Err(e) => log::warn!("FileGroupResolver: skipping mask '{}' in group {}: {}", mask, group, e),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty() && self.wildcards.is_empty()
    }

    /// Group of `entry`, or `None` for directories, symlinks, and unmatched entries.
    /// When several groups match, the lowest-numbered one wins.
    pub fn resolve(&self, entry: &EntryRecord) -> Option<usize> {
        if entry.is_directory() || entry.is_symlink() {
            return None;
        }
        let by_extension = entry
            .extension()
            .and_then(|ext| self.extensions.get(&ext.to_lowercase()).copied());
        let by_wildcard = self
            .wildcards
            .iter()
            .filter(|(_, regex)| regex.is_match(&entry.name))
            .map(|(group, _)| *group)
            .min();
        match (by_extension, by_wildcard) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}
