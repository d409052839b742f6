//! Persisted file table preferences.
//!
//! The settings file is a flat JSON object with dot-notation keys (like "table.sortColumn"),
//! the format written by the host's key/value store. An object with plain camelCase keys
//! is accepted as a fallback.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::file_groups::{FileGroupResolver, MAX_FILE_GROUPS};
use crate::marks::MarkPolicy;
use crate::sorting::{SortColumn, SortDirection, SortOrder};

/// File table preferences.
/// Note: Uses serde aliases to support both camelCase and snake_case keys
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TableSettings {
    #[serde(alias = "sortColumn", default)]
    pub sort_column: SortColumn,
    #[serde(alias = "sortAscending", default = "default_true")]
    pub sort_ascending: bool,
    #[serde(alias = "showFoldersFirst", default = "default_true")]
    pub show_folders_first: bool,
    #[serde(alias = "foldersAlwaysAlphabetical", default)]
    pub folders_always_alphabetical: bool,
    #[serde(alias = "markFoldersWithFiles", default)]
    pub mark_folders_with_files: bool,
    #[serde(alias = "sizeProgressIntervalMs", default = "default_size_progress_interval_ms")]
    pub size_progress_interval_ms: u64,
    #[serde(alias = "showParentFolder", default = "default_true")]
    pub show_parent_folder: bool,
    /// Comma-separated mask lists, one per file group.
    #[serde(alias = "fileGroups", default)]
    pub file_groups: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_size_progress_interval_ms() -> u64 {
    300
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            sort_column: SortColumn::Name,
            sort_ascending: true,
            show_folders_first: true,
            folders_always_alphabetical: false,
            mark_folders_with_files: false,
            size_progress_interval_ms: default_size_progress_interval_ms(),
            show_parent_folder: true,
            file_groups: Vec::new(),
        }
    }
}

impl TableSettings {
    pub fn sort_order(&self) -> SortOrder {
        let direction = if self.sort_ascending {
            SortDirection::Ascending
        } else {
            SortDirection::Descending
        };
        SortOrder::new(self.sort_column, direction)
            .with_folders_first(self.show_folders_first)
            .with_folders_always_alphabetical(self.folders_always_alphabetical)
    }

    pub fn mark_policy(&self) -> MarkPolicy {
        MarkPolicy {
            mark_folders_with_files: self.mark_folders_with_files,
        }
    }

    pub fn size_progress_interval(&self) -> Duration {
        Duration::from_millis(self.size_progress_interval_ms)
    }

    pub fn file_group_resolver(&self) -> FileGroupResolver {
        FileGroupResolver::from_masks(&self.file_groups)
    }
}

/// Loads settings from `path`.
/// Returns defaults if the file doesn't exist or can't be parsed.
pub fn load_settings(path: &Path) -> TableSettings {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            log::debug!("load_settings: using defaults, can't read {}: {}", path.display(), e);
            return TableSettings::default();
        }
    };

    if let Ok(settings) = parse_settings(&contents) {
        return settings;
    }
    if let Ok(settings) = serde_json::from_str(&contents) {
        return settings;
    }

    log::warn!("load_settings: using defaults, can't parse {}", path.display());
    TableSettings::default()
}

/// Parses the flat dot-notation format, like {"table.sortColumn": "size", "fileGroups.1": "*.rs"}.
/// Keys that are missing or hold the wrong type fall back to their defaults.
pub fn parse_settings(contents: &str) -> Result<TableSettings, serde_json::Error> {
    let json: serde_json::Value = serde_json::from_str(contents)?;
    let Some(object) = json.as_object() else {
        return Err(serde::de::Error::custom("settings must be a JSON object"));
    };
    if !object.is_empty() && !object.keys().any(|key| key.contains('.')) {
        return Err(serde::de::Error::custom("no dot-notation keys"));
    }
    let defaults = TableSettings::default();
    let bool_at = |key: &str, default: bool| json.get(key).and_then(|v| v.as_bool()).unwrap_or(default);

    let sort_column = json
        .get("table.sortColumn")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default();

    let size_progress_interval_ms = json
        .get("table.sizeProgressIntervalMs")
        .and_then(|v| v.as_u64())
        .unwrap_or(defaults.size_progress_interval_ms);

    // Groups are numbered from 1; missing numbers become empty groups
    let mut file_groups = Vec::new();
    for number in 1..=MAX_FILE_GROUPS {
        if let Some(masks) = json.get(format!("fileGroups.{}", number)).and_then(|v| v.as_str()) {
            file_groups.resize(number - 1, String::new());
            file_groups.push(masks.to_string());
        }
    }

    Ok(TableSettings {
        sort_column,
        sort_ascending: bool_at("table.sortAscending", defaults.sort_ascending),
        show_folders_first: bool_at("table.showFoldersFirst", defaults.show_folders_first),
        folders_always_alphabetical: bool_at(
            "table.foldersAlwaysAlphabetical",
            defaults.folders_always_alphabetical,
        ),
        mark_folders_with_files: bool_at("table.markFoldersWithFiles", defaults.mark_folders_with_files),
        size_progress_interval_ms,
        show_parent_folder: bool_at("table.showParentFolder", defaults.show_parent_folder),
        file_groups,
    })
}
