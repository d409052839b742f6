//! Tests for settings loading.

use std::fs;
use std::time::Duration;

use crate::settings::{TableSettings, load_settings, parse_settings};
use crate::sorting::{SortColumn, SortDirection};
use crate::test_support::{file, init_logging};

#[test]
fn test_defaults() {
    let settings = TableSettings::default();
    let order = settings.sort_order();
    assert_eq!(order.column, SortColumn::Name);
    assert_eq!(order.direction, SortDirection::Ascending);
    assert!(order.folders_first);
    assert!(!order.folders_always_alphabetical);
    assert!(!settings.mark_policy().mark_folders_with_files);
    assert_eq!(settings.size_progress_interval(), Duration::from_millis(300));
    assert!(settings.show_parent_folder);
}

#[test]
fn test_parse_dot_notation() {
    let settings = parse_settings(
        r#"{
            "table.sortColumn": "size",
            "table.sortAscending": false,
            "table.showFoldersFirst": false,
            "table.foldersAlwaysAlphabetical": true,
            "table.markFoldersWithFiles": true,
            "table.sizeProgressIntervalMs": 50,
            "table.showParentFolder": false,
            "fileGroups.1": "*.rs",
            "fileGroups.3": "*.jpg, *.png",
            "unrelated.key": 42
        }"#,
    )
    .unwrap();

    let order = settings.sort_order();
    assert_eq!(order.column, SortColumn::Size);
    assert_eq!(order.direction, SortDirection::Descending);
    assert!(!order.folders_first);
    assert!(order.folders_always_alphabetical);
    assert!(settings.mark_policy().mark_folders_with_files);
    assert_eq!(settings.size_progress_interval(), Duration::from_millis(50));
    assert!(!settings.show_parent_folder);
    assert_eq!(settings.file_groups, vec!["*.rs", "", "*.jpg, *.png"]);

    let resolver = settings.file_group_resolver();
    assert_eq!(resolver.resolve(&file("/d", "lib.rs", 1)), Some(0));
    assert_eq!(resolver.resolve(&file("/d", "a.png", 1)), Some(2));
}

#[test]
fn test_parse_wrong_types_fall_back_to_defaults() {
    let settings = parse_settings(r#"{"table.sortColumn": "bogus", "table.sortAscending": "yes"}"#).unwrap();
    assert_eq!(settings, TableSettings::default());
}

#[test]
fn test_parse_rejects_non_objects() {
    assert!(parse_settings("[1, 2]").is_err());
    assert!(parse_settings("not json").is_err());
}

#[test]
fn test_load_settings_dot_notation_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("settings-v2.json");
    fs::write(&path, r#"{"table.sortColumn": "modified"}"#).unwrap();
    assert_eq!(load_settings(&path).sort_column, SortColumn::Modified);
}

#[test]
fn test_load_settings_plain_camel_case_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("settings.json");
    fs::write(
        &path,
        r#"{"sortColumn": "extension", "markFoldersWithFiles": true, "fileGroups": ["*.md"]}"#,
    )
    .unwrap();
    let settings = load_settings(&path);
    assert_eq!(settings.sort_column, SortColumn::Extension);
    assert!(settings.mark_folders_with_files);
    assert!(settings.sort_ascending);
    assert_eq!(settings.size_progress_interval_ms, 300);
    assert_eq!(settings.file_groups, vec!["*.md"]);
}

#[test]
fn test_load_settings_falls_back_to_defaults() {
    init_logging();
    let temp_dir = tempfile::tempdir().unwrap();
    assert_eq!(load_settings(&temp_dir.path().join("missing.json")), TableSettings::default());

    let broken = temp_dir.path().join("broken.json");
    fs::write(&broken, "{ not json").unwrap();
    assert_eq!(load_settings(&broken), TableSettings::default());
}
