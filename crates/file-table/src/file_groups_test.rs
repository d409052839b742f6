//! Tests for file group resolution.

use crate::file_groups::FileGroupResolver;
use crate::test_support::{dir, file, init_logging, symlink};

fn groups(masks: &[&str]) -> FileGroupResolver {
    let masks: Vec<String> = masks.iter().map(|mask| mask.to_string()).collect();
    FileGroupResolver::from_masks(&masks)
}

#[test]
fn test_extension_masks_resolve_case_insensitively() {
    let resolver = groups(&["*.rs, *.toml", "*.jpg,*.PNG"]);
    assert_eq!(resolver.resolve(&file("/d", "main.rs", 1)), Some(0));
    assert_eq!(resolver.resolve(&file("/d", "Cargo.TOML", 1)), Some(0));
    assert_eq!(resolver.resolve(&file("/d", "photo.png", 1)), Some(1));
    assert_eq!(resolver.resolve(&file("/d", "notes.txt", 1)), None);
}

#[test]
fn test_wildcard_masks() {
    let resolver = groups(&["", "README*, *.tar.gz"]);
    assert_eq!(resolver.resolve(&file("/d", "README.md", 1)), Some(1));
    assert_eq!(resolver.resolve(&file("/d", "backup.tar.gz", 1)), Some(1));
    assert_eq!(resolver.resolve(&file("/d", "backup.gz", 1)), None);
}

#[test]
fn test_lowest_group_wins() {
    let resolver = groups(&["*.log", "error*", "*.log"]);
    assert_eq!(resolver.resolve(&file("/d", "error.log", 1)), Some(0));
    assert_eq!(resolver.resolve(&file("/d", "error.txt", 1)), Some(1));

    let resolver = groups(&["build*", "*.log"]);
    assert_eq!(resolver.resolve(&file("/d", "build.log", 1)), Some(0));
}

#[test]
fn test_directories_and_symlinks_have_no_group() {
    let resolver = groups(&["*"]);
    assert_eq!(resolver.resolve(&dir("/d", "src")), None);
    assert_eq!(resolver.resolve(&symlink("/d", "link.rs", false)), None);
    assert_eq!(resolver.resolve(&file("/d", "anything", 1)), Some(0));
}

#[test]
fn test_only_first_ten_groups_are_used() {
    init_logging();
    let mut masks = vec![String::new(); 10];
    masks.push("*.eleven".to_string());
    let resolver = FileGroupResolver::from_masks(&masks);
    assert!(resolver.is_empty());
    assert_eq!(resolver.resolve(&file("/d", "x.eleven", 1)), None);
}
