//! Tests for the row comparator.

use std::cmp::Ordering;

use crate::entry::EntryRecord;
use crate::model::EntryTableModel;
use crate::sorting::{SortColumn, SortDirection, SortOrder, compare_entries, sort_entries};
use crate::test_support::{dir, file, names, symlink};

fn sorted_names(mut entries: Vec<EntryRecord>, order: SortOrder) -> Vec<String> {
    sort_entries(&mut entries, &order);
    entries.into_iter().map(|entry| entry.name).collect()
}

fn mixed_entries() -> Vec<EntryRecord> {
    let mut photos = dir("/d", "photos");
    photos.computed_size = Some(5_000);
    let mut big = dir("/d", "Big");
    big.computed_size = Some(90_000);
    let mut old = file("/d", "old.log", 40);
    old.modified_at = Some(1_000);
    let mut unknown_date = file("/d", "mystery", 40);
    unknown_date.modified_at = None;
    let mut root_owned = file("/d", "Zed.TXT", 10);
    root_owned.owner = Some("root".to_string());
    root_owned.group = None;
    vec![
        file("/d", "img_10.png", 300),
        file("/d", "img_2.png", 300),
        photos,
        big,
        dir("/d", "empty"),
        old,
        unknown_date,
        root_owned,
        file("/d", ".bashrc", 7),
        file("/d", "README", 0),
        symlink("/d", "link", true),
        symlink("/d", "link.txt", false),
        EntryRecord::parent_ref("/"),
    ]
}

fn all_orders() -> Vec<SortOrder> {
    let columns = [
        SortColumn::Name,
        SortColumn::Extension,
        SortColumn::Size,
        SortColumn::Modified,
        SortColumn::Permissions,
        SortColumn::Owner,
        SortColumn::Group,
    ];
    let mut orders = Vec::new();
    for column in columns {
        for direction in [SortDirection::Ascending, SortDirection::Descending] {
            for folders_first in [true, false] {
                for always_alpha in [true, false] {
                    orders.push(
                        SortOrder::new(column, direction)
                            .with_folders_first(folders_first)
                            .with_folders_always_alphabetical(always_alpha),
                    );
                }
            }
        }
    }
    orders
}

// ============================================================================
// Totality
// ============================================================================

#[test]
fn test_comparator_is_a_strict_total_order_for_every_configuration() {
    let entries = mixed_entries();
    for order in all_orders() {
        for a in &entries {
            assert_eq!(compare_entries(a, a, &order), Ordering::Equal, "reflexive: {:?}", order);
            for b in &entries {
                let ab = compare_entries(a, b, &order);
                let ba = compare_entries(b, a, &order);
                assert_eq!(ab, ba.reverse(), "antisymmetric: {} vs {} under {:?}", a.name, b.name, order);
                if a.path != b.path {
                    assert_ne!(ab, Ordering::Equal, "distinct paths never tie: {} vs {}", a.name, b.name);
                }
                for c in &entries {
                    if ab == Ordering::Less && compare_entries(b, c, &order) == Ordering::Less {
                        assert_eq!(
                            compare_entries(a, c, &order),
                            Ordering::Less,
                            "transitive: {} < {} < {} under {:?}",
                            a.name,
                            b.name,
                            c.name,
                            order
                        );
                    }
                }
            }
        }
    }
}

#[test]
fn test_sorting_twice_is_idempotent() {
    for order in all_orders() {
        let mut once = mixed_entries();
        sort_entries(&mut once, &order);
        let mut twice = once.clone();
        sort_entries(&mut twice, &order);
        let once_paths: Vec<_> = once.iter().map(|e| e.path.clone()).collect();
        let twice_paths: Vec<_> = twice.iter().map(|e| e.path.clone()).collect();
        assert_eq!(once_paths, twice_paths, "{:?}", order);
    }
}

#[test]
fn test_parent_ref_sorts_first_in_every_configuration() {
    for order in all_orders() {
        let mut entries = mixed_entries();
        sort_entries(&mut entries, &order);
        assert!(entries[0].is_parent_ref(), "{:?}", order);
    }
}

// ============================================================================
// Name and folders-first
// ============================================================================

#[test]
fn test_name_sort_with_folders_first() {
    let entries = vec![
        file("/d", "b.txt", 10),
        dir("/d", "A"),
        file("/d", "a.txt", 5),
        EntryRecord::parent_ref("/"),
    ];
    assert_eq!(
        sorted_names(entries, SortOrder::default()),
        vec!["..", "A", "a.txt", "b.txt"]
    );
}

#[test]
fn test_name_sort_is_natural() {
    let entries = vec![
        file("/d", "img_10.png", 1),
        file("/d", "img_2.png", 1),
        file("/d", "img_1.png", 1),
    ];
    assert_eq!(
        sorted_names(entries, SortOrder::default()),
        vec!["img_1.png", "img_2.png", "img_10.png"]
    );
}

#[test]
fn test_name_sort_is_case_insensitive() {
    let entries = vec![file("/d", "beta", 1), file("/d", "Alpha", 1), file("/d", "alpha2", 1)];
    assert_eq!(
        sorted_names(entries, SortOrder::default()),
        vec!["Alpha", "alpha2", "beta"]
    );
}

#[test]
fn test_descending_keeps_folders_first() {
    let entries = vec![file("/d", "a.txt", 1), dir("/d", "zdir"), dir("/d", "adir"), file("/d", "z.txt", 1)];
    let order = SortOrder::new(SortColumn::Name, SortDirection::Descending);
    assert_eq!(sorted_names(entries, order), vec!["zdir", "adir", "z.txt", "a.txt"]);
}

#[test]
fn test_without_folders_first_directories_mix_with_files() {
    let entries = vec![file("/d", "a.txt", 1), dir("/d", "m"), file("/d", "z.txt", 1)];
    let order = SortOrder::default().with_folders_first(false);
    assert_eq!(sorted_names(entries, order), vec!["a.txt", "m", "z.txt"]);
}

#[test]
fn test_symlink_to_directory_counts_as_directory() {
    let entries = vec![file("/d", "a.txt", 1), symlink("/d", "zlink", true), symlink("/d", "blink", false)];
    assert_eq!(
        sorted_names(entries, SortOrder::default()),
        vec!["zlink", "a.txt", "blink"]
    );
}

// ============================================================================
// Other columns
// ============================================================================

#[test]
fn test_size_sort_uses_computed_size_for_directories() {
    let mut small = dir("/d", "small");
    small.computed_size = Some(10);
    let mut large = dir("/d", "large");
    large.computed_size = Some(1_000);
    let unknown = dir("/d", "unknown");
    let entries = vec![small, unknown, large];

    let order = SortOrder::new(SortColumn::Size, SortDirection::Descending);
    assert_eq!(sorted_names(entries.clone(), order), vec!["large", "small", "unknown"]);

    let order = SortOrder::new(SortColumn::Size, SortDirection::Ascending);
    assert_eq!(sorted_names(entries, order), vec!["small", "large", "unknown"]);
}

#[test]
fn test_size_ties_break_by_name() {
    let entries = vec![file("/d", "b", 5), file("/d", "A", 5), file("/d", "c", 1)];
    let order = SortOrder::new(SortColumn::Size, SortDirection::Descending);
    assert_eq!(sorted_names(entries, order), vec!["A", "b", "c"]);
}

#[test]
fn test_same_name_ties_break_by_path() {
    let entries = vec![file("/z", "same", 1), file("/a", "same", 1)];
    let mut sorted = entries;
    sort_entries(&mut sorted, &SortOrder::default());
    assert_eq!(sorted[0].path, "/a/same");
    assert_eq!(sorted[1].path, "/z/same");
}

#[test]
fn test_extension_sort_puts_dotfiles_then_bare_names_first() {
    let entries = vec![
        file("/d", "b.txt", 1),
        file("/d", "a.rs", 1),
        file("/d", "README", 1),
        file("/d", ".gitignore", 1),
        file("/d", "Makefile", 1),
        file("/d", "c.RS", 1),
    ];
    let order = SortOrder::new(SortColumn::Extension, SortDirection::Ascending);
    assert_eq!(
        sorted_names(entries, order),
        vec![".gitignore", "Makefile", "README", "a.rs", "c.RS", "b.txt"]
    );
}

#[test]
fn test_modified_sort_puts_unknown_dates_last_in_both_directions() {
    let mut old = file("/d", "old", 1);
    old.modified_at = Some(100);
    let mut new = file("/d", "new", 1);
    new.modified_at = Some(200);
    let mut unknown = file("/d", "unknown", 1);
    unknown.modified_at = None;
    let entries = vec![unknown, new, old];

    let ascending = SortOrder::new(SortColumn::Modified, SortDirection::Ascending);
    assert_eq!(sorted_names(entries.clone(), ascending), vec!["old", "new", "unknown"]);
    let descending = ascending.reversed();
    assert_eq!(sorted_names(entries, descending), vec!["new", "old", "unknown"]);
}

#[test]
fn test_owner_sort_is_case_insensitive_with_missing_owner_last() {
    let mut alice = file("/d", "one", 1);
    alice.owner = Some("alice".to_string());
    let mut bob = file("/d", "two", 1);
    bob.owner = Some("Bob".to_string());
    let mut nobody = file("/d", "three", 1);
    nobody.owner = None;
    let order = SortOrder::new(SortColumn::Owner, SortDirection::Ascending);
    assert_eq!(sorted_names(vec![nobody, bob, alice], order), vec!["one", "two", "three"]);
}

#[test]
fn test_folders_always_alphabetical_ignores_column_and_direction_for_directories() {
    let mut big = dir("/d", "zeta");
    big.computed_size = Some(9_999);
    let mut small = dir("/d", "alpha");
    small.computed_size = Some(1);
    let entries = vec![small, big, file("/d", "f1", 1), file("/d", "f2", 2)];
    let order = SortOrder::new(SortColumn::Size, SortDirection::Descending).with_folders_always_alphabetical(true);
    assert_eq!(sorted_names(entries, order), vec!["alpha", "zeta", "f2", "f1"]);
}

#[test]
fn test_set_sort_order_on_model_reports_new_focus_index() {
    let mut model = EntryTableModel::default();
    model.populate(
        "/d",
        vec![file("/d", "a", 1), file("/d", "b", 2), file("/d", "c", 3)],
        None,
    );
    assert!(model.focus_path("/d/a"));
    let focused = model.set_sort_order(SortOrder::new(SortColumn::Size, SortDirection::Descending));
    assert_eq!(names(&model), vec!["c", "b", "a"]);
    assert_eq!(focused, Some(2));
}
