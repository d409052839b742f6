//! Shared builders for the unit tests.

use std::cell::RefCell;
use std::rc::Rc;

use crate::entry::{EntryKind, EntryRecord, SizeComputationState};
use crate::model::EntryTableModel;
use crate::notifier::TableEvent;

/// Routes `log` output to the test harness when `RUST_LOG` is set.
pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub(crate) fn file(dir: &str, name: &str, size: u64) -> EntryRecord {
    EntryRecord {
        name: name.to_string(),
        path: format!("{}/{}", dir.trim_end_matches('/'), name),
        kind: EntryKind::Regular,
        links_to_directory: false,
        size: Some(size),
        modified_at: Some(1_640_000_000),
        permissions: 0o644,
        owner: Some("testuser".to_string()),
        group: Some("staff".to_string()),
        marked: false,
        computed_size: None,
        size_state: SizeComputationState::None,
    }
}

pub(crate) fn dir(parent: &str, name: &str) -> EntryRecord {
    EntryRecord {
        kind: EntryKind::Directory,
        size: None,
        permissions: 0o755,
        ..file(parent, name, 0)
    }
}

pub(crate) fn symlink(parent: &str, name: &str, to_directory: bool) -> EntryRecord {
    EntryRecord {
        kind: EntryKind::Symlink,
        links_to_directory: to_directory,
        size: None,
        ..file(parent, name, 0)
    }
}

/// Row names in display order, ".." included.
pub(crate) fn names(model: &EntryTableModel) -> Vec<String> {
    model.rows().map(|entry| entry.name.clone()).collect()
}

/// Subscribes a recorder that keeps every event the model emits.
pub(crate) fn record_events(model: &EntryTableModel) -> Rc<RefCell<Vec<TableEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    model.subscribe(move |event| sink.borrow_mut().push(*event));
    events
}

/// A model showing `/home/user/docs` with a ".." row and a mix of files and directories.
pub(crate) fn sample_model() -> EntryTableModel {
    let mut model = EntryTableModel::default();
    model.populate(
        "/home/user/docs",
        vec![
            file("/home/user/docs", "b.txt", 200),
            dir("/home/user/docs", "photos"),
            file("/home/user/docs", "a.md", 100),
            dir("/home/user/docs", "archive"),
            file("/home/user/docs", "c.rs", 300),
        ],
        Some(EntryRecord::parent_ref("/home/user")),
    );
    model
}
