//! Data and selection model behind a two-pane file manager's file table.
//!
//! [`EntryTableModel`] holds the sorted rows of one directory, the mark set, and the focus.
//! [`SizeCalculator`] computes folder sizes in the background and feeds them back into the model
//! on the owner's thread; [`FilePane`] ties both to a [`DirectoryLister`].

// Warn on redundant path prefixes (e.g., std::path::Path when Path is imported)
#![warn(unused_qualifications)]
// Warn on unused dependencies to catch platform-specific cfg mismatches
#![warn(unused_crate_dependencies)]
// Use log::* macros instead of println!/eprintln! for proper log level control
#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod aggregator;
pub mod entry;
pub mod file_groups;
pub mod filters;
mod ignore_poison;
pub mod lister;
pub mod marks;
pub mod model;
pub mod notifier;
pub mod pane;
pub mod runner;
pub mod settings;
pub mod size_calculator;
pub mod sorting;

#[cfg(test)]
mod file_groups_test;
#[cfg(test)]
mod notifier_test;
#[cfg(test)]
mod settings_test;
#[cfg(test)]
mod sorting_test;
#[cfg(test)]
mod test_support;

pub use aggregator::{AggregationOutcome, AggregationState, DirectorySizeAggregator};
pub use entry::{EntryKind, EntryRecord, RawEntry, SizeComputationState};
pub use file_groups::FileGroupResolver;
pub use lister::{DirectoryLister, InMemoryLister, ListerError, LocalDirectoryLister};
pub use marks::{MarkPolicy, MarkSet};
pub use model::{EntryTableModel, ListingStats, TableError};
pub use notifier::{ChangeNotifier, SubscriptionId, TableEvent};
pub use pane::FilePane;
pub use runner::{TaskContext, TaskError, TaskHandle, TaskId, TaskRunner};
pub use settings::{TableSettings, load_settings, parse_settings};
pub use size_calculator::SizeCalculator;
pub use sorting::{SortColumn, SortDirection, SortOrder, compare_entries, sort_entries};
