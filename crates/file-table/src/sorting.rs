//! Sorting configuration and comparator for file table rows.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::entry::{EntryRecord, extension_of};

// ============================================================================
// Sorting configuration
// ============================================================================

/// Column to sort rows by.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum SortColumn {
    #[default]
    Name,
    Extension,
    Size,
    Modified,
    Permissions,
    Owner,
    Group,
}

/// Sort direction (ascending or descending).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }
}

/// Full comparator configuration of a file table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct SortOrder {
    pub column: SortColumn,
    pub direction: SortDirection,
    /// Directories sort before files regardless of the column.
    pub folders_first: bool,
    /// Directories compare by name (A to Z) among themselves, regardless of the column.
    /// Only applies together with `folders_first`.
    pub folders_always_alphabetical: bool,
}

impl Default for SortOrder {
    fn default() -> Self {
        Self {
            column: SortColumn::Name,
            direction: SortDirection::Ascending,
            folders_first: true,
            folders_always_alphabetical: false,
        }
    }
}

impl SortOrder {
    pub fn new(column: SortColumn, direction: SortDirection) -> Self {
        Self {
            column,
            direction,
            ..Self::default()
        }
    }

    pub fn with_folders_first(mut self, folders_first: bool) -> Self {
        self.folders_first = folders_first;
        self
    }

    pub fn with_folders_always_alphabetical(mut self, always: bool) -> Self {
        self.folders_always_alphabetical = always;
        self
    }

    /// Same configuration with the direction flipped.
    pub fn reversed(self) -> Self {
        Self {
            direction: self.direction.reversed(),
            ..self
        }
    }

    pub fn is_ascending(&self) -> bool {
        self.direction == SortDirection::Ascending
    }
}

// ============================================================================
// Sorting logic
// ============================================================================

/// Extracts file extension for sorting purposes.
/// Returns: (is_dotfile, has_extension, extension_lowercase)
/// Dotfiles (names starting with .) sort first, then files without extension, then by extension.
fn extract_extension_for_sort(name: &str) -> (bool, bool, String) {
    if name.starts_with('.') && !name[1..].contains('.') {
        return (true, false, String::new());
    }
    match extension_of(name) {
        Some(ext) => (false, true, ext.to_lowercase()),
        None => (false, false, String::new()),
    }
}

/// Compares two strings using natural (alphanumeric) sort, case-insensitive.
fn compare_names_natural(a: &str, b: &str) -> Ordering {
    alphanumeric_sort::compare_str(a.to_lowercase(), b.to_lowercase())
}

/// Compares optional values; unknown values sort last in both directions.
fn compare_known_first<T: Ord>(a: Option<T>, b: Option<T>, direction: SortDirection) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => direction.apply(a.cmp(&b)),
    }
}

fn compare_extensions(a: &EntryRecord, b: &EntryRecord) -> Ordering {
    let (a_dotfile, a_has_ext, a_ext) = extract_extension_for_sort(&a.name);
    let (b_dotfile, b_has_ext, b_ext) = extract_extension_for_sort(&b.name);

    match (a_dotfile, b_dotfile) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (true, true) => compare_names_natural(&a.name, &b.name),
        (false, false) => match (a_has_ext, b_has_ext) {
            (false, true) => Ordering::Less,
            (true, false) => Ordering::Greater,
            (false, false) => compare_names_natural(&a.name, &b.name),
            (true, true) => alphanumeric_sort::compare_str(&a_ext, &b_ext)
                .then_with(|| compare_names_natural(&a.name, &b.name)),
        },
    }
}

fn compare_by_column(a: &EntryRecord, b: &EntryRecord, column: SortColumn, direction: SortDirection) -> Ordering {
    match column {
        SortColumn::Name => direction.apply(compare_names_natural(&a.name, &b.name)),
        SortColumn::Extension => direction.apply(compare_extensions(a, b)),
        // Directories use their computed size, so a folder-size pass followed by an
        // explicit resort orders folders by content.
        SortColumn::Size => compare_known_first(a.display_size(), b.display_size(), direction),
        SortColumn::Modified => compare_known_first(a.modified_at, b.modified_at, direction),
        SortColumn::Permissions => direction.apply(a.permissions.cmp(&b.permissions)),
        SortColumn::Owner => compare_known_first(
            a.owner.as_deref().map(str::to_lowercase),
            b.owner.as_deref().map(str::to_lowercase),
            direction,
        ),
        SortColumn::Group => compare_known_first(
            a.group.as_deref().map(str::to_lowercase),
            b.group.as_deref().map(str::to_lowercase),
            direction,
        ),
    }
}

/// Final tie-breakers: case-insensitive name, then the full path.
/// Paths are unique within a listing, so the result is a strict total order.
fn tie_break(a: &EntryRecord, b: &EntryRecord) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.path.cmp(&b.path))
}

/// Compares two rows under the given sort order.
///
/// Evaluation order:
/// 1. The ".." row always comes first.
/// 2. With `folders_first`, a directory beats a non-directory regardless of the column.
/// 3. With `folders_first` and `folders_always_alphabetical`, two directories compare by name, A to Z.
/// 4. Otherwise the configured column decides, in the configured direction.
/// 5. Ties fall back to [`tie_break`].
pub fn compare_entries(a: &EntryRecord, b: &EntryRecord, order: &SortOrder) -> Ordering {
    match (a.is_parent_ref(), b.is_parent_ref()) {
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        (true, true) => return a.path.cmp(&b.path),
        (false, false) => {}
    }

    let a_dir = a.is_directory();
    let b_dir = b.is_directory();
    if order.folders_first && a_dir != b_dir {
        return if a_dir { Ordering::Less } else { Ordering::Greater };
    }

    // Only meaningful while directories form their own group; mixed with files, a per-pair
    // switch of comparison key would break transitivity
    let primary = if order.folders_first && order.folders_always_alphabetical && a_dir && b_dir {
        compare_names_natural(&a.name, &b.name)
    } else {
        compare_by_column(a, b, order.column, order.direction)
    };

    primary.then_with(|| tie_break(a, b))
}

/// Sorts rows in place by the given order.
/// Uses natural sorting for names (for example, "img_2" before "img_10").
pub fn sort_entries(entries: &mut [EntryRecord], order: &SortOrder) {
    entries.sort_by(|a, b| compare_entries(a, b, order));
}
