//! Entry records: one row of a file table.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// What kind of file system object a row stands for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum EntryKind {
    Regular,
    Directory,
    Symlink,
    /// The synthetic ".." row leading to the parent directory.
    ParentRef,
}

/// Progress of a background folder-size computation for a directory row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SizeComputationState {
    #[default]
    None,
    InProgress,
    Done,
    Failed,
}

/// A directory entry as yielded by a [`DirectoryLister`](crate::DirectoryLister).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RawEntry {
    pub name: String,
    pub path: String,
    /// For symlinks: whether the link target is a directory.
    pub is_directory: bool,
    pub is_symlink: bool,
    pub size: Option<u64>,
    /// Unix timestamp in seconds.
    pub modified_at: Option<u64>,
    pub permissions: u32,
    /// None where the backing store has no notion of ownership.
    pub owner: Option<String>,
    pub group: Option<String>,
}

/// Displayable snapshot of one directory entry plus the mutable state the table keeps for it.
///
/// Identity is the absolute `path`: two records are equal when their paths are equal,
/// whatever their other attributes say.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryRecord {
    pub name: String,
    pub path: String,
    pub kind: EntryKind,
    /// Only meaningful for `EntryKind::Symlink`.
    pub links_to_directory: bool,
    pub size: Option<u64>,
    pub modified_at: Option<u64>,
    pub permissions: u32,
    pub owner: Option<String>,
    pub group: Option<String>,
    pub marked: bool,
    /// Recursive size of a directory, partial while `size_state` is `InProgress`.
    pub computed_size: Option<u64>,
    pub size_state: SizeComputationState,
}

impl EntryRecord {
    /// Builds the ".." row for the given parent directory path.
    pub fn parent_ref(parent_path: impl Into<String>) -> Self {
        Self {
            name: "..".to_string(),
            path: parent_path.into(),
            kind: EntryKind::ParentRef,
            links_to_directory: false,
            size: None,
            modified_at: None,
            permissions: 0,
            owner: None,
            group: None,
            marked: false,
            computed_size: None,
            size_state: SizeComputationState::None,
        }
    }

    pub fn is_parent_ref(&self) -> bool {
        self.kind == EntryKind::ParentRef
    }

    /// True for directories and for symlinks pointing at directories.
    pub fn is_directory(&self) -> bool {
        match self.kind {
            EntryKind::Directory | EntryKind::ParentRef => true,
            EntryKind::Symlink => self.links_to_directory,
            EntryKind::Regular => false,
        }
    }

    pub fn is_symlink(&self) -> bool {
        self.kind == EntryKind::Symlink
    }

    /// Whether this row can ever be part of the mark set.
    pub fn is_markable(&self) -> bool {
        !self.is_parent_ref()
    }

    /// Size shown in the size column: the computed size for directories, the file size otherwise.
    /// `None` means "unknown".
    pub fn display_size(&self) -> Option<u64> {
        if self.is_directory() { self.computed_size } else { self.size }
    }

    /// Extension without the dot. Names without a dot, dotfiles like ".bashrc",
    /// and names ending in a dot have no extension.
    pub fn extension(&self) -> Option<&str> {
        extension_of(&self.name)
    }
}

impl From<RawEntry> for EntryRecord {
    fn from(raw: RawEntry) -> Self {
        let kind = if raw.is_symlink {
            EntryKind::Symlink
        } else if raw.is_directory {
            EntryKind::Directory
        } else {
            EntryKind::Regular
        };
        Self {
            name: raw.name,
            path: raw.path,
            kind,
            links_to_directory: raw.is_symlink && raw.is_directory,
            size: if raw.is_directory { None } else { raw.size },
            modified_at: raw.modified_at,
            permissions: raw.permissions,
            owner: raw.owner,
            group: raw.group,
            marked: false,
            computed_size: None,
            size_state: SizeComputationState::None,
        }
    }
}

impl PartialEq for EntryRecord {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for EntryRecord {}

impl Hash for EntryRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

pub(crate) fn extension_of(name: &str) -> Option<&str> {
    match name.rfind('.') {
        Some(dot) if dot > 0 && dot < name.len() - 1 => Some(&name[dot + 1..]),
        _ => None,
    }
}
