//! Directory listing backends.
//!
//! The table itself never reads the file system. A [`DirectoryLister`] produces the raw entries
//! for a directory; the pane and the folder-size aggregator consume it.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::entry::RawEntry;

/// Error type for directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListerError {
    /// Path not found
    NotFound(String),
    /// Permission denied
    PermissionDenied(String),
    /// Path exists but is not a directory
    NotADirectory(String),
    /// Generic I/O error
    Io(String),
}

impl std::fmt::Display for ListerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "Path not found: {}", path),
            Self::PermissionDenied(path) => write!(f, "Permission denied: {}", path),
            Self::NotADirectory(path) => write!(f, "Not a directory: {}", path),
            Self::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for ListerError {}

impl From<std::io::Error> for ListerError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(err.to_string()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(err.to_string()),
            std::io::ErrorKind::NotADirectory => Self::NotADirectory(err.to_string()),
            _ => Self::Io(err.to_string()),
        }
    }
}

/// Source of directory contents.
///
/// Implementations must be shareable with background threads:
/// folder-size aggregation lists directories off the UI thread.
pub trait DirectoryLister: Send + Sync {
    /// Lists the direct children of `path`. Symlinks are reported as symlinks, not followed.
    fn list(&self, path: &str) -> Result<Vec<RawEntry>, ListerError>;

    /// Parent directory of `path`, or `None` at a root.
    fn parent_of(&self, path: &str) -> Option<String>;
}

impl std::fmt::Debug for dyn DirectoryLister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DirectoryLister")
    }
}

// ============================================================================
// Local file system
// ============================================================================

/// Lists the real local file system through `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalDirectoryLister;

impl LocalDirectoryLister {
    pub fn new() -> Self {
        Self
    }
}

impl DirectoryLister for LocalDirectoryLister {
    fn list(&self, path: &str) -> Result<Vec<RawEntry>, ListerError> {
        let started = std::time::Instant::now();
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            match process_dir_entry(&entry) {
                Some(raw) => entries.push(raw),
                None => {
                    // Permission denied or broken symlink: keep a minimal row
                    let is_symlink = entry.file_type().map(|ft| ft.is_symlink()).unwrap_or(false);
                    entries.push(RawEntry {
                        name: entry.file_name().to_string_lossy().to_string(),
                        path: entry.path().to_string_lossy().to_string(),
                        is_directory: false,
                        is_symlink,
                        size: None,
                        modified_at: None,
                        permissions: 0,
                        owner: None,
                        group: None,
                    });
                }
            }
        }
        log::debug!(
            "LocalDirectoryLister::list: path={}, entries={}, took={}ms",
            path,
            entries.len(),
            started.elapsed().as_millis()
        );
        Ok(entries)
    }

    fn parent_of(&self, path: &str) -> Option<String> {
        Path::new(path)
            .parent()
            .map(|parent| parent.to_string_lossy().to_string())
            .filter(|parent| !parent.is_empty())
    }
}

/// Builds a raw entry from a directory entry. Returns None if its metadata can't be read.
fn process_dir_entry(entry: &fs::DirEntry) -> Option<RawEntry> {
    let file_type = entry.file_type().ok()?;
    let is_symlink = file_type.is_symlink();
    let path = entry.path();

    let target_is_dir = is_symlink && fs::metadata(&path).map(|m| m.is_dir()).unwrap_or(false);
    let metadata = fs::symlink_metadata(&path).ok()?;

    let modified_at = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_secs());

    let (permissions, owner, group) = ownership(&metadata);

    Some(RawEntry {
        name: entry.file_name().to_string_lossy().to_string(),
        path: path.to_string_lossy().to_string(),
        is_directory: metadata.is_dir() || target_is_dir,
        is_symlink,
        size: if metadata.is_file() { Some(metadata.len()) } else { None },
        modified_at,
        permissions,
        owner,
        group,
    })
}

#[cfg(unix)]
fn ownership(metadata: &fs::Metadata) -> (u32, Option<String>, Option<String>) {
    use std::os::unix::fs::{MetadataExt, PermissionsExt};
    // st_mode also carries the file type; keep only the permission bits
    (
        metadata.permissions().mode() & 0o7777,
        Some(owners::owner_name(metadata.uid())),
        Some(owners::group_name(metadata.gid())),
    )
}

#[cfg(not(unix))]
fn ownership(metadata: &fs::Metadata) -> (u32, Option<String>, Option<String>) {
    let permissions = if metadata.permissions().readonly() { 0o444 } else { 0o644 };
    (permissions, None, None)
}

#[cfg(unix)]
mod owners {
    use std::collections::HashMap;
    use std::sync::{LazyLock, RwLock};
    use uzers::{get_group_by_gid, get_user_by_uid};

    /// Cache for uid→username resolution.
    static OWNER_CACHE: LazyLock<RwLock<HashMap<u32, String>>> = LazyLock::new(|| RwLock::new(HashMap::new()));
    /// Cache for gid→groupname resolution.
    static GROUP_CACHE: LazyLock<RwLock<HashMap<u32, String>>> = LazyLock::new(|| RwLock::new(HashMap::new()));

    pub(super) fn owner_name(uid: u32) -> String {
        cached(&OWNER_CACHE, uid, |uid| {
            get_user_by_uid(uid).map(|u| u.name().to_string_lossy().into_owned())
        })
    }

    pub(super) fn group_name(gid: u32) -> String {
        cached(&GROUP_CACHE, gid, |gid| {
            get_group_by_gid(gid).map(|g| g.name().to_string_lossy().into_owned())
        })
    }

    /// Unresolvable ids fall back to the numeric id.
    fn cached(cache: &RwLock<HashMap<u32, String>>, id: u32, resolve: impl FnOnce(u32) -> Option<String>) -> String {
        if let Ok(cache) = cache.read()
            && let Some(name) = cache.get(&id)
        {
            return name.clone();
        }
        let name = resolve(id).unwrap_or_else(|| id.to_string());
        if let Ok(mut cache) = cache.write() {
            cache.insert(id, name.clone());
        }
        name
    }
}

// ============================================================================
// In-memory
// ============================================================================

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File { size: u64 },
    Symlink { target: String },
}

/// In-memory directory tree for tests and previews.
///
/// Paths are absolute and '/'-separated. Adding a path creates its missing ancestors.
#[derive(Debug, Default)]
pub struct InMemoryLister {
    nodes: BTreeMap<String, Node>,
    unreadable: HashSet<String>,
    /// Extra listing order: children listed before the others, in the given order.
    first: HashMap<String, Vec<String>>,
    list_delay: Option<Duration>,
    list_calls: AtomicUsize,
}

impl InMemoryLister {
    pub fn new() -> Self {
        Self::default().with_dir("/")
    }

    pub fn with_dir(mut self, path: &str) -> Self {
        self.insert(path, Node::Dir);
        self
    }

    pub fn with_file(mut self, path: &str, size: u64) -> Self {
        self.insert(path, Node::File { size });
        self
    }

    /// Adds a symlink at `path` pointing at the absolute `target`.
    pub fn with_symlink(mut self, path: &str, target: &str) -> Self {
        self.insert(
            path,
            Node::Symlink {
                target: target.to_string(),
            },
        );
        self
    }

    /// Makes listing `path` fail with `PermissionDenied`.
    pub fn with_unreadable(mut self, path: &str) -> Self {
        self.unreadable.insert(path.to_string());
        self
    }

    /// Lists `child` before its siblings. Later calls for the same parent list after earlier ones.
    pub fn with_listed_first(mut self, child: &str) -> Self {
        if let Some(parent) = parent_path(child) {
            self.first.entry(parent).or_default().push(child.to_string());
        }
        self
    }

    /// Sleeps this long on every `list` call, to keep background work observable in tests.
    pub fn with_list_delay(mut self, delay: Duration) -> Self {
        self.list_delay = Some(delay);
        self
    }

    /// Number of `list` calls served so far.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::Relaxed)
    }

    fn insert(&mut self, path: &str, node: Node) {
        let mut ancestor = parent_path(path);
        while let Some(dir) = ancestor {
            ancestor = parent_path(&dir);
            self.nodes.entry(dir).or_insert(Node::Dir);
        }
        self.nodes.insert(path.to_string(), node);
    }

    /// Follows symlinks (a bounded number of hops) to the node they resolve to.
    fn resolve(&self, path: &str) -> Option<(String, &Node)> {
        let mut current = path.to_string();
        for _ in 0..16 {
            match self.nodes.get(&current)? {
                Node::Symlink { target } => current = target.clone(),
                node => return Some((current, node)),
            }
        }
        None
    }

    fn raw_entry(&self, path: &str, node: &Node) -> RawEntry {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        let (is_directory, is_symlink, size) = match node {
            Node::Dir => (true, false, None),
            Node::File { size } => (false, false, Some(*size)),
            Node::Symlink { .. } => {
                let target_is_dir = matches!(self.resolve(path), Some((_, Node::Dir)));
                (target_is_dir, true, None)
            }
        };
        RawEntry {
            name,
            path: path.to_string(),
            is_directory,
            is_symlink,
            size,
            modified_at: Some(1_640_000_000),
            permissions: if is_directory { 0o755 } else { 0o644 },
            owner: Some("testuser".to_string()),
            group: Some("staff".to_string()),
        }
    }

    fn raw_entry_at(&self, shown: &str, stored: &str, node: &Node) -> RawEntry {
        let mut raw = self.raw_entry(stored, node);
        raw.path = shown.to_string();
        raw
    }
}

impl DirectoryLister for InMemoryLister {
    fn list(&self, path: &str) -> Result<Vec<RawEntry>, ListerError> {
        self.list_calls.fetch_add(1, Ordering::Relaxed);
        if let Some(delay) = self.list_delay {
            std::thread::sleep(delay);
        }
        if self.unreadable.contains(path) {
            return Err(ListerError::PermissionDenied(path.to_string()));
        }
        let Some((dir, node)) = self.resolve(path) else {
            return Err(ListerError::NotFound(path.to_string()));
        };
        if !matches!(node, Node::Dir) {
            return Err(ListerError::NotADirectory(path.to_string()));
        }

        let mut children: Vec<RawEntry> = self
            .nodes
            .iter()
            .filter(|(child, _)| child.as_str() != "/" && parent_path(child).as_deref() == Some(dir.as_str()))
            .map(|(child, node)| {
                // Report children under the requested path, so a listing through a symlink stays inside it
                let shown = join(path, child.rsplit('/').next().unwrap_or(child));
                self.raw_entry_at(&shown, child, node)
            })
            .collect();

        if let Some(first) = self.first.get(&dir) {
            children.sort_by_key(|entry| {
                let name = entry.path.rsplit('/').next().unwrap_or_default();
                first
                    .iter()
                    .position(|child| child.rsplit('/').next() == Some(name))
                    .unwrap_or(usize::MAX)
            });
        }
        Ok(children)
    }

    fn parent_of(&self, path: &str) -> Option<String> {
        parent_path(path)
    }
}

fn parent_path(path: &str) -> Option<String> {
    if path == "/" || path.is_empty() {
        return None;
    }
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) => Some("/".to_string()),
        Some(slash) => Some(trimmed[..slash].to_string()),
        None => None,
    }
}

fn join(dir: &str, name: &str) -> String {
    if dir.ends_with('/') {
        format!("{}{}", dir, name)
    } else {
        format!("{}/{}", dir, name)
    }
}
