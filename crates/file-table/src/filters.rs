//! Ready-made predicates for [`EntryTableModel::mark_by_filter`](crate::EntryTableModel::mark_by_filter)
//! and [`EntryTableModel::invert_marks_matching`](crate::EntryTableModel::invert_marks_matching).

use regex::{Regex, RegexBuilder};

use crate::entry::EntryRecord;

/// Regular files of size zero.
pub fn empty_files() -> impl Fn(&EntryRecord) -> bool {
    |entry: &EntryRecord| !entry.is_directory() && entry.size == Some(0)
}

/// Entries whose extension is `ext` (without the dot). An empty `ext` matches entries
/// that have no extension.
pub fn extension(ext: &str, case_sensitive: bool) -> impl Fn(&EntryRecord) -> bool + use<> {
    let wanted = ext.trim_start_matches('.').to_string();
    move |entry: &EntryRecord| match entry.extension() {
        None => wanted.is_empty(),
        Some(actual) if case_sensitive => actual == wanted,
        Some(actual) => actual.eq_ignore_ascii_case(&wanted),
    }
}

/// Entries with the same extension as `reference`, compared case-insensitively.
pub fn same_extension_as(reference: &EntryRecord) -> impl Fn(&EntryRecord) -> bool + use<> {
    extension(reference.extension().unwrap_or_default(), false)
}

/// Entries whose name matches a `*`/`?` wildcard mask, case-insensitively.
pub fn wildcard(mask: &str) -> Result<impl Fn(&EntryRecord) -> bool + use<>, regex::Error> {
    let regex = wildcard_regex(mask, false)?;
    Ok(move |entry: &EntryRecord| regex.is_match(&entry.name))
}

/// Restricts `filter` to non-directories.
pub fn files_only(filter: impl Fn(&EntryRecord) -> bool) -> impl Fn(&EntryRecord) -> bool {
    move |entry: &EntryRecord| !entry.is_directory() && filter(entry)
}

/// Compiles a wildcard mask into an anchored regex: `*` is any run of characters,
/// `?` exactly one, everything else is literal.
pub(crate) fn wildcard_regex(mask: &str, case_sensitive: bool) -> Result<Regex, regex::Error> {
    let mut pattern = String::with_capacity(mask.len() + 8);
    pattern.push('^');
    let mut literal = [0u8; 4];
    for c in mask.chars() {
        match c {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            _ => pattern.push_str(&regex::escape(c.encode_utf8(&mut literal))),
        }
    }
    pattern.push('$');
    RegexBuilder::new(&pattern).case_insensitive(!case_sensitive).build()
}
