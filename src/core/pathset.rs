//! Turns raw picker output into a canonical, deduplicated set of relative paths.

use std::collections::HashSet;

use super::error::CoreError;

/// The separator every canonical path uses, regardless of platform.
pub const SEPARATOR: char = '/';

/// An ordered set of canonical paths relative to a common selection root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathSet {
    /// The prefix stripped from every entry, if there was one.
    pub root: Option<String>,
    /// Relative paths in first-seen order, without duplicates.
    pub paths: Vec<String>,
}

impl PathSet {
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }
}

/// Joins a relative canonical path back onto the root it was stripped from.
pub fn join_root(root: Option<&str>, relative: &str) -> String {
    match root {
        None => relative.to_string(),
        Some(root) if root.ends_with(SEPARATOR) => format!("{root}{relative}"),
        Some(root) => format!("{root}{SEPARATOR}{relative}"),
    }
}

/// A raw entry after separator conversion and lexical resolution.
struct ResolvedEntry<'a> {
    raw: &'a str,
    absolute: bool,
    segments: Vec<String>,
}

fn resolve_entry(raw: &str) -> Result<ResolvedEntry<'_>, CoreError> {
    if raw.trim().is_empty() {
        return Err(CoreError::invalid_path(raw, "entry is empty"));
    }

    let unified = raw.replace('\\', "/");
    let absolute = unified.starts_with(SEPARATOR);
    let mut segments: Vec<String> = Vec::new();

    for segment in unified.split(SEPARATOR) {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(CoreError::invalid_path(raw, "escapes the selection root"));
                }
            }
            other => segments.push(other.to_string()),
        }
    }

    if segments.is_empty() {
        return Err(CoreError::invalid_path(raw, "does not name an entry"));
    }

    Ok(ResolvedEntry {
        raw,
        absolute,
        segments,
    })
}

/// Normalizes raw picker entries into a [`PathSet`].
///
/// Separators are unified to `/`, `.` and `..` segments are resolved, the
/// longest directory prefix shared by all entries is stripped and exact
/// duplicates are dropped while keeping the first-seen order.
pub fn normalize<I, S>(entries: I) -> Result<PathSet, CoreError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let entries: Vec<S> = entries.into_iter().collect();
    let mut resolved: Vec<ResolvedEntry<'_>> = Vec::with_capacity(entries.len());
    let mut seen: HashSet<(bool, Vec<String>)> = HashSet::new();

    for entry in &entries {
        let candidate = resolve_entry(entry.as_ref())?;
        if seen.insert((candidate.absolute, candidate.segments.clone())) {
            resolved.push(candidate);
        } else {
            tracing::debug!("Dropping duplicate path entry {:?}", candidate.raw);
        }
    }

    let Some(first) = resolved.first() else {
        return Ok(PathSet::default());
    };

    if let Some(mismatch) = resolved.iter().find(|e| e.absolute != first.absolute) {
        return Err(CoreError::invalid_path(
            mismatch.raw,
            "mixes absolute and relative entries, no common root",
        ));
    }

    // The shared prefix never includes an entry's own last segment, so every
    // relative path keeps at least its file name.
    let first_parent = &first.segments[..first.segments.len() - 1];
    let prefix_len = resolved.iter().skip(1).fold(first_parent.len(), |len, e| {
        let parent = &e.segments[..e.segments.len() - 1];
        first_parent[..len]
            .iter()
            .zip(parent)
            .take_while(|(a, b)| a == b)
            .count()
    });

    let prefix = first.segments[..prefix_len].join("/");
    let root = match (first.absolute, prefix.is_empty()) {
        (true, _) => Some(format!("{SEPARATOR}{prefix}")),
        (false, true) => None,
        (false, false) => Some(prefix),
    };

    let paths = resolved
        .iter()
        .map(|e| e.segments[prefix_len..].join("/"))
        .collect();

    Ok(PathSet { root, paths })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_common_root_and_unifies_separators() {
        let set = normalize([
            "/home/me/project/src/main.rs",
            "/home/me/project\\README.md",
            "/home/me/project/src/lib.rs",
        ])
        .unwrap();

        assert_eq!(set.root.as_deref(), Some("/home/me/project"));
        assert_eq!(set.paths, vec!["src/main.rs", "README.md", "src/lib.rs"]);
    }

    #[test]
    fn test_deduplicates_keeping_first_seen_order() {
        let set = normalize(["proj/b.txt", "proj/a.txt", "proj//b.txt", "proj/./a.txt"]).unwrap();
        assert_eq!(set.root.as_deref(), Some("proj"));
        assert_eq!(set.paths, vec!["b.txt", "a.txt"]);
    }

    #[test]
    fn test_single_file_keeps_its_name() {
        let set = normalize(["/tmp/notes.txt"]).unwrap();
        assert_eq!(set.root.as_deref(), Some("/tmp"));
        assert_eq!(set.paths, vec!["notes.txt"]);
        assert_eq!(join_root(set.root.as_deref(), &set.paths[0]), "/tmp/notes.txt");
    }

    #[test]
    fn test_relative_entries_without_shared_prefix_have_no_root() {
        let set = normalize(["a/b.txt", "d.txt"]).unwrap();
        assert_eq!(set.root, None);
        assert_eq!(set.paths, vec!["a/b.txt", "d.txt"]);
    }

    #[test]
    fn test_files_directly_under_filesystem_root() {
        let set = normalize(["/a.txt", "/b/c.txt"]).unwrap();
        assert_eq!(set.root.as_deref(), Some("/"));
        assert_eq!(join_root(set.root.as_deref(), "a.txt"), "/a.txt");
    }

    #[test]
    fn test_rejects_empty_entries() {
        let err = normalize(["a.txt", "   "]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPath { .. }));
    }

    #[test]
    fn test_rejects_entries_escaping_the_root() {
        let err = normalize(["a/../../etc/passwd"]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPath { .. }));
    }

    #[test]
    fn test_rejects_mixed_absolute_and_relative_entries() {
        let err = normalize(["/abs/a.txt", "rel/b.txt"]).unwrap_err();
        match err {
            CoreError::InvalidPath { path, .. } => assert_eq!(path, "rel/b.txt"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_input_is_an_empty_set() {
        let set = normalize(Vec::<String>::new()).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.root, None);
    }

    #[test]
    fn test_is_stable_across_runs() {
        let input = ["x/z.rs", "x/y/a.rs", "x/z.rs", "x/b.rs"];
        assert_eq!(normalize(input).unwrap(), normalize(input).unwrap());
    }
}
