//! Materializes preview trees for opened or dropped paths straight from the
//! local file system.

use anyhow::Result;
use async_trait::async_trait;
use ignore::WalkBuilder;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::{NodeKind, PreviewSource, SerializedNode};

/// A [`PreviewSource`] that walks the local file system.
///
/// Nothing is filtered here; ignore patterns only apply when the engine
/// parses the submitted selection.
#[derive(Debug, Default, Clone)]
pub struct FsPreviewSource;

#[async_trait]
impl PreviewSource for FsPreviewSource {
    async fn fetch_preview_tree(&self, paths: &[PathBuf]) -> Result<Vec<SerializedNode>> {
        let paths = paths.to_vec();
        tokio::task::spawn_blocking(move || {
            paths
                .iter()
                .filter(|path| {
                    let exists = path.exists();
                    if !exists {
                        tracing::warn!("Skipping non-existent path {:?}", path);
                    }
                    exists
                })
                .map(|path| build_preview_tree(path))
                .collect()
        })
        .await?
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path_string(path))
}

fn leaf(path: &Path) -> SerializedNode {
    SerializedNode {
        kind: Some(NodeKind::File),
        name: Some(file_name(path)),
        path: path_string(path),
        children: None,
        selected: None,
    }
}

/// Builds the serialized tree for a single file or directory.
pub fn build_preview_tree(root_path: &Path) -> Result<SerializedNode> {
    if !root_path.is_dir() {
        return Ok(leaf(root_path));
    }

    let mut children_map: HashMap<PathBuf, Vec<(PathBuf, bool)>> = HashMap::new();
    let walker = WalkBuilder::new(root_path)
        .standard_filters(false)
        .follow_links(false)
        .build();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry under {:?}: {}", root_path, e);
                continue;
            }
        };
        if entry.depth() == 0 {
            continue;
        }
        let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
        if let Some(parent) = entry.path().parent() {
            children_map
                .entry(parent.to_path_buf())
                .or_default()
                .push((entry.path().to_path_buf(), is_dir));
        }
    }

    fn assemble(
        path: &Path,
        children_map: &mut HashMap<PathBuf, Vec<(PathBuf, bool)>>,
    ) -> SerializedNode {
        let children = children_map
            .remove(path)
            .unwrap_or_default()
            .into_iter()
            .map(|(child, is_dir)| {
                if is_dir {
                    assemble(&child, children_map)
                } else {
                    leaf(&child)
                }
            })
            .collect();

        SerializedNode {
            kind: Some(NodeKind::Directory),
            name: Some(file_name(path)),
            path: path_string(path),
            children: Some(children),
            selected: None,
        }
    }

    Ok(assemble(root_path, &mut children_map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{adopt, SelectionState};
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_preview_tree_mirrors_the_directory() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("proj");
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();
        fs::write(root.join("src/main.rs"), "fn main() {}").unwrap();
        fs::write(root.join(".gitignore"), "target").unwrap();

        let nodes = FsPreviewSource
            .fetch_preview_tree(&[root.clone()])
            .await
            .unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].kind, Some(NodeKind::Directory));

        let tree = adopt(nodes).unwrap();
        let proj = &tree.root.children[0];
        let names: Vec<&str> = proj.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["empty", "src", ".gitignore"]);
        // The empty directory keeps the parent from being fully checked.
        assert_eq!(proj.selection_state, SelectionState::Indeterminate);
    }

    #[tokio::test]
    async fn test_missing_paths_are_skipped() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "a").unwrap();

        let nodes = FsPreviewSource
            .fetch_preview_tree(&[dir.path().join("missing"), file.clone()])
            .await
            .unwrap();
        assert_eq!(nodes, vec![leaf(&file)]);
        assert_eq!(nodes[0].name.as_deref(), Some("a.txt"));
    }
}
