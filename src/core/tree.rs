//! The selection tree data model and the two ways of producing one:
//! building it from a [`PathSet`] or adopting a tree materialized by the
//! preview source.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

use super::error::CoreError;
use super::pathset::{PathSet, SEPARATOR};

/// The path of the root node of every tree.
pub const ROOT_PATH: &str = "";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    File,
    Directory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectionState {
    Checked,
    Unchecked,
    Indeterminate,
}

impl SelectionState {
    pub fn from_checked(checked: bool) -> Self {
        if checked {
            SelectionState::Checked
        } else {
            SelectionState::Unchecked
        }
    }

    /// Folds child states into the state of their parent directory.
    ///
    /// A directory without children is `Unchecked`.
    pub fn fold<I>(children: I) -> Self
    where
        I: IntoIterator<Item = SelectionState>,
    {
        let mut all_checked = true;
        let mut all_unchecked = true;
        let mut any = false;
        for state in children {
            any = true;
            all_checked &= state == SelectionState::Checked;
            all_unchecked &= state == SelectionState::Unchecked;
            if !all_checked && !all_unchecked {
                return SelectionState::Indeterminate;
            }
        }
        if any && all_checked {
            SelectionState::Checked
        } else {
            SelectionState::Unchecked
        }
    }
}

/// A single element of the selection tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub name: String,
    pub path: String,
    pub kind: NodeKind,
    pub children: Vec<Node>,
    pub selection_state: SelectionState,
}

impl Node {
    pub fn file(name: impl Into<String>, path: impl Into<String>, checked: bool) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: NodeKind::File,
            children: Vec::new(),
            selection_state: SelectionState::from_checked(checked),
        }
    }

    pub fn directory(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: NodeKind::Directory,
            children: Vec::new(),
            selection_state: SelectionState::Unchecked,
        }
    }

    pub fn is_directory(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    /// The state this directory should have given its children.
    pub fn derived_state(&self) -> SelectionState {
        SelectionState::fold(self.children.iter().map(|c| c.selection_state))
    }

    /// Recomputes the state of every directory in this subtree, children first.
    pub fn recompute_subtree(&mut self) {
        if !self.is_directory() {
            return;
        }
        for child in &mut self.children {
            child.recompute_subtree();
        }
        self.selection_state = self.derived_state();
    }

    /// Sorts children of every directory in this subtree into display order.
    pub fn sort_subtree(&mut self) {
        self.children.sort_by(display_order);
        for child in &mut self.children {
            child.sort_subtree();
        }
    }

    /// Drops directories that end up without any file beneath them.
    pub fn prune_empty_directories(&mut self) {
        self.children.retain_mut(|child| {
            if child.is_directory() {
                child.prune_empty_directories();
                !child.children.is_empty()
            } else {
                true
            }
        });
    }

    /// Number of file nodes in this subtree.
    pub fn leaf_count(&self) -> usize {
        match self.kind {
            NodeKind::File => 1,
            NodeKind::Directory => self.children.iter().map(Node::leaf_count).sum(),
        }
    }

    /// Visits every node in pre-order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

/// Directories before files, then case-insensitive by name.
pub fn display_order(a: &Node, b: &Node) -> Ordering {
    match (a.is_directory(), b.is_directory()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a
            .name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name)),
    }
}

/// A complete tree for one session, together with the root its relative
/// paths were taken from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionTree {
    pub root: Node,
    /// Joined in front of every leaf path on submission. `None` when leaf
    /// paths are already usable as-is.
    pub base: Option<String>,
}

impl SelectionTree {
    pub fn empty() -> Self {
        Self {
            root: Node::directory("", ROOT_PATH),
            base: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }
}

impl Default for SelectionTree {
    fn default() -> Self {
        Self::empty()
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit(SEPARATOR).next().unwrap_or(path)
}

/// Builds a tree from canonical relative paths. Every node starts checked.
///
/// Directories are created on demand and reused, so the same path listed twice
/// does not produce duplicate siblings. A bare entry that another entry lists
/// files beneath is treated as that directory.
pub fn build(set: &PathSet) -> SelectionTree {
    let root_name = set.root.as_deref().map(last_segment).unwrap_or_default();
    let mut root = Node::directory(root_name, ROOT_PATH);

    for path in set.iter() {
        insert_path(&mut root, path);
    }

    root.sort_subtree();
    root.recompute_subtree();
    tracing::debug!(
        "Built selection tree with {} files from {} entries",
        root.leaf_count(),
        set.len()
    );

    SelectionTree {
        root,
        base: set.root.clone(),
    }
}

fn insert_path(root: &mut Node, path: &str) {
    let segments: Vec<&str> = path.split(SEPARATOR).collect();
    let mut current = root;

    for (depth, segment) in segments.iter().enumerate() {
        let is_leaf = depth == segments.len() - 1;
        let node_path = segments[..=depth].join("/");

        let index = match current.children.iter().position(|c| c.name == *segment) {
            Some(index) => {
                let existing = &mut current.children[index];
                if !is_leaf && !existing.is_directory() {
                    // Listed on its own earlier, now known to hold files.
                    existing.kind = NodeKind::Directory;
                }
                index
            }
            None => {
                let node = if is_leaf {
                    Node::file(*segment, node_path, true)
                } else {
                    Node::directory(*segment, node_path)
                };
                current.children.push(node);
                current.children.len() - 1
            }
        };
        current = &mut current.children[index];
    }
}

/// The shape in which the preview source hands over a tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedNode {
    #[serde(rename = "type", default)]
    pub kind: Option<NodeKind>,
    #[serde(default)]
    pub name: Option<String>,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<SerializedNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,
}

impl SerializedNode {
    pub fn file(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            kind: Some(NodeKind::File),
            name: Some(last_segment(&path).to_string()),
            path,
            children: None,
            selected: None,
        }
    }

    pub fn directory(path: impl Into<String>, children: Vec<SerializedNode>) -> Self {
        let path = path.into();
        Self {
            kind: Some(NodeKind::Directory),
            name: Some(last_segment(&path).to_string()),
            path,
            children: Some(children),
            selected: None,
        }
    }
}

/// How the initial selection of an adopted tree is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AdoptPolicy {
    /// Everything the user asked to open starts selected.
    #[default]
    SelectAll,
    SelectNone,
    /// Use each file's `selected` flag; unset means unchecked.
    PreserveSelected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdoptOptions {
    pub policy: AdoptPolicy,
    pub remove_empty_directories: bool,
}

/// Adopts a pre-built tree with every node selected.
pub fn adopt(nodes: Vec<SerializedNode>) -> Result<SelectionTree, CoreError> {
    adopt_with(nodes, AdoptOptions::default())
}

/// Parses the preview source's JSON and adopts the result.
pub fn adopt_json(json: &str, options: AdoptOptions) -> Result<SelectionTree, CoreError> {
    let nodes: Vec<SerializedNode> = serde_json::from_str(json)
        .map_err(|e| CoreError::malformed(ROOT_PATH, format!("invalid tree JSON: {e}")))?;
    adopt_with(nodes, options)
}

pub fn adopt_with(
    nodes: Vec<SerializedNode>,
    options: AdoptOptions,
) -> Result<SelectionTree, CoreError> {
    let mut seen = HashSet::new();
    let mut root = Node::directory("", ROOT_PATH);
    seen.insert(ROOT_PATH.to_string());

    for node in nodes {
        root.children.push(convert_node(node, options.policy, &mut seen)?);
    }

    if options.remove_empty_directories {
        root.prune_empty_directories();
    }
    root.sort_subtree();
    root.recompute_subtree();

    Ok(SelectionTree { root, base: None })
}

fn convert_node(
    node: SerializedNode,
    policy: AdoptPolicy,
    seen: &mut HashSet<String>,
) -> Result<Node, CoreError> {
    let kind = node
        .kind
        .ok_or_else(|| CoreError::malformed(&node.path, "node has no type"))?;

    if !seen.insert(node.path.clone()) {
        return Err(CoreError::malformed(&node.path, "path appears more than once"));
    }

    let name = node
        .name
        .unwrap_or_else(|| last_segment(&node.path).to_string());

    match kind {
        NodeKind::File => {
            if node.children.as_ref().is_some_and(|c| !c.is_empty()) {
                return Err(CoreError::malformed(&node.path, "file node carries children"));
            }
            let checked = match policy {
                AdoptPolicy::SelectAll => true,
                AdoptPolicy::SelectNone => false,
                AdoptPolicy::PreserveSelected => node.selected.unwrap_or(false),
            };
            Ok(Node::file(name, node.path, checked))
        }
        NodeKind::Directory => {
            let mut directory = Node::directory(name, node.path);
            for child in node.children.unwrap_or_default() {
                directory.children.push(convert_node(child, policy, seen)?);
            }
            Ok(directory)
        }
    }
}
