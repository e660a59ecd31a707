//! The selection engine: tri-state toggling with propagation over one
//! [`SelectionTree`], plus the generation counter that guards against results
//! arriving for a tree that has since been replaced.

use std::collections::HashMap;

use super::error::CoreError;
use super::pathset::join_root;
use super::tree::{Node, NodeKind, SelectionState, SelectionTree, ROOT_PATH};

/// A mutable handle over the tree of the current session.
#[derive(Debug)]
pub struct SelectionEngine {
    tree: SelectionTree,
    /// Child-index chain from the root to every node, keyed by path.
    index: HashMap<String, Vec<usize>>,
    generation: u64,
}

impl Default for SelectionEngine {
    fn default() -> Self {
        Self::new(SelectionTree::empty())
    }
}

impl SelectionEngine {
    pub fn new(tree: SelectionTree) -> Self {
        let index = build_index(&tree.root);
        Self {
            tree,
            index,
            generation: 0,
        }
    }

    pub fn tree(&self) -> &SelectionTree {
        &self.tree
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn node(&self, path: &str) -> Option<&Node> {
        let chain = self.index.get(path)?;
        Some(node_at(&self.tree.root, chain))
    }

    /// Replaces the held tree wholesale and returns the new generation.
    pub fn reset(&mut self, tree: SelectionTree) -> u64 {
        self.index = build_index(&tree.root);
        self.tree = tree;
        self.generation += 1;
        tracing::debug!(
            "Selection tree reset to generation {} ({} files)",
            self.generation,
            self.tree.root.leaf_count()
        );
        self.generation
    }

    /// Discards the current tree.
    pub fn clear(&mut self) -> u64 {
        self.reset(SelectionTree::empty())
    }

    /// Replaces the tree only if no other reset happened since `ticket` was
    /// taken. Returns the new generation, or `None` for a stale result.
    pub fn reset_if_current(&mut self, ticket: u64, tree: SelectionTree) -> Option<u64> {
        if ticket != self.generation {
            tracing::warn!(
                "Discarding stale tree for generation {} (current is {})",
                ticket,
                self.generation
            );
            return None;
        }
        Some(self.reset(tree))
    }

    /// Flips the node at `path`.
    ///
    /// For a directory the whole subtree is forced to the new state first,
    /// then every directory in the subtree and every ancestor is recomputed
    /// bottom-up. The subtree is unchecked when it holds files and all of them
    /// are checked, and checked otherwise. Empty directories never count.
    pub fn toggle(&mut self, path: &str) -> Result<&SelectionTree, CoreError> {
        let chain = self
            .index
            .get(path)
            .cloned()
            .ok_or_else(|| CoreError::NodeNotFound(path.to_string()))?;

        let node = node_at_mut(&mut self.tree.root, &chain);
        let target = !all_files_checked(node);
        force_subtree(node, target);
        node.recompute_subtree();

        self.recompute_ancestors(&chain);
        tracing::debug!("Toggled `{}` to {}", path, if target { "on" } else { "off" });
        Ok(&self.tree)
    }

    /// Checks or unchecks every file in the tree.
    pub fn set_all(&mut self, checked: bool) -> &SelectionTree {
        force_subtree(&mut self.tree.root, checked);
        self.tree.root.recompute_subtree();
        &self.tree
    }

    /// Paths of all checked files, in display pre-order.
    pub fn selected_leaf_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        self.tree.root.walk(&mut |node| {
            if node.kind == NodeKind::File && node.selection_state == SelectionState::Checked {
                paths.push(node.path.clone());
            }
        });
        paths
    }

    /// Selected leaf paths joined onto the root they were made relative to.
    pub fn resolved_leaf_paths(&self) -> Vec<String> {
        let base = self.tree.base.as_deref();
        self.selected_leaf_paths()
            .into_iter()
            .map(|path| join_root(base, &path))
            .collect()
    }

    pub fn selected_count(&self) -> usize {
        self.selected_leaf_paths().len()
    }

    fn recompute_ancestors(&mut self, chain: &[usize]) {
        for depth in (0..chain.len()).rev() {
            let ancestor = node_at_mut(&mut self.tree.root, &chain[..depth]);
            ancestor.selection_state = ancestor.derived_state();
        }
    }
}

fn build_index(root: &Node) -> HashMap<String, Vec<usize>> {
    fn visit(node: &Node, chain: &mut Vec<usize>, index: &mut HashMap<String, Vec<usize>>) {
        index.entry(node.path.clone()).or_insert_with(|| chain.clone());
        for (i, child) in node.children.iter().enumerate() {
            chain.push(i);
            visit(child, chain, index);
            chain.pop();
        }
    }

    let mut index = HashMap::new();
    visit(root, &mut Vec::new(), &mut index);
    debug_assert!(index.contains_key(ROOT_PATH));
    index
}

fn node_at<'a>(root: &'a Node, chain: &[usize]) -> &'a Node {
    chain.iter().fold(root, |node, &i| &node.children[i])
}

fn node_at_mut<'a>(root: &'a mut Node, chain: &[usize]) -> &'a mut Node {
    let mut node = root;
    for &i in chain {
        node = &mut node.children[i];
    }
    node
}

/// Whether the subtree holds at least one file and every one is checked.
fn all_files_checked(node: &Node) -> bool {
    let mut any = false;
    let mut all = true;
    node.walk(&mut |n| {
        if n.kind == NodeKind::File {
            any = true;
            all &= n.selection_state == SelectionState::Checked;
        }
    });
    any && all
}

/// Top-down pass: every node in the subtree takes the target state.
fn force_subtree(node: &mut Node, checked: bool) {
    node.selection_state = SelectionState::from_checked(checked);
    for child in &mut node.children {
        force_subtree(child, checked);
    }
}
