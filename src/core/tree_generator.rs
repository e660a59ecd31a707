//! Generates an ASCII representation of a selection tree.

use super::tree::{Node, SelectionState, SelectionTree};

/// A utility struct for rendering a selection tree as text.
///
/// This struct is stateless and provides methods as associated functions.
pub struct TreeGenerator;

impl TreeGenerator {
    /// Renders the tree with one line per node and a tri-state marker in
    /// front of each name.
    pub fn generate_tree(tree: &SelectionTree) -> String {
        let root = &tree.root;
        let root_name = if root.name.is_empty() { "." } else { &root.name };

        let mut result = String::new();
        result.push_str(&format!("{} {}/\n", Self::marker(root), root_name));
        Self::render_children(&root.children, &mut result, "");
        result
    }

    fn marker(node: &Node) -> &'static str {
        match node.selection_state {
            SelectionState::Checked => "[x]",
            SelectionState::Unchecked => "[ ]",
            SelectionState::Indeterminate => "[-]",
        }
    }

    /// Renders the children of a tree node. Children are already in display
    /// order.
    fn render_children(children: &[Node], result: &mut String, prefix: &str) {
        for (i, node) in children.iter().enumerate() {
            let is_last = i == children.len() - 1;

            let connector = if is_last { "└── " } else { "├── " };
            let icon = if node.is_directory() { "📁 " } else { "📄 " };

            result.push_str(&format!(
                "{prefix}{connector}{} {icon}{}\n",
                Self::marker(node),
                node.name
            ));

            if !node.children.is_empty() {
                let new_prefix = if is_last {
                    format!("{prefix}    ")
                } else {
                    format!("{prefix}│   ")
                };

                Self::render_children(&node.children, result, &new_prefix);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pathset::normalize;
    use crate::core::selection::SelectionEngine;
    use crate::core::tree::build;

    #[test]
    fn test_generate_tree_shows_tri_state_markers() {
        let set = normalize([
            "/work/proj/a/b.txt",
            "/work/proj/a/c.txt",
            "/work/proj/a/deep/e.rs",
            "/work/proj/d.txt",
        ])
        .unwrap();
        let mut engine = SelectionEngine::new(build(&set));
        engine.toggle("a/c.txt").unwrap();

        insta::assert_snapshot!(TreeGenerator::generate_tree(engine.tree()), @r"
        [-] proj/
        ├── [-] 📁 a
        │   ├── [x] 📁 deep
        │   │   └── [x] 📄 e.rs
        │   ├── [x] 📄 b.txt
        │   └── [ ] 📄 c.txt
        └── [x] 📄 d.txt
        ");
    }

    #[test]
    fn test_generate_tree_for_empty_tree() {
        let rendered = TreeGenerator::generate_tree(&SelectionTree::empty());
        assert_eq!(rendered, "[ ] ./\n");
    }
}
