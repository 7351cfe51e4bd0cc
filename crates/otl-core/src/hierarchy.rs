//! Builds the outline hierarchy from the flat, ordered node list.
//!
//! Two linear passes: a stack pass that links every node to the nearest
//! preceding node with a strictly smaller level, then a range pass that
//! closes each node's child range at the next node of equal or lesser
//! level. The range pass walks document order directly rather than
//! re-deriving it from the tree.

use crate::{OutlineNode, OutlineStructure};

/// Builds parent/child maps and child cell ranges.
#[derive(Debug, Clone, Copy, Default)]
pub struct HierarchyBuilder;

impl HierarchyBuilder {
    /// Creates a new builder.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Builds the complete structure from placeholder nodes in document
    /// order. `cell_count` closes the last open range.
    ///
    /// Only the first heading of a cell (`slot == 0`) is structurally
    /// significant for ranges: later slots neither terminate another
    /// node's range nor own more than their own cell.
    #[must_use]
    pub fn build(&self, mut nodes: Vec<OutlineNode>, cell_count: usize) -> OutlineStructure {
        let mut structure = OutlineStructure::default();

        // Pass 1: parent links via a stack of (id, level).
        let mut stack: Vec<(crate::NodeId, u8)> = Vec::new();
        for node in &nodes {
            while stack
                .last()
                .is_some_and(|&(_, level)| level >= node.heading.level)
            {
                stack.pop();
            }

            if let Some(&(parent_id, _)) = stack.last() {
                structure.parent.insert(node.id, parent_id);
                structure
                    .children
                    .entry(parent_id)
                    .or_default()
                    .push(node.id);
            }

            structure.children.entry(node.id).or_default();
            stack.push((node.id, node.heading.level));
        }

        // Pass 2: close each significant node's range at the next
        // significant node of equal or lesser level.
        for i in 0..nodes.len() {
            if nodes[i].id.slot != 0 {
                continue;
            }

            let level = nodes[i].heading.level;
            let end = nodes[i + 1..]
                .iter()
                .find(|next| next.id.slot == 0 && next.heading.level <= level)
                .map_or(cell_count, |next| next.cell_index);

            nodes[i].child_range.end = end;
        }

        structure.nodes = nodes;
        structure
    }
}
