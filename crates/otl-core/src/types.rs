//! Core data types for the outline synchronization engine.
//!
//! Everything here is a plain value type. Outline nodes are rebuilt
//! wholesale on every refresh; nothing survives a refresh by identity, so
//! consumers re-resolve selections and visibility by [`NodeId`] or cell
//! index afterwards.

use std::collections::HashMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Kind of a notebook cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    /// A markdown/markup cell. Only these are scanned for headings.
    Markup,
    /// Any other cell kind (code, raw, ...).
    Other,
}

/// A markdown heading found in a markup cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// The text content of the heading, trailing hashes stripped.
    pub text: String,
    /// The heading level (1-6 for `#` through `######`).
    pub level: u8,
    /// The line number within the cell where the heading appears.
    pub line_number: usize,
}

/// Stable identifier for an outline node across a single structure.
///
/// `slot` is the heading's position within its cell, so a cell with
/// multiple heading lines still yields distinct ids. Index maps are keyed
/// by this id rather than by node references, which keeps the structure
/// free of ownership cycles and makes wholesale rebuilds trivial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    /// Index of the cell that owns the heading.
    pub cell_index: usize,
    /// Position of the heading within its cell (0 = first heading).
    pub slot: usize,
}

impl NodeId {
    /// Creates a node id for the given cell and in-cell position.
    #[must_use]
    pub const fn new(cell_index: usize, slot: usize) -> Self {
        Self { cell_index, slot }
    }
}

/// A half-open range `[start, end)` of cell indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRange {
    /// First cell index in the range.
    pub start: usize,
    /// One past the last cell index in the range.
    pub end: usize,
}

impl CellRange {
    /// Creates a new cell range.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Whether the given cell index falls inside the range.
    #[must_use]
    pub const fn contains(&self, cell_index: usize) -> bool {
        self.start <= cell_index && cell_index < self.end
    }

    /// Whether the range covers no cells.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// One heading in the outline, plus the span of cells it structurally owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineNode {
    /// Stable identifier within the current structure.
    pub id: NodeId,
    /// The heading this node represents.
    pub heading: Heading,
    /// Index of the cell that owns the heading.
    pub cell_index: usize,
    /// Cells under this heading, from the heading cell up to (excluding)
    /// the next heading of equal or lesser level.
    pub child_range: CellRange,
    /// Whether the heading cell is currently inside the editor viewport.
    pub in_view: bool,
}

/// The complete outline structure for one document, rebuilt per refresh.
///
/// Parent and children relations are separate index maps keyed by
/// [`NodeId`]; a node's parent is the nearest preceding node with a
/// strictly smaller level, and nodes with no such predecessor are roots.
#[derive(Debug, Clone, Default)]
pub struct OutlineStructure {
    /// All nodes in document order (by cell index, then in-cell position).
    pub nodes: Vec<OutlineNode>,
    /// Parent map; roots are absent.
    pub parent: HashMap<NodeId, NodeId>,
    /// Children map; every node has an entry, leaves map to empty vecs.
    pub children: HashMap<NodeId, Vec<NodeId>>,
}

impl OutlineStructure {
    /// Looks up a node by id.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&OutlineNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Root node ids in document order.
    #[must_use]
    pub fn roots(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| !self.parent.contains_key(&n.id))
            .map(|n| n.id)
            .collect()
    }

    /// Whether the structure holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Identity of a notebook editor, opaque to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EditorId(pub String);

impl EditorId {
    /// Creates an editor id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for EditorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Whether a selection change came from the user or from this system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOrigin {
    /// The end user changed the selection.
    User,
    /// The engine changed the selection programmatically.
    System,
}

/// A debounced notebook selection change, used transiently to coordinate
/// feedback-loop avoidance. Never persisted.
#[derive(Debug, Clone)]
pub struct SelectionChangeEvent {
    /// The editor whose selection changed.
    pub editor: EditorId,
    /// The selected cell ranges, in order.
    pub selections: Vec<CellRange>,
    /// Whether the change was user- or system-driven.
    pub origin: SelectionOrigin,
    /// When the change was observed.
    pub timestamp: Instant,
}
