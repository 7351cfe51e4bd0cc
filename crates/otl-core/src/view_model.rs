//! The outline view model: current hierarchy, filter, and in-view state.
//!
//! Owns the single current [`OutlineStructure`], which `refresh` replaces
//! wholesale; there is never a partially rebuilt structure to observe.
//! Subscribers receive either a whole-structure notification or one
//! per-node notification for each node whose in-view flag flipped, which
//! bounds UI churn to the number of changed nodes under frequent viewport
//! updates.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::hierarchy::HierarchyBuilder;
use crate::host::DocumentSnapshot;
use crate::parser::HeadingParser;
use crate::{NodeId, OutlineNode, OutlineStructure, Result};

/// What changed in the outline, delivered to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlineChange {
    /// The whole structure was replaced; re-query everything.
    Structure,
    /// A single node's in-view flag changed.
    Node(NodeId),
}

/// Handle returned by [`OutlineViewModel::subscribe`]; pass back to
/// [`OutlineViewModel::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

type Subscriber = Arc<dyn Fn(&OutlineChange) + Send + Sync>;

/// Owns the current outline hierarchy and answers the view's queries.
pub struct OutlineViewModel {
    parser: HeadingParser,
    builder: HierarchyBuilder,
    structure: OutlineStructure,
    filter: String,
    visible: HashSet<NodeId>,
    selected_cells: BTreeSet<usize>,
    subscribers: Vec<(u64, Subscriber)>,
    next_subscription: u64,
}

impl Default for OutlineViewModel {
    fn default() -> Self {
        Self::new()
    }
}

impl OutlineViewModel {
    /// Creates an empty view model.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parser: HeadingParser::new(),
            builder: HierarchyBuilder::new(),
            structure: OutlineStructure::default(),
            filter: String::new(),
            visible: HashSet::new(),
            selected_cells: BTreeSet::new(),
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Recomputes the outline from a document snapshot.
    ///
    /// On failure the view model degrades to an empty structure and logs;
    /// it never propagates the error. Always ends by notifying
    /// subscribers of a structural change.
    pub fn refresh(&mut self, document: &DocumentSnapshot) {
        match self.rebuild(document) {
            Ok(structure) => {
                debug!(
                    nodes = structure.nodes.len(),
                    cells = document.cell_count(),
                    "Outline refreshed"
                );
                self.structure = structure;
            },
            Err(err) => {
                warn!("Failed to refresh outline: {err}");
                self.structure = OutlineStructure::default();
            },
        }

        // Nodes are rebuilt wholesale; visibility must be re-reported.
        self.visible.clear();
        self.notify(&OutlineChange::Structure);
    }

    fn rebuild(&self, document: &DocumentSnapshot) -> Result<OutlineStructure> {
        let nodes = self.parser.extract_headings(document);
        Ok(self.builder.build(nodes, document.cell_count()))
    }

    /// The current structure.
    #[must_use]
    pub const fn structure(&self) -> &OutlineStructure {
        &self.structure
    }

    /// All nodes in document order.
    #[must_use]
    pub fn nodes(&self) -> &[OutlineNode] {
        &self.structure.nodes
    }

    /// Top-level query: roots in document order, or, when a filter is
    /// active, the flat list of nodes whose heading text contains the
    /// filter (case-insensitive).
    #[must_use]
    pub fn roots(&self) -> Vec<NodeId> {
        if self.filter.is_empty() {
            return self.structure.roots();
        }

        let needle = self.filter.to_lowercase();
        self.structure
            .nodes
            .iter()
            .filter(|n| n.heading.text.to_lowercase().contains(&needle))
            .map(|n| n.id)
            .collect()
    }

    /// Children of a node in document order. Empty while a filter is
    /// active: the filtered view has no nesting.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        if !self.filter.is_empty() {
            return Vec::new();
        }
        self.structure.children.get(&id).cloned().unwrap_or_default()
    }

    /// Sets the filter text. Setting an unchanged value is a no-op;
    /// clearing restores hierarchical queries.
    pub fn set_filter(&mut self, text: &str) {
        let text = text.trim();
        if text == self.filter {
            return;
        }
        self.filter = text.to_string();
        self.notify(&OutlineChange::Structure);
    }

    /// The current filter text.
    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Clears the filter if one is set.
    pub fn clear_filter(&mut self) {
        self.set_filter("");
    }

    /// Replaces the in-view node set, flipping only the flags of nodes in
    /// the symmetric difference and notifying once per changed node.
    pub fn update_visible_items(&mut self, new_set: HashSet<NodeId>) {
        let previous = std::mem::take(&mut self.visible);

        // One index pass up front; flipping then costs only the change set.
        let positions: HashMap<NodeId, usize> = self
            .structure
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id, index))
            .collect();

        let mut changed = Vec::new();
        for &id in previous.difference(&new_set) {
            if let Some(&index) = positions.get(&id) {
                self.structure.nodes[index].in_view = false;
                changed.push(id);
            }
        }
        for &id in new_set.difference(&previous) {
            if let Some(&index) = positions.get(&id) {
                self.structure.nodes[index].in_view = true;
                changed.push(id);
            }
        }

        // Only track ids that resolve to current nodes.
        self.visible = new_set
            .into_iter()
            .filter(|id| positions.contains_key(id))
            .collect();

        for id in changed {
            self.notify(&OutlineChange::Node(id));
        }
    }

    /// Records the selected cell indices and returns the matching node
    /// ids in the current structure. Selection is tracked by cell index,
    /// so it survives a refresh by re-resolution rather than identity.
    pub fn select_items(&mut self, cell_indices: &[usize]) -> Vec<NodeId> {
        self.selected_cells = cell_indices.iter().copied().collect();
        self.selected_items()
    }

    /// Node ids whose owning cell is currently selected.
    #[must_use]
    pub fn selected_items(&self) -> Vec<NodeId> {
        self.structure
            .nodes
            .iter()
            .filter(|n| self.selected_cells.contains(&n.cell_index))
            .map(|n| n.id)
            .collect()
    }

    /// Registers a change subscriber.
    pub fn subscribe(
        &mut self,
        callback: impl Fn(&OutlineChange) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.subscribers.push((id, Arc::new(callback)));
        SubscriptionId(id)
    }

    /// Removes a subscriber.
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|(sid, _)| *sid != id.0);
    }

    fn notify(&self, change: &OutlineChange) {
        for (_, subscriber) in &self.subscribers {
            subscriber(change);
        }
    }
}
