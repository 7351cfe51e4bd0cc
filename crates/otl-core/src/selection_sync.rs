//! Bidirectional selection synchronization between the editor and the
//! hierarchical outline view.
//!
//! Editor -> outline is the one-way, non-looping half: the most specific
//! enclosing heading is revealed without changing the outline's selection
//! state, so nothing cascades back. Outline -> editor goes through the
//! [`SelectionChangeDetector`] so the resulting event is tagged as
//! system-driven and does not re-enter outline-selection logic.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use crate::detector::SelectionChangeDetector;
use crate::host::{NotebookEditor, OutlineView};
use crate::{CellRange, NodeId, OutlineNode, OutlineStructure};

/// Translates between selected outline nodes and selected cell ranges.
pub struct OutlineSelectionSync {
    view: Arc<dyn OutlineView>,
    detector: Option<SelectionChangeDetector>,
    current_section: Mutex<Option<NodeId>>,
}

impl OutlineSelectionSync {
    /// Creates a selection sync over the outline view. When a detector is
    /// supplied, outline -> editor changes are routed through it.
    #[must_use]
    pub fn new(view: Arc<dyn OutlineView>, detector: Option<SelectionChangeDetector>) -> Self {
        Self {
            view,
            detector,
            current_section: Mutex::new(None),
        }
    }

    /// Sync the editor's position to the outline view.
    ///
    /// Takes the first selected range's start as the primary cursor cell
    /// and reveals the most specific enclosing heading (greatest level,
    /// ties to the latest node in document order) without selecting it.
    /// No-op when nothing encloses the cursor or when the section has not
    /// changed since the last sync.
    pub async fn sync_editor_to_outline(&self, editor: &dyn NotebookEditor, nodes: &[OutlineNode]) {
        if nodes.is_empty() {
            return;
        }

        let selections = editor.selections();
        let Some(primary) = selections.first().map(|range| range.start) else {
            return;
        };

        let mut best: Option<&OutlineNode> = None;
        for node in nodes {
            if node.child_range.contains(primary)
                && best.is_none_or(|b| node.heading.level >= b.heading.level)
            {
                best = Some(node);
            }
        }
        let Some(best) = best else {
            return;
        };

        {
            let mut current = self
                .current_section
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if *current == Some(best.id) {
                return;
            }
            *current = Some(best.id);
        }

        debug!(cell = best.cell_index, "Revealing enclosing outline section");
        if let Err(err) = self.view.reveal(best.id, false).await {
            warn!("Failed to sync editor selection to outline: {err}");
        }
    }

    /// Sync selected outline nodes to the editor.
    ///
    /// Each node maps to its heading cell as a single-cell range. No-op
    /// without an editor or selected nodes.
    pub fn sync_outline_to_editor(
        &self,
        selected: &[NodeId],
        structure: &OutlineStructure,
        editor: Option<&dyn NotebookEditor>,
    ) {
        let Some(editor) = editor else {
            return;
        };
        if selected.is_empty() {
            return;
        }

        let ranges: Vec<CellRange> = selected
            .iter()
            .filter_map(|id| structure.node(*id))
            .map(|node| CellRange::new(node.cell_index, node.cell_index + 1))
            .collect();
        if ranges.is_empty() {
            return;
        }

        self.apply_selection(editor, ranges);
    }

    /// Selects every cell under a heading (its whole child range).
    pub fn select_child_cells(
        &self,
        id: NodeId,
        structure: &OutlineStructure,
        editor: Option<&dyn NotebookEditor>,
    ) {
        let Some(editor) = editor else {
            return;
        };
        let Some(node) = structure.node(id) else {
            return;
        };

        self.apply_selection(editor, vec![node.child_range]);
    }

    /// Forgets the last synced section, e.g. after the structure was
    /// rebuilt and node ids no longer resolve.
    pub fn reset_current_section(&self) {
        *self
            .current_section
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn apply_selection(&self, editor: &dyn NotebookEditor, ranges: Vec<CellRange>) {
        if let Some(detector) = &self.detector {
            // Route through the detector so the resulting event is tagged
            // as system-driven.
            detector.trigger_selection_change(editor, ranges);
        } else {
            editor.set_selections(ranges);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::hierarchy::HierarchyBuilder;
    use crate::host::DocumentSnapshot;
    use crate::{EditorId, Heading};
    use async_trait::async_trait;
    use std::time::Duration;

    struct MockView {
        reveals: Mutex<Vec<(NodeId, bool)>>,
        fail: bool,
    }

    impl MockView {
        fn new() -> Self {
            Self {
                reveals: Mutex::new(Vec::new()),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl OutlineView for MockView {
        async fn reveal(&self, id: NodeId, select: bool) -> crate::Result<()> {
            if self.fail {
                return Err(crate::Error::Sync("reveal failed".to_string()));
            }
            self.reveals.lock().unwrap().push((id, select));
            Ok(())
        }
        fn is_visible(&self) -> bool {
            true
        }
    }

    struct MockEditor {
        selections: Mutex<Vec<CellRange>>,
        closed: bool,
    }

    impl MockEditor {
        fn with_selection(range: CellRange) -> Self {
            Self {
                selections: Mutex::new(vec![range]),
                closed: false,
            }
        }
    }

    impl NotebookEditor for MockEditor {
        fn id(&self) -> EditorId {
            EditorId::new("nb")
        }
        fn snapshot(&self) -> DocumentSnapshot {
            DocumentSnapshot::default()
        }
        fn selections(&self) -> Vec<CellRange> {
            self.selections.lock().unwrap().clone()
        }
        fn set_selections(&self, selections: Vec<CellRange>) {
            *self.selections.lock().unwrap() = selections;
        }
        fn visible_ranges(&self) -> Vec<CellRange> {
            Vec::new()
        }
        fn is_closed(&self) -> bool {
            self.closed
        }
    }

    fn node(cell: usize, level: u8) -> OutlineNode {
        OutlineNode {
            id: NodeId::new(cell, 0),
            heading: Heading {
                text: format!("h{cell}"),
                level,
                line_number: 0,
            },
            cell_index: cell,
            child_range: CellRange::new(cell, cell + 1),
            in_view: false,
        }
    }

    fn structure() -> OutlineStructure {
        // A(1, cell0), B(2, cell2), C(1, cell5) in a 7-cell document.
        HierarchyBuilder::new().build(vec![node(0, 1), node(2, 2), node(5, 1)], 7)
    }

    #[tokio::test]
    async fn test_reveals_most_specific_enclosing_section_without_select() {
        let view = Arc::new(MockView::new());
        let sync = OutlineSelectionSync::new(Arc::clone(&view) as Arc<dyn OutlineView>, None);
        let structure = structure();
        let editor = MockEditor::with_selection(CellRange::new(3, 4));

        sync.sync_editor_to_outline(&editor, &structure.nodes).await;

        // Cell 3 is inside both A [0,5) and B [2,5); B is deeper.
        let reveals = view.reveals.lock().unwrap();
        assert_eq!(reveals.as_slice(), &[(NodeId::new(2, 0), false)]);
    }

    #[tokio::test]
    async fn test_unchanged_section_is_not_revealed_twice() {
        let view = Arc::new(MockView::new());
        let sync = OutlineSelectionSync::new(Arc::clone(&view) as Arc<dyn OutlineView>, None);
        let structure = structure();

        let editor = MockEditor::with_selection(CellRange::new(3, 4));
        sync.sync_editor_to_outline(&editor, &structure.nodes).await;
        let editor = MockEditor::with_selection(CellRange::new(4, 5));
        sync.sync_editor_to_outline(&editor, &structure.nodes).await;

        assert_eq!(view.reveals.lock().unwrap().len(), 1);

        sync.reset_current_section();
        let editor = MockEditor::with_selection(CellRange::new(4, 5));
        sync.sync_editor_to_outline(&editor, &structure.nodes).await;
        assert_eq!(view.reveals.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_no_enclosing_section_is_a_no_op() {
        let view = Arc::new(MockView::new());
        let sync = OutlineSelectionSync::new(Arc::clone(&view) as Arc<dyn OutlineView>, None);
        // Only node: [2,5). Cursor in cell 0 is outside.
        let structure = HierarchyBuilder::new().build(vec![node(2, 2)], 7);
        let editor = MockEditor::with_selection(CellRange::new(0, 1));

        sync.sync_editor_to_outline(&editor, &structure.nodes).await;

        assert!(view.reveals.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reveal_failure_is_swallowed() {
        let view = Arc::new(MockView {
            reveals: Mutex::new(Vec::new()),
            fail: true,
        });
        let sync = OutlineSelectionSync::new(Arc::clone(&view) as Arc<dyn OutlineView>, None);
        let structure = structure();
        let editor = MockEditor::with_selection(CellRange::new(0, 1));

        // Must not panic or propagate.
        sync.sync_editor_to_outline(&editor, &structure.nodes).await;
    }

    #[tokio::test]
    async fn test_outline_to_editor_maps_heading_cells() {
        let view = Arc::new(MockView::new());
        let sync = OutlineSelectionSync::new(view as Arc<dyn OutlineView>, None);
        let structure = structure();
        let editor = MockEditor::with_selection(CellRange::new(0, 1));

        sync.sync_outline_to_editor(
            &[NodeId::new(2, 0), NodeId::new(5, 0)],
            &structure,
            Some(&editor),
        );

        assert_eq!(
            editor.selections(),
            vec![CellRange::new(2, 3), CellRange::new(5, 6)]
        );
    }

    #[tokio::test]
    async fn test_outline_to_editor_routes_through_detector() {
        let detector = SelectionChangeDetector::new(Duration::from_millis(10));
        let view = Arc::new(MockView::new());
        let sync = OutlineSelectionSync::new(view as Arc<dyn OutlineView>, Some(detector.clone()));
        let structure = structure();
        let editor = MockEditor::with_selection(CellRange::new(0, 1));

        sync.sync_outline_to_editor(&[NodeId::new(2, 0)], &structure, Some(&editor));
        assert_eq!(editor.selections(), vec![CellRange::new(2, 3)]);

        // The native event the host now emits gets tagged as system.
        detector.handle_selection_change(editor.id(), editor.selections());
        assert!(detector.is_programmatic_change(&editor.id()));
    }

    #[tokio::test]
    async fn test_outline_to_editor_no_ops() {
        let view = Arc::new(MockView::new());
        let sync = OutlineSelectionSync::new(view as Arc<dyn OutlineView>, None);
        let structure = structure();
        let editor = MockEditor::with_selection(CellRange::new(0, 1));

        sync.sync_outline_to_editor(&[NodeId::new(2, 0)], &structure, None);
        sync.sync_outline_to_editor(&[], &structure, Some(&editor));
        sync.sync_outline_to_editor(&[NodeId::new(42, 0)], &structure, Some(&editor));

        assert_eq!(editor.selections(), vec![CellRange::new(0, 1)]);
    }

    #[tokio::test]
    async fn test_select_child_cells_uses_whole_range() {
        let view = Arc::new(MockView::new());
        let sync = OutlineSelectionSync::new(view as Arc<dyn OutlineView>, None);
        let structure = structure();
        let editor = MockEditor::with_selection(CellRange::new(0, 1));

        sync.select_child_cells(NodeId::new(0, 0), &structure, Some(&editor));

        assert_eq!(editor.selections(), vec![CellRange::new(0, 5)]);
    }
}
