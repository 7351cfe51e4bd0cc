//! Contracts the engine consumes from the surrounding editor integration.
//!
//! The engine never talks to a concrete editor. The integration layer
//! implements these traits, delivers host events into
//! [`crate::OutlineEngine`], and pulls [`DocumentSnapshot`]s on demand.
//! Implementations are expected to use interior mutability where the host
//! API requires it; the engine only holds shared references.

use async_trait::async_trait;

use crate::{CellKind, CellRange, EditorId, NodeId, Result};

/// Immutable snapshot of one notebook cell.
#[derive(Debug, Clone)]
pub struct CellSnapshot {
    /// The cell's kind; only markup cells are scanned for headings.
    pub kind: CellKind,
    /// The cell's full text.
    pub text: String,
}

impl CellSnapshot {
    /// Creates a markup cell snapshot.
    pub fn markup(text: impl Into<String>) -> Self {
        Self {
            kind: CellKind::Markup,
            text: text.into(),
        }
    }

    /// Creates a non-markup cell snapshot.
    pub fn code(text: impl Into<String>) -> Self {
        Self {
            kind: CellKind::Other,
            text: text.into(),
        }
    }
}

/// Immutable snapshot of a whole notebook document, pulled from the editor
/// at refresh time. The outline is always rebuilt from the latest snapshot
/// and never persisted.
#[derive(Debug, Clone, Default)]
pub struct DocumentSnapshot {
    /// The ordered cells of the document.
    pub cells: Vec<CellSnapshot>,
}

impl DocumentSnapshot {
    /// Creates a snapshot from ordered cells.
    #[must_use]
    pub fn new(cells: Vec<CellSnapshot>) -> Self {
        Self { cells }
    }

    /// Number of cells in the document.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

/// A live notebook editor surface.
pub trait NotebookEditor: Send + Sync {
    /// Stable identity of this editor.
    fn id(&self) -> EditorId;

    /// Snapshot of the editor's current document.
    fn snapshot(&self) -> DocumentSnapshot;

    /// The currently selected cell ranges, in order.
    fn selections(&self) -> Vec<CellRange>;

    /// Replaces the editor's selection. The host surface is expected to
    /// emit its native selection-changed notification in response, which
    /// the integration routes back into the engine.
    fn set_selections(&self, selections: Vec<CellRange>);

    /// The cell ranges currently inside the viewport.
    fn visible_ranges(&self) -> Vec<CellRange>;

    /// Whether the editor has been closed.
    fn is_closed(&self) -> bool;
}

/// The hierarchical outline view rendered from the engine's structure.
#[async_trait]
pub trait OutlineView: Send + Sync {
    /// Scrolls the view so the given node is visible. When `select` is
    /// false the view's selection state must not change.
    async fn reveal(&self, id: NodeId, select: bool) -> Result<()>;

    /// Whether the view is currently visible to the user.
    fn is_visible(&self) -> bool;
}

/// The host-native outline pane. The engine cannot query or mutate it;
/// the only available operation is an opaque best-effort refresh.
#[async_trait]
pub trait HostOutline: Send + Sync {
    /// Asks the host to refocus/refresh its outline pane.
    async fn refresh_focus(&self) -> Result<()>;
}
