//! Tracks which outline nodes are inside the editor viewport.
//!
//! A node counts as in view when its *heading cell* falls within any
//! reported visible range. Using the heading cell rather than the full
//! child range matches user expectation and avoids gaps between items.
//! The view model performs the diff and minimal notification.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use crate::view_model::OutlineViewModel;
use crate::{CellRange, NodeId};

/// Recomputes the in-viewport subset of outline nodes on viewport change.
pub struct VisibleRangeTracker {
    view_model: Arc<Mutex<OutlineViewModel>>,
}

impl VisibleRangeTracker {
    /// Creates a tracker over the shared view model.
    #[must_use]
    pub const fn new(view_model: Arc<Mutex<OutlineViewModel>>) -> Self {
        Self { view_model }
    }

    /// Handles a viewport change. An empty node list or no reported
    /// ranges clears the visible set.
    pub fn visible_ranges_changed(&self, ranges: &[CellRange]) {
        let mut view_model = self
            .view_model
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if view_model.nodes().is_empty() || ranges.is_empty() {
            view_model.update_visible_items(HashSet::new());
            return;
        }

        let visible: HashSet<NodeId> = view_model
            .nodes()
            .iter()
            .filter(|node| ranges.iter().any(|range| range.contains(node.cell_index)))
            .map(|node| node.id)
            .collect();

        view_model.update_visible_items(visible);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::host::{CellSnapshot, DocumentSnapshot};

    fn tracked() -> (VisibleRangeTracker, Arc<Mutex<OutlineViewModel>>) {
        let mut vm = OutlineViewModel::new();
        vm.refresh(&DocumentSnapshot::new(vec![
            CellSnapshot::markup("# A"),
            CellSnapshot::code("1"),
            CellSnapshot::markup("## B"),
            CellSnapshot::code("2"),
            CellSnapshot::markup("# C"),
        ]));
        let vm = Arc::new(Mutex::new(vm));
        (VisibleRangeTracker::new(Arc::clone(&vm)), vm)
    }

    fn in_view(vm: &Arc<Mutex<OutlineViewModel>>) -> Vec<usize> {
        vm.lock()
            .unwrap()
            .nodes()
            .iter()
            .filter(|n| n.in_view)
            .map(|n| n.cell_index)
            .collect()
    }

    #[test]
    fn test_membership_by_heading_cell() {
        let (tracker, vm) = tracked();

        tracker.visible_ranges_changed(&[CellRange::new(0, 3)]);
        assert_eq!(in_view(&vm), vec![0, 2]);

        tracker.visible_ranges_changed(&[CellRange::new(2, 5)]);
        assert_eq!(in_view(&vm), vec![2, 4]);
    }

    #[test]
    fn test_multiple_disjoint_ranges() {
        let (tracker, vm) = tracked();

        tracker.visible_ranges_changed(&[CellRange::new(0, 1), CellRange::new(4, 5)]);
        assert_eq!(in_view(&vm), vec![0, 4]);
    }

    #[test]
    fn test_no_ranges_clears_set() {
        let (tracker, vm) = tracked();

        tracker.visible_ranges_changed(&[CellRange::new(0, 5)]);
        assert_eq!(in_view(&vm).len(), 3);

        tracker.visible_ranges_changed(&[]);
        assert!(in_view(&vm).is_empty());
    }

    #[test]
    fn test_empty_outline_clears_set() {
        let vm = Arc::new(Mutex::new(OutlineViewModel::new()));
        let tracker = VisibleRangeTracker::new(Arc::clone(&vm));

        tracker.visible_ranges_changed(&[CellRange::new(0, 10)]);
        assert!(in_view(&vm).is_empty());
    }
}
