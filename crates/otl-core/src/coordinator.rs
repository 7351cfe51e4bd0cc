//! Debounced scheduling of outline refreshes.
//!
//! Document edits arrive far faster than the outline needs to rebuild.
//! The coordinator collapses bursts into a single trailing-edge refresh
//! and skips work entirely while the outline view is hidden, flushing one
//! deferred refresh when the view becomes visible again.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::debug;

use crate::debounce::Debouncer;
use crate::host::DocumentSnapshot;
use crate::view_model::OutlineViewModel;
use crate::Result;

/// Supplies the current document at refresh time, or `None` when no
/// notebook editor is active (which refreshes to an empty outline).
pub type SnapshotFn = Arc<dyn Fn() -> Option<DocumentSnapshot> + Send + Sync>;

/// Coalesces "the document changed, recompute the outline" requests.
pub struct UpdateCoordinator {
    view_model: Arc<Mutex<OutlineViewModel>>,
    snapshot_fn: SnapshotFn,
    debouncer: Debouncer,
    pending_while_hidden: bool,
    view_visible: bool,
}

impl UpdateCoordinator {
    /// Creates a coordinator over the shared view model. The view is
    /// assumed visible until [`Self::set_view_visible`] says otherwise.
    #[must_use]
    pub fn new(
        view_model: Arc<Mutex<OutlineViewModel>>,
        snapshot_fn: SnapshotFn,
        debounce_delay: Duration,
    ) -> Self {
        Self {
            view_model,
            snapshot_fn,
            debouncer: Debouncer::new(debounce_delay),
            pending_while_hidden: false,
            view_visible: true,
        }
    }

    /// Requests an outline refresh.
    ///
    /// While the view is hidden this only records that an update is
    /// needed. Otherwise it (re)arms the debounce timer; calls within the
    /// window collapse into exactly one refresh, pulling a fresh document
    /// snapshot when the timer fires.
    pub fn schedule_update(&mut self) {
        if !self.view_visible {
            self.pending_while_hidden = true;
            return;
        }

        let view_model = Arc::clone(&self.view_model);
        let snapshot_fn = Arc::clone(&self.snapshot_fn);
        self.debouncer.schedule(move || {
            let document = snapshot_fn().unwrap_or_default();
            view_model
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .refresh(&document);
        });
    }

    /// Reports a visibility change of the outline view. Transitioning
    /// hidden -> visible flushes a deferred update, if any.
    pub fn set_view_visible(&mut self, visible: bool) {
        self.view_visible = visible;
        if visible && self.pending_while_hidden {
            self.pending_while_hidden = false;
            debug!("Outline view became visible, flushing deferred update");
            self.schedule_update();
        }
    }

    /// Whether the outline view is currently visible.
    #[must_use]
    pub const fn is_view_visible(&self) -> bool {
        self.view_visible
    }

    /// Clears any running timer and the pending-while-hidden flag.
    pub fn cancel_pending_updates(&mut self) {
        self.debouncer.cancel();
        self.pending_while_hidden = false;
    }

    /// Updates the debounce delay for future scheduling. Negative delays
    /// are rejected with [`crate::Error::InvalidArgument`].
    pub fn set_debounce_delay(&mut self, delay_ms: i64) -> Result<()> {
        self.debouncer.set_delay_ms(delay_ms)?;
        debug!("Outline update debounce set to {delay_ms}ms");
        Ok(())
    }
}
