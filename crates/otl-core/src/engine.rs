//! Activation-time wiring of the outline synchronization engine.
//!
//! [`OutlineEngine`] is the explicit context object holding every
//! component; there are no module-level singletons. The host integration
//! constructs one at activation, forwards host events into its entry
//! points, and calls [`OutlineEngine::deactivate`] on teardown.
//!
//! Event wiring mirrors the product behavior: document and active-editor
//! changes drive the debounced refresh; debounced selection events drive
//! the editor -> outline reveal plus a best-effort host-outline nudge;
//! outline selections drive the outline -> editor sync (tagged as
//! system-driven) plus the same nudge.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, info};

use crate::coordinator::{SnapshotFn, UpdateCoordinator};
use crate::detector::{SelectionChangeDetector, SelectionSubscription};
use crate::host::{HostOutline, NotebookEditor, OutlineView};
use crate::selection_sync::OutlineSelectionSync;
use crate::sync_manager::OutlineSyncManager;
use crate::view_model::{OutlineChange, OutlineViewModel, SubscriptionId};
use crate::visible::VisibleRangeTracker;
use crate::{CellRange, EditorId, NodeId, Result, SelectionChangeEvent, Settings};

type SharedEditor = Arc<dyn NotebookEditor>;

/// The engine context: owns all components and routes host events.
pub struct OutlineEngine {
    view_model: Arc<Mutex<OutlineViewModel>>,
    coordinator: Mutex<UpdateCoordinator>,
    detector: SelectionChangeDetector,
    selection_sync: Arc<OutlineSelectionSync>,
    tracker: VisibleRangeTracker,
    sync_manager: Arc<OutlineSyncManager>,
    host_outline: Arc<dyn HostOutline>,
    active_editor: Arc<Mutex<Option<SharedEditor>>>,
    subscription: Mutex<Option<SelectionSubscription>>,
    structure_subscription: SubscriptionId,
    outline_enabled: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn delay_ms(ms: u64) -> i64 {
    i64::try_from(ms).unwrap_or(i64::MAX)
}

impl OutlineEngine {
    /// Builds and wires the engine. Requires a Tokio runtime.
    pub fn activate(
        settings: &Settings,
        outline_view: Arc<dyn OutlineView>,
        host_outline: Arc<dyn HostOutline>,
    ) -> Arc<Self> {
        info!("Activating outline synchronization engine");

        let view_model = Arc::new(Mutex::new(OutlineViewModel::new()));
        let active_editor: Arc<Mutex<Option<SharedEditor>>> = Arc::new(Mutex::new(None));

        let snapshot_fn: SnapshotFn = {
            let active_editor = Arc::clone(&active_editor);
            Arc::new(move || lock(&active_editor).as_ref().map(|editor| editor.snapshot()))
        };

        let mut coordinator = UpdateCoordinator::new(
            Arc::clone(&view_model),
            snapshot_fn,
            Duration::from_millis(settings.outline.update_debounce_ms),
        );
        coordinator.set_view_visible(outline_view.is_visible());

        let detector =
            SelectionChangeDetector::new(Duration::from_millis(settings.sync.debounce_ms));
        let selection_sync = Arc::new(OutlineSelectionSync::new(
            outline_view,
            Some(detector.clone()),
        ));

        // A rebuilt structure invalidates node ids; forget the last synced
        // section so the same (cell, slot) id cannot suppress a reveal.
        let structure_subscription = {
            let selection_sync = Arc::clone(&selection_sync);
            lock(&view_model).subscribe(move |change| {
                if matches!(*change, OutlineChange::Structure) {
                    selection_sync.reset_current_section();
                }
            })
        };

        let engine = Arc::new(Self {
            tracker: VisibleRangeTracker::new(Arc::clone(&view_model)),
            view_model,
            coordinator: Mutex::new(coordinator),
            detector,
            selection_sync,
            sync_manager: Arc::new(OutlineSyncManager::new(settings.sync.clone())),
            host_outline,
            active_editor,
            subscription: Mutex::new(None),
            structure_subscription,
            outline_enabled: AtomicBool::new(settings.outline.enabled),
        });

        // Editor -> outline sync runs off debounced detector events.
        let weak = Arc::downgrade(&engine);
        let subscription = engine.detector.on_selection_change(move |event| {
            if let Some(engine) = weak.upgrade() {
                let event = event.clone();
                tokio::spawn(async move {
                    engine.handle_selection_event(event).await;
                });
            }
        });
        *lock(&engine.subscription) = Some(subscription);

        // Initial population for whatever editor becomes active first.
        engine.document_changed();
        engine
    }

    /// The shared view model, for the rendering layer.
    #[must_use]
    pub fn view_model(&self) -> Arc<Mutex<OutlineViewModel>> {
        Arc::clone(&self.view_model)
    }

    /// The shared selection change detector.
    #[must_use]
    pub const fn selection_detector(&self) -> &SelectionChangeDetector {
        &self.detector
    }

    /// The host-outline sync manager.
    #[must_use]
    pub fn sync_manager(&self) -> Arc<OutlineSyncManager> {
        Arc::clone(&self.sync_manager)
    }

    /// The document of the active editor changed.
    pub fn document_changed(&self) {
        if self.outline_enabled.load(Ordering::SeqCst) {
            lock(&self.coordinator).schedule_update();
        }
    }

    /// A different editor became active (or none is).
    pub fn active_editor_changed(&self, editor: Option<SharedEditor>) {
        *lock(&self.active_editor) = editor;
        self.selection_sync.reset_current_section();
        self.document_changed();
    }

    /// The outline view was shown or hidden.
    pub fn view_visibility_changed(&self, visible: bool) {
        lock(&self.coordinator).set_view_visible(visible);
    }

    /// The host reported a native selection change in an editor.
    pub fn editor_selection_changed(&self, editor: EditorId, selections: Vec<CellRange>) {
        self.detector.handle_selection_change(editor, selections);
    }

    /// The host reported a viewport change. Ignored for inactive editors.
    pub fn visible_ranges_changed(&self, editor: &EditorId, ranges: &[CellRange]) {
        let is_active = lock(&self.active_editor)
            .as_ref()
            .is_some_and(|active| active.id() == *editor);
        if !is_active {
            return;
        }
        self.tracker.visible_ranges_changed(ranges);
    }

    /// The user selected nodes in the hierarchical outline view.
    pub async fn outline_selection_changed(&self, selected: Vec<NodeId>) {
        let structure = {
            let mut view_model = lock(&self.view_model);
            let cells: Vec<usize> = selected.iter().map(|id| id.cell_index).collect();
            view_model.select_items(&cells);
            view_model.structure().clone()
        };

        let Some(editor) = lock(&self.active_editor).clone() else {
            return;
        };
        self.selection_sync
            .sync_outline_to_editor(&selected, &structure, Some(editor.as_ref()));
        self.sync_manager
            .sync_outline(editor.as_ref(), true, self.host_outline.as_ref())
            .await;
    }

    /// Selects every cell under a heading in the editor.
    pub async fn select_child_cells(&self, id: NodeId) {
        let structure = lock(&self.view_model).structure().clone();
        let Some(editor) = lock(&self.active_editor).clone() else {
            return;
        };
        self.selection_sync
            .select_child_cells(id, &structure, Some(editor.as_ref()));
        self.sync_manager
            .sync_outline(editor.as_ref(), true, self.host_outline.as_ref())
            .await;
    }

    /// Applies a configuration change to all live components.
    pub fn settings_changed(&self, settings: &Settings) -> Result<()> {
        settings.validate()?;

        self.detector
            .set_debounce_delay(delay_ms(settings.sync.debounce_ms))?;
        self.sync_manager.update_config(settings.sync.clone())?;

        let mut coordinator = lock(&self.coordinator);
        coordinator.set_debounce_delay(delay_ms(settings.outline.update_debounce_ms))?;

        let was_enabled = self
            .outline_enabled
            .swap(settings.outline.enabled, Ordering::SeqCst);
        if settings.outline.enabled {
            coordinator.schedule_update();
        } else if was_enabled {
            debug!("Outline disabled via configuration, cancelling pending updates");
            coordinator.cancel_pending_updates();
        }

        Ok(())
    }

    /// Tears down timers and subscriptions. Safe to call more than once.
    pub fn deactivate(&self) {
        info!("Deactivating outline synchronization engine");
        lock(&self.coordinator).cancel_pending_updates();
        if let Some(subscription) = lock(&self.subscription).take() {
            subscription.unsubscribe();
        }
        lock(&self.view_model).unsubscribe(self.structure_subscription);
        self.detector.dispose();
    }

    async fn handle_selection_event(&self, event: SelectionChangeEvent) {
        let Some(editor) = lock(&self.active_editor).clone() else {
            return;
        };
        if editor.id() != event.editor {
            return;
        }

        let nodes = lock(&self.view_model).nodes().to_vec();
        self.selection_sync
            .sync_editor_to_outline(editor.as_ref(), &nodes)
            .await;
        self.sync_manager
            .sync_outline(editor.as_ref(), true, self.host_outline.as_ref())
            .await;
    }
}
