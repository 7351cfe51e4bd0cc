//! Selection change detection with programmatic/user tagging.
//!
//! The detector wraps the host's native "selection changed" notifications.
//! When the engine itself applies a selection it goes through
//! [`SelectionChangeDetector::trigger_selection_change`], which raises a
//! flag that the next observed change consumes; the resulting event is
//! tagged [`SelectionOrigin::System`]. This tagging is how the rest of
//! the system avoids selection feedback loops. Delivery to subscribers is
//! trailing-edge debounced, and only the latest selections observed in
//! the window are delivered.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::debounce::Debouncer;
use crate::host::NotebookEditor;
use crate::{CellRange, EditorId, Result, SelectionChangeEvent, SelectionOrigin};

/// Per-editor record of the most recent observed change.
#[derive(Debug, Clone, Copy)]
pub struct SelectionContext {
    /// Origin of the last change.
    pub origin: SelectionOrigin,
    /// When the last change was observed.
    pub timestamp: Instant,
}

type SelectionCallback = Arc<dyn Fn(&SelectionChangeEvent) + Send + Sync>;

struct DetectorInner {
    programmatic: bool,
    contexts: HashMap<EditorId, SelectionContext>,
    pending: Option<SelectionChangeEvent>,
    callbacks: Vec<(u64, SelectionCallback)>,
    next_callback: u64,
    debouncer: Debouncer,
}

/// Handle returned by [`SelectionChangeDetector::on_selection_change`].
/// The callback stays registered for the lifetime of this handle.
pub struct SelectionSubscription {
    id: u64,
    inner: Weak<Mutex<DetectorInner>>,
}

impl SelectionSubscription {
    /// Removes the callback this handle refers to. Equivalent to dropping
    /// the handle.
    pub fn unsubscribe(self) {}
}

impl Drop for SelectionSubscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            lock(&inner).callbacks.retain(|(id, _)| *id != self.id);
        }
    }
}

/// Observes editor selection changes, tags each as user- or system-driven,
/// and debounces delivery to subscribers.
#[derive(Clone)]
pub struct SelectionChangeDetector {
    inner: Arc<Mutex<DetectorInner>>,
}

fn lock(inner: &Mutex<DetectorInner>) -> std::sync::MutexGuard<'_, DetectorInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SelectionChangeDetector {
    /// Creates a detector with the given debounce delay.
    #[must_use]
    pub fn new(debounce_delay: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(DetectorInner {
                programmatic: false,
                contexts: HashMap::new(),
                pending: None,
                callbacks: Vec::new(),
                next_callback: 0,
                debouncer: Debouncer::new(debounce_delay),
            })),
        }
    }

    /// Entry point for the host's native selection-changed notification.
    ///
    /// Reads and clears the programmatic flag to tag the event's origin,
    /// records the per-editor context, and (re)arms the debounce timer;
    /// subscribers see only the latest selections in the window.
    pub fn handle_selection_change(&self, editor: EditorId, selections: Vec<CellRange>) {
        let mut inner = lock(&self.inner);

        let origin = if inner.programmatic {
            SelectionOrigin::System
        } else {
            SelectionOrigin::User
        };
        inner.programmatic = false;

        let timestamp = Instant::now();
        inner
            .contexts
            .insert(editor.clone(), SelectionContext { origin, timestamp });

        debug!(
            ranges = selections.len(),
            programmatic = matches!(origin, SelectionOrigin::System),
            "Selection change detected"
        );

        inner.pending = Some(SelectionChangeEvent {
            editor,
            selections,
            origin,
            timestamp,
        });

        let shared = Arc::clone(&self.inner);
        inner.debouncer.schedule(move || {
            let (event, callbacks) = {
                let mut inner = lock(&shared);
                let Some(event) = inner.pending.take() else {
                    return;
                };
                (event, inner.callbacks.clone())
            };
            for (_, callback) in callbacks {
                callback(&event);
            }
        });
    }

    /// Applies a selection programmatically so the resulting native event
    /// is tagged [`SelectionOrigin::System`].
    ///
    /// No-op when the editor is closed.
    pub fn trigger_selection_change(&self, editor: &dyn NotebookEditor, ranges: Vec<CellRange>) {
        if editor.is_closed() {
            warn!("Ignoring programmatic selection change for closed editor");
            return;
        }

        lock(&self.inner).programmatic = true;
        debug!(
            ranges = ranges.len(),
            "Programmatic selection change triggered"
        );

        // The host re-enters handle_selection_change with its native
        // notification, synchronously or asynchronously.
        editor.set_selections(ranges);
    }

    /// Registers a callback for debounced selection change events.
    pub fn on_selection_change(
        &self,
        callback: impl Fn(&SelectionChangeEvent) + Send + Sync + 'static,
    ) -> SelectionSubscription {
        let mut inner = lock(&self.inner);
        let id = inner.next_callback;
        inner.next_callback += 1;
        inner.callbacks.push((id, Arc::new(callback)));
        SelectionSubscription {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Whether the last observed change for an editor was programmatic.
    #[must_use]
    pub fn is_programmatic_change(&self, editor: &EditorId) -> bool {
        lock(&self.inner)
            .contexts
            .get(editor)
            .is_some_and(|ctx| matches!(ctx.origin, SelectionOrigin::System))
    }

    /// The current debounce delay.
    #[must_use]
    pub fn debounce_delay(&self) -> Duration {
        lock(&self.inner).debouncer.delay()
    }

    /// Updates the debounce delay. Negative delays are rejected with
    /// [`crate::Error::InvalidArgument`].
    pub fn set_debounce_delay(&self, delay_ms: i64) -> Result<()> {
        lock(&self.inner).debouncer.set_delay_ms(delay_ms)?;
        debug!("Selection debounce delay updated to {delay_ms}ms");
        Ok(())
    }

    /// Cancels pending delivery and clears callbacks and contexts.
    pub fn dispose(&self) {
        let mut inner = lock(&self.inner);
        inner.debouncer.cancel();
        inner.pending = None;
        inner.callbacks.clear();
        inner.contexts.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::host::DocumentSnapshot;

    struct MockEditor {
        id: EditorId,
        selections: Mutex<Vec<CellRange>>,
    }

    impl MockEditor {
        fn new(id: &str) -> Self {
            Self {
                id: EditorId::new(id),
                selections: Mutex::new(Vec::new()),
            }
        }
    }

    impl NotebookEditor for MockEditor {
        fn id(&self) -> EditorId {
            self.id.clone()
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
            false
        }
    }

    fn collected(
        detector: &SelectionChangeDetector,
    ) -> (Arc<Mutex<Vec<SelectionChangeEvent>>>, SelectionSubscription) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let subscription =
            detector.on_selection_change(move |event| sink.lock().unwrap().push(event.clone()));
        (events, subscription)
    }

    #[tokio::test(start_paused = true)]
    async fn test_native_changes_are_tagged_user() {
        let detector = SelectionChangeDetector::new(Duration::from_millis(50));
        let (events, _subscription) = collected(&detector);

        detector.handle_selection_change(EditorId::new("nb"), vec![CellRange::new(1, 2)]);
        tokio::time::sleep(Duration::from_millis(100)).await;

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].origin, SelectionOrigin::User);
        assert_eq!(events[0].selections, vec![CellRange::new(1, 2)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_triggered_change_is_tagged_system_then_flag_clears() {
        let detector = SelectionChangeDetector::new(Duration::from_millis(50));
        let (events, _subscription) = collected(&detector);
        let editor = MockEditor::new("nb");

        detector.trigger_selection_change(&editor, vec![CellRange::new(3, 4)]);
        assert_eq!(editor.selections(), vec![CellRange::new(3, 4)]);

        // The host delivers the native event back.
        detector.handle_selection_change(editor.id(), editor.selections());
        tokio::time::sleep(Duration::from_millis(100)).await;

        // A later, user-driven change must not inherit the flag.
        detector.handle_selection_change(editor.id(), vec![CellRange::new(0, 1)]);
        tokio::time::sleep(Duration::from_millis(100)).await;

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].origin, SelectionOrigin::System);
        assert_eq!(events[1].origin, SelectionOrigin::User);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_delivers_only_latest_selection() {
        let detector = SelectionChangeDetector::new(Duration::from_millis(100));
        let (events, _subscription) = collected(&detector);
        let editor = EditorId::new("nb");

        for i in 0..5 {
            detector.handle_selection_change(editor.clone(), vec![CellRange::new(i, i + 1)]);
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].selections, vec![CellRange::new(4, 5)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsubscribe_stops_delivery() {
        let detector = SelectionChangeDetector::new(Duration::from_millis(10));
        let (events, subscription) = collected(&detector);

        subscription.unsubscribe();
        detector.handle_selection_change(EditorId::new("nb"), vec![CellRange::new(0, 1)]);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(events.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_is_programmatic_change_tracks_per_editor_context() {
        let detector = SelectionChangeDetector::new(Duration::from_millis(10));
        let editor = MockEditor::new("nb");
        let other = EditorId::new("other");

        detector.trigger_selection_change(&editor, vec![CellRange::new(0, 1)]);
        detector.handle_selection_change(editor.id(), editor.selections());
        detector.handle_selection_change(other.clone(), vec![CellRange::new(2, 3)]);

        assert!(detector.is_programmatic_change(&editor.id()));
        assert!(!detector.is_programmatic_change(&other));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_cancels_pending_delivery() {
        let detector = SelectionChangeDetector::new(Duration::from_millis(50));
        let (events, _subscription) = collected(&detector);

        detector.handle_selection_change(EditorId::new("nb"), vec![CellRange::new(0, 1)]);
        detector.dispose();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_debounce_delay_validation() {
        let detector = SelectionChangeDetector::new(Duration::from_millis(300));

        let err = detector.set_debounce_delay(-1).unwrap_err();
        assert_eq!(err.category(), "invalid_argument");
        assert_eq!(detector.debounce_delay(), Duration::from_millis(300));

        detector.set_debounce_delay(25).unwrap();
        assert_eq!(detector.debounce_delay(), Duration::from_millis(25));
    }
}
