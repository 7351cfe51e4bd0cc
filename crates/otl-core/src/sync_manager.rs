//! Best-effort synchronization of the host-native outline pane.
//!
//! The host outline cannot be queried or mutated directly; the only lever
//! is an opaque refocus action. Attempts are retried with exponential
//! backoff, guarded against overlapping runs, and never fatal: after the
//! retry budget is exhausted the last error is logged and swallowed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::host::{HostOutline, NotebookEditor};
use crate::{Result, SyncConfig};

/// Triggers best-effort refreshes of the host's native outline pane.
pub struct OutlineSyncManager {
    config: Mutex<SyncConfig>,
    sync_in_progress: AtomicBool,
}

impl OutlineSyncManager {
    /// Creates a manager with the given configuration.
    #[must_use]
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config: Mutex::new(config),
            sync_in_progress: AtomicBool::new(false),
        }
    }

    /// Nudges the host outline for the given editor.
    ///
    /// No-op when sync is disabled, when a sync is already in flight,
    /// when the editor is closed, or when it is not the active editor.
    /// Runs up to `max_retries` attempts with `retry_delay_ms * 2^attempt`
    /// between them; exhaustion is logged, never propagated.
    pub async fn sync_outline(
        &self,
        editor: &dyn NotebookEditor,
        is_active: bool,
        host: &dyn HostOutline,
    ) {
        let config = self.config();

        if !config.enabled {
            debug!("Outline sync is disabled, skipping");
            return;
        }
        if editor.is_closed() {
            debug!("Editor is closed, skipping outline sync");
            return;
        }
        if !is_active {
            debug!("Editor is not active, skipping outline sync");
            return;
        }
        if self.sync_in_progress.swap(true, Ordering::SeqCst) {
            debug!("Outline sync already in progress, skipping");
            return;
        }

        self.sync_with_retry(&config, host).await;
        self.sync_in_progress.store(false, Ordering::SeqCst);
    }

    async fn sync_with_retry(&self, config: &SyncConfig, host: &dyn HostOutline) {
        let mut last_error = None;

        for attempt in 0..config.max_retries {
            match host.refresh_focus().await {
                Ok(()) => {
                    info!("Outline sync succeeded on attempt {}", attempt + 1);
                    return;
                },
                Err(err) => {
                    debug!("Outline sync attempt {} failed: {err}", attempt + 1);
                    last_error = Some(err);

                    if attempt + 1 < config.max_retries {
                        // Saturates for large attempt counts instead of
                        // overflowing the shift.
                        let backoff = 2u64.saturating_pow(attempt);
                        let delay = Duration::from_millis(
                            config.retry_delay_ms.saturating_mul(backoff),
                        );
                        debug!("Waiting {delay:?} before retry");
                        tokio::time::sleep(delay).await;
                    }
                },
            }
        }

        if let Some(err) = last_error {
            warn!(
                "Outline sync failed after {} attempts: {err}",
                config.max_retries
            );
        }
    }

    /// Enables or disables synchronization.
    pub fn set_enabled(&self, enabled: bool) {
        self.lock_config().enabled = enabled;
        info!("Outline sync {}", if enabled { "enabled" } else { "disabled" });
    }

    /// The current configuration.
    #[must_use]
    pub fn config(&self) -> SyncConfig {
        self.lock_config().clone()
    }

    /// Replaces the configuration after validating it.
    pub fn update_config(&self, config: SyncConfig) -> Result<()> {
        config.validate()?;
        *self.lock_config() = config;
        debug!("Outline sync config updated");
        Ok(())
    }

    fn lock_config(&self) -> std::sync::MutexGuard<'_, SyncConfig> {
        self.config.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
