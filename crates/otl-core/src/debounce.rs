//! Reusable trailing-edge debounce primitive.
//!
//! Every debounced call site in the engine (outline refreshes, selection
//! notifications) instantiates one of these instead of keeping its own
//! timer bookkeeping. Re-arming cancels the pending task before it runs,
//! so a cancelled action has no partial side effects.

use std::time::Duration;

use tokio::task::JoinHandle;

use crate::{Error, Result};

/// A single trailing-edge debounce timer.
///
/// `schedule` (re)arms the timer; the most recent action wins. Requires a
/// Tokio runtime.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    handle: Option<JoinHandle<()>>,
}

impl Debouncer {
    /// Creates a debouncer with the given quiet period.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            handle: None,
        }
    }

    /// Creates a debouncer from a delay in milliseconds.
    #[must_use]
    pub const fn from_millis(delay_ms: u64) -> Self {
        Self::new(Duration::from_millis(delay_ms))
    }

    /// The current quiet period.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Updates the quiet period for future scheduling.
    ///
    /// Rejects negative delays with [`Error::InvalidArgument`] and leaves
    /// the current delay untouched. A zero delay fires on the next tick.
    pub fn set_delay_ms(&mut self, delay_ms: i64) -> Result<()> {
        let delay_ms = u64::try_from(delay_ms).map_err(|_| {
            Error::InvalidArgument("Debounce delay must be non-negative".to_string())
        })?;
        self.delay = Duration::from_millis(delay_ms);
        Ok(())
    }

    /// Arms (or re-arms) the timer to run `action` after the quiet period.
    ///
    /// A pending action from an earlier call is cancelled; bursts of calls
    /// within the window collapse into one firing with the latest action,
    /// and the latest call's time sets the new deadline.
    pub fn schedule<F>(&mut self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action();
        }));
    }

    /// Cancels any pending action.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Whether an action is currently pending.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
