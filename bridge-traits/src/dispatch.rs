//! UI-Affinity Dispatch
//!
//! Every state change the presentation layer observes is delivered through
//! this trait so that it runs on the host's UI thread (main queue, Looper,
//! event loop) regardless of which worker finished the I/O.

use crate::error::Result;

/// Unit of work scheduled on the UI context.
pub type UiTask = Box<dyn FnOnce() + Send + 'static>;

/// Schedules closures on the host's UI-affinity execution context.
///
/// Implementations must run each accepted task exactly once and preserve
/// submission order.
pub trait UiDispatcher: Send + Sync {
    /// Queue `task` for execution on the UI context.
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::NotAvailable` when the UI context has shut down.
    fn dispatch(&self, task: UiTask) -> Result<()>;
}

/// Dispatcher that runs tasks inline on the calling thread.
///
/// Suitable for headless hosts and tests that have no UI thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineDispatcher;

impl UiDispatcher for InlineDispatcher {
    fn dispatch(&self, task: UiTask) -> Result<()> {
        task();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_inline_dispatcher_runs_task_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();

        InlineDispatcher
            .dispatch(Box::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
