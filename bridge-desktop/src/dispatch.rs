//! Channel-backed UI Dispatcher
//!
//! Desktop UI toolkits own a single event-loop thread. The dispatcher side is
//! handed to the core; the [`UiTaskQueue`] side is drained by that loop.

use bridge_traits::{
    dispatch::{UiDispatcher, UiTask},
    error::{BridgeError, Result},
};
use tokio::sync::mpsc;
use tracing::trace;

/// Sends tasks to the UI event loop over an unbounded channel.
#[derive(Clone)]
pub struct ChannelUiDispatcher {
    sender: mpsc::UnboundedSender<UiTask>,
}

impl ChannelUiDispatcher {
    pub fn new() -> (Self, UiTaskQueue) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, UiTaskQueue { receiver })
    }
}

impl UiDispatcher for ChannelUiDispatcher {
    fn dispatch(&self, task: UiTask) -> Result<()> {
        self.sender
            .send(task)
            .map_err(|_| BridgeError::NotAvailable("UI task queue has shut down".to_string()))
    }
}

/// Receiving end owned by the UI thread.
pub struct UiTaskQueue {
    receiver: mpsc::UnboundedReceiver<UiTask>,
}

impl UiTaskQueue {
    /// Run every task queued so far without waiting. Returns how many ran.
    ///
    /// Meant to be called once per frame/tick of a host event loop.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.receiver.try_recv() {
            task();
            ran += 1;
        }
        if ran > 0 {
            trace!(ran, "Drained UI tasks");
        }
        ran
    }

    /// Wait for and run the next task. Returns `false` once every dispatcher
    /// has been dropped.
    pub async fn run_next(&mut self) -> bool {
        match self.receiver.recv().await {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Run tasks until every dispatcher has been dropped.
    pub async fn run(mut self) {
        while self.run_next().await {}
    }
}
