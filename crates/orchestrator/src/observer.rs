//! Progress observers
//!
//! An observer receives every field the moment it lands in the aggregate.
//! Observers are infallible: a closed channel is logged and the run keeps going.

use contracts::ProgressUpdate;
use tokio::sync::mpsc;
use tracing::debug;

/// Receives partial results, in step order, from the orchestrator's task
pub trait ProgressObserver: Send {
    fn on_progress(&mut self, update: ProgressUpdate);
}

impl<F> ProgressObserver for F
where
    F: FnMut(ProgressUpdate) + Send,
{
    fn on_progress(&mut self, update: ProgressUpdate) {
        self(update)
    }
}

/// Observer that forwards updates into an unbounded channel
#[derive(Debug)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<ProgressUpdate>,
    closed: bool,
}

impl ChannelObserver {
    pub fn new(tx: mpsc::UnboundedSender<ProgressUpdate>) -> Self {
        Self { tx, closed: false }
    }
}

impl ProgressObserver for ChannelObserver {
    fn on_progress(&mut self, update: ProgressUpdate) {
        let field = update.field_name();
        if self.tx.send(update).is_err() && !self.closed {
            self.closed = true;
            debug!(field, "Progress receiver dropped, further updates discarded");
        }
    }
}

/// Create a channel observer and its receiving end
pub fn progress_channel() -> (ChannelObserver, mpsc::UnboundedReceiver<ProgressUpdate>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelObserver::new(tx), rx)
}
