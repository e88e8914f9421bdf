//! Progress observers for the display layer

use scan_proto::ProgressEvent;
use tokio::sync::mpsc;

/// Receives advisory progress events; never affects the scan result
pub trait ScanObserver: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

impl<F> ScanObserver for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn on_progress(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// Observer that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ScanObserver for NoopObserver {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

/// Observer that forwards events into a channel, for consumers that
/// prefer an async receive loop over callbacks
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelObserver {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ScanObserver for ChannelObserver {
    fn on_progress(&self, event: &ProgressEvent) {
        // A closed receiver only means nobody is displaying progress
        let _ = self.tx.send(event.clone());
    }
}
