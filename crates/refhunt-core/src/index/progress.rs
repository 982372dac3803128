/// Progress reporting for long-running builds.
///
/// Progress is advisory: a sink may drop updates, and the builder never
/// waits on it. The channel-backed sink sends lightweight messages the
/// same way a frontend would drain them once per frame.
use crossbeam_channel::{Receiver, Sender};
use std::time::Duration;

/// Maximum number of progress messages that may queue up in the channel.
///
/// When the consumer falls behind, further updates are dropped instead of
/// blocking the build.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 4_096;

/// Receives `(label, fraction)` updates. `fraction` is in `[0, 1]`.
pub trait ProgressSink {
    fn report(&self, label: &str, fraction: f32);

    /// Called once when a labelled phase has finished.
    fn finish(&self, _label: &str, _duration: Duration) {}
}

/// Discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn report(&self, _label: &str, _fraction: f32) {}
}

impl<F> ProgressSink for F
where
    F: Fn(&str, f32),
{
    fn report(&self, label: &str, fraction: f32) {
        self(label, fraction)
    }
}

/// Progress messages sent over [`ChannelProgress`].
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisProgress {
    /// Periodic update.
    Update { label: String, fraction: f32 },
    /// A phase completed.
    Finished { label: String, duration: Duration },
}

/// Forwards progress into a bounded crossbeam channel.
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    tx: Sender<AnalysisProgress>,
}

impl ChannelProgress {
    /// Create a sink and the receiver a frontend drains.
    pub fn channel() -> (Self, Receiver<AnalysisProgress>) {
        let (tx, rx) = crossbeam_channel::bounded(PROGRESS_CHANNEL_CAPACITY);
        (Self { tx }, rx)
    }

    fn send(&self, msg: AnalysisProgress) {
        // Full or disconnected: the update is dropped.
        let _ = self.tx.try_send(msg);
    }
}

impl ProgressSink for ChannelProgress {
    fn report(&self, label: &str, fraction: f32) {
        self.send(AnalysisProgress::Update {
            label: label.to_string(),
            fraction: fraction.clamp(0.0, 1.0),
        });
    }

    fn finish(&self, label: &str, duration: Duration) {
        self.send(AnalysisProgress::Finished {
            label: label.to_string(),
            duration,
        });
    }
}

const _: () = assert!(
    PROGRESS_CHANNEL_CAPACITY > 0,
    "PROGRESS_CHANNEL_CAPACITY must be > 0"
);
