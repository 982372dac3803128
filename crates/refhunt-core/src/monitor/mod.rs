/// Repository change feed.
///
/// Whatever watches the repository (an editor hook, a file watcher, a test)
/// holds a [`ChangeNotifier`] and reports changes as they happen. The engine
/// holds the matching [`ChangeFeed`] and drains it between operations; any
/// change at all invalidates the cached index and result.
///
/// # Usage
///
/// ```ignore
/// let (notifier, feed) = change_feed();
/// engine.attach_changes(feed);
/// notifier.notify(RepositoryChange::Removed("Assets/a.png".into()));
/// assert!(engine.poll_changes() > 0);
/// ```
///
/// # Overflow
///
/// The channel is bounded. A change that does not fit is dropped, but the
/// feed remembers that something was lost so the next poll still
/// invalidates.
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Capacity of the change channel.
pub const CHANGE_CHANNEL_CAPACITY: usize = 2_048;

/// Maximum number of changes drained by one poll.
pub const MAX_CHANGES_PER_POLL: usize = 256;

/// Something in the repository changed outside the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryChange {
    Added(String),
    Removed(String),
    Modified(String),
    /// The whole repository was reloaded.
    Refreshed,
}

impl RepositoryChange {
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Added(p) | Self::Removed(p) | Self::Modified(p) => Some(p),
            Self::Refreshed => None,
        }
    }
}

/// Sending half. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    tx: Sender<RepositoryChange>,
    overflowed: Arc<AtomicBool>,
}

impl ChangeNotifier {
    /// Report a change. Returns `false` if the feed is gone.
    pub fn notify(&self, change: RepositoryChange) -> bool {
        match self.tx.try_send(change) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.overflowed.store(true, Ordering::Relaxed);
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Changes drained by one [`ChangeFeed::drain`] call.
#[derive(Debug, Default)]
pub struct ChangeBatch {
    pub changes: Vec<RepositoryChange>,
    /// At least one change was dropped because the channel was full.
    pub overflowed: bool,
}

impl ChangeBatch {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && !self.overflowed
    }
}

/// Receiving half, owned by the engine.
#[derive(Debug)]
pub struct ChangeFeed {
    rx: Receiver<RepositoryChange>,
    overflowed: Arc<AtomicBool>,
}

impl ChangeFeed {
    /// Take up to [`MAX_CHANGES_PER_POLL`] pending changes without blocking.
    pub fn drain(&self) -> ChangeBatch {
        let changes: Vec<RepositoryChange> =
            self.rx.try_iter().take(MAX_CHANGES_PER_POLL).collect();
        let overflowed = self.overflowed.swap(false, Ordering::Relaxed);
        if overflowed {
            debug!("Change feed overflowed; some changes were dropped");
        }
        ChangeBatch {
            changes,
            overflowed,
        }
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Something was reported since the last drain, including a dropped
    /// change. Does not consume anything.
    pub fn is_dirty(&self) -> bool {
        !self.rx.is_empty() || self.overflowed.load(Ordering::Relaxed)
    }
}

/// Create a connected notifier/feed pair.
pub fn change_feed() -> (ChangeNotifier, ChangeFeed) {
    let (tx, rx) = bounded(CHANGE_CHANNEL_CAPACITY);
    let overflowed = Arc::new(AtomicBool::new(false));
    (
        ChangeNotifier {
            tx,
            overflowed: Arc::clone(&overflowed),
        },
        ChangeFeed { rx, overflowed },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_in_order() {
        let (notifier, feed) = change_feed();
        notifier.notify(RepositoryChange::Added("Assets/a.png".into()));
        notifier.notify(RepositoryChange::Refreshed);
        let batch = feed.drain();
        assert_eq!(
            batch.changes,
            vec![
                RepositoryChange::Added("Assets/a.png".into()),
                RepositoryChange::Refreshed
            ]
        );
        assert!(!batch.overflowed);
        assert!(feed.drain().is_empty());
    }

    #[test]
    fn poll_is_capped() {
        let (notifier, feed) = change_feed();
        for i in 0..MAX_CHANGES_PER_POLL + 10 {
            notifier.notify(RepositoryChange::Modified(format!("Assets/{i}")));
        }
        assert_eq!(feed.drain().changes.len(), MAX_CHANGES_PER_POLL);
        assert_eq!(feed.drain().changes.len(), 10);
    }

    #[test]
    fn overflow_is_remembered() {
        let (notifier, feed) = change_feed();
        for i in 0..CHANGE_CHANNEL_CAPACITY + 1 {
            assert!(notifier.notify(RepositoryChange::Modified(format!("Assets/{i}"))));
        }
        let batch = feed.drain();
        assert!(batch.overflowed);
        assert!(!batch.is_empty());
        assert!(!feed.drain().overflowed);
    }

    #[test]
    fn dirty_until_drained() {
        let (notifier, feed) = change_feed();
        assert!(!feed.is_dirty());
        notifier.notify(RepositoryChange::Removed("Assets/a.png".into()));
        assert!(feed.is_dirty());
        assert!(feed.is_dirty());
        feed.drain();
        assert!(!feed.is_dirty());

        for i in 0..CHANGE_CHANNEL_CAPACITY + 1 {
            notifier.notify(RepositoryChange::Modified(format!("Assets/{i}")));
        }
        while !feed.drain().changes.is_empty() {}
        assert!(!feed.is_dirty());
    }

    #[test]
    fn notify_after_feed_dropped_reports_false() {
        let (notifier, feed) = change_feed();
        drop(feed);
        assert!(!notifier.notify(RepositoryChange::Refreshed));
    }

    #[test]
    fn refreshed_has_no_path() {
        assert_eq!(RepositoryChange::Refreshed.path(), None);
        assert_eq!(
            RepositoryChange::Removed("Assets/x".into()).path(),
            Some("Assets/x")
        );
    }
}
