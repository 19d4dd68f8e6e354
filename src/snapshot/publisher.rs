use std::sync::Arc;

use tokio::sync::watch;

use super::Snapshot;

/// Single-slot holder for the current snapshot.
///
/// Publishing replaces the shared `Arc` in one step, so readers either see the
/// previous bundle or the new one, never a mix.
pub struct SnapshotPublisher {
    tx: watch::Sender<Arc<Snapshot>>,
}

impl SnapshotPublisher {
    pub fn new(initial: Snapshot) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(initial));
        Self { tx }
    }

    pub fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&self.tx.borrow())
    }

    pub fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        self.tx.send_replace(Arc::clone(&snapshot));
        snapshot
    }

    /// Receiver notified on every publish.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStatus;

    #[test]
    fn readers_keep_the_snapshot_they_took() {
        let publisher = SnapshotPublisher::new(Snapshot::seed(78, 42));
        let before = publisher.current();

        publisher.publish(before.with_lifecycle(SessionStatus::Live, 3));

        assert_eq!(before.state, SessionStatus::Idle);
        assert_eq!(publisher.current().state, SessionStatus::Live);
        assert_eq!(publisher.current().elapsed_secs, 3);
    }

    #[tokio::test]
    async fn subscribers_see_new_snapshots() {
        let publisher = SnapshotPublisher::new(Snapshot::seed(78, 42));
        let mut rx = publisher.subscribe();

        publisher.publish(Snapshot::seed(10, 1));

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().engagement.current, 10);
    }
}
