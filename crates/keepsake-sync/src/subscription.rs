//! Cancellable realtime feed of full-collection snapshots.
//!
//! A [`Subscription`] wraps a channel fed by a background task (or
//! preloaded for one-shot feeds). Every item is the complete entry list —
//! never a delta — so consumers apply it through the same replace-collection
//! entry point as a normal load. Cancellation is idempotent, safe before
//! any snapshot was received, and leak-free: dropping the subscription
//! aborts the feeding task.

use keepsake_core::entry::Entry;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Capacity is small on purpose: only the latest snapshot matters, and a
/// slow consumer should exert backpressure on the feed task rather than
/// queue stale state.
pub(crate) const FEED_CAPACITY: usize = 8;

pub struct Subscription {
    rx: mpsc::Receiver<Vec<Entry>>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(rx: mpsc::Receiver<Vec<Entry>>, task: JoinHandle<()>) -> Self {
        Self {
            rx,
            task: Some(task),
        }
    }

    /// A feed that emits the given snapshot once and then ends. Used by the
    /// local-only store, which has no remote change source.
    pub fn immediate(snapshot: Vec<Entry>) -> Self {
        let (tx, rx) = mpsc::channel(FEED_CAPACITY);
        // The channel holds the only snapshot; no task to keep alive.
        let _ = tx.try_send(snapshot);
        Self { rx, task: None }
    }

    /// Wait for the next full-collection snapshot. `None` once the feed has
    /// ended or was cancelled.
    pub async fn next_snapshot(&mut self) -> Option<Vec<Entry>> {
        self.rx.recv().await
    }

    /// Stop the feed. Idempotent; calling it on an already-cancelled or
    /// never-started feed does nothing.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.rx.close();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keepsake_core::entry::{EntryDraft, Mood};
    use keepsake_core::journal::Journal;

    fn snapshot() -> Vec<Entry> {
        let mut journal = Journal::new();
        journal
            .create(EntryDraft::text("hi").with_mood(Mood::Happy), None)
            .unwrap();
        journal.entries().to_vec()
    }

    #[tokio::test]
    async fn immediate_feed_emits_once_then_ends() {
        let entries = snapshot();
        let mut sub = Subscription::immediate(entries.clone());
        assert_eq!(sub.next_snapshot().await, Some(entries));
        assert_eq!(sub.next_snapshot().await, None);
    }

    #[tokio::test]
    async fn cancel_is_idempotent_even_without_a_task() {
        let mut sub = Subscription::immediate(Vec::new());
        sub.cancel();
        sub.cancel();
        assert_eq!(sub.next_snapshot().await, None);
    }

    #[tokio::test]
    async fn cancel_stops_a_live_feed() {
        let (tx, rx) = mpsc::channel(FEED_CAPACITY);
        let task = tokio::spawn(async move {
            loop {
                if tx.send(Vec::new()).await.is_err() {
                    break;
                }
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        });
        let mut sub = Subscription::new(rx, task);
        assert!(sub.next_snapshot().await.is_some());

        sub.cancel();
        // Drain whatever was already buffered; the feed must then end
        // rather than emit forever.
        while sub.next_snapshot().await.is_some() {}
    }
}
