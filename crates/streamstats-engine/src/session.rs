//! In-memory holder of the working dataset and its summary.

use crate::summary::AggregatedSummary;
use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use streamstats_common::PlayEvent;
use tokio::sync::watch;
use tracing::info;

/// The dataset and the summary computed from it, replaced together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Working dataset
    pub events: Vec<PlayEvent>,
    /// Summary of `events`
    pub summary: AggregatedSummary,
    /// Incremented by every commit, starting at 1
    pub revision: u64,
    /// When the data was committed
    pub imported_at: DateTime<Utc>,
}

/// Process-wide session state, shared by `Arc`.
///
/// [`SessionStore::set_imported_data`] is the only mutation. Readers always
/// see an events/summary pair from the same commit; subscribers are told the
/// new revision after each commit.
#[derive(Debug)]
pub struct SessionStore {
    current: ArcSwapOption<SessionSnapshot>,
    revision: watch::Sender<u64>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// An empty store at revision 0.
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            current: ArcSwapOption::empty(),
            revision,
        }
    }

    /// Atomically replaces the dataset and its summary, returning the new
    /// revision.
    pub fn set_imported_data(&self, summary: AggregatedSummary, events: Vec<PlayEvent>) -> u64 {
        let (event_count, streams) = (events.len(), summary.total_streams);
        let mut committed = 0;
        // The watch lock serializes commits; receivers wake after the swap.
        self.revision.send_modify(|revision| {
            *revision += 1;
            committed = *revision;
            self.current.store(Some(Arc::new(SessionSnapshot {
                events,
                summary,
                revision: committed,
                imported_at: Utc::now(),
            })));
        });
        info!(revision = committed, events = event_count, streams, "Committed imported data");
        committed
    }

    /// The latest commit, if any.
    pub fn snapshot(&self) -> Option<Arc<SessionSnapshot>> {
        self.current.load_full()
    }

    /// Events of the latest commit; empty before the first one.
    pub fn working_dataset(&self) -> Vec<PlayEvent> {
        self.current
            .load()
            .as_ref()
            .map(|snapshot| snapshot.events.clone())
            .unwrap_or_default()
    }

    /// Summary of the latest commit.
    pub fn summary(&self) -> Option<AggregatedSummary> {
        self.current
            .load()
            .as_ref()
            .map(|snapshot| snapshot.summary.clone())
    }

    /// Current revision; 0 before the first commit.
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Receiver notified with the revision of every commit.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::Aggregator;
    use streamstats_common::test_utils::history_fixtures;

    #[test]
    fn test_empty_store() {
        let store = SessionStore::new();
        assert!(store.snapshot().is_none());
        assert!(store.working_dataset().is_empty());
        assert!(store.summary().is_none());
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn test_commit_replaces_pair() {
        let store = SessionStore::new();
        let aggregator = Aggregator::new();
        let events = history_fixtures::sample_events();

        let first = store.set_imported_data(aggregator.aggregate(&events), events.clone());
        assert_eq!(first, 1);
        assert_eq!(store.working_dataset(), events);

        let fewer = events[..2].to_vec();
        let second = store.set_imported_data(aggregator.aggregate(&fewer), fewer.clone());
        assert_eq!(second, 2);

        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.events, fewer);
        assert_eq!(snapshot.summary.total_streams, 2);
        assert_eq!(snapshot.revision, 2);
    }

    #[test]
    fn test_old_snapshot_survives_commit() {
        let store = SessionStore::new();
        let events = history_fixtures::sample_events();
        store.set_imported_data(Aggregator::new().aggregate(&events), events);
        let held = store.snapshot().unwrap();

        store.set_imported_data(Aggregator::new().aggregate(&[]), Vec::new());

        assert_eq!(held.events.len(), 8);
        assert_eq!(held.summary.total_streams, 8);
        assert!(store.working_dataset().is_empty());
    }

    #[tokio::test]
    async fn test_subscribers_are_notified() {
        let store = Arc::new(SessionStore::new());
        let mut rx = store.subscribe();

        let writer = Arc::clone(&store);
        tokio::spawn(async move {
            let events = history_fixtures::sample_events();
            writer.set_imported_data(Aggregator::new().aggregate(&events), events);
        });

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), 1);
        assert_eq!(store.snapshot().unwrap().revision, 1);
    }
}
