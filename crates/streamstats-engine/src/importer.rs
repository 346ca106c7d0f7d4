//! Multi-file import batches.
//!
//! Files enter a batch as `Pending` and move through `Processing` to a
//! terminal `Success` or `Error`. A run only touches files that are still
//! pending, applies status transitions in selection order, and reduces the
//! events of every successful file into one summary.

use crate::aggregator::Aggregator;
use crate::error::ImportError;
use crate::parser::parse_bytes;
use crate::source::{is_importable, FileSource};
use crate::summary::AggregatedSummary;
use futures::stream::{self, StreamExt};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use streamstats_common::PlayEvent;
use streamstats_config::ImportConfig;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// How a batch run reads files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    /// Files read and parsed concurrently; 1 is strictly sequential
    pub parallelism: usize,
    /// Upper bound on a single file read
    pub read_timeout: Duration,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            parallelism: 1,
            read_timeout: Duration::from_secs(30),
        }
    }
}

impl ImportOptions {
    /// Options from the `import` configuration section.
    pub const fn from_config(config: &ImportConfig) -> Self {
        Self {
            parallelism: config.parallelism,
            read_timeout: config.read_timeout(),
        }
    }

    /// Sets the number of concurrent reads; zero is treated as one.
    #[must_use]
    pub const fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Sets the per-file read timeout.
    #[must_use]
    pub const fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }
}

/// Where a file is in its import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    /// Waiting for a run
    Pending,
    /// Being read and parsed
    Processing,
    /// Parsed into `record_count` retained events
    Success {
        /// Retained events
        record_count: usize,
    },
    /// Failed; the rest of the batch is unaffected
    Error(ImportError),
}

impl FileStatus {
    /// Whether the status can no longer change.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Success { .. } | Self::Error(_))
    }

    /// Fluent message id of the status label.
    pub const fn message_id(&self) -> &'static str {
        match self {
            Self::Pending => "status-pending",
            Self::Processing => "status-processing",
            Self::Success { .. } => "status-success",
            Self::Error(_) => "status-error",
        }
    }
}

/// One file of a batch.
pub struct BatchEntry {
    id: Uuid,
    source: Arc<dyn FileSource>,
    status: FileStatus,
    events: Vec<PlayEvent>,
}

impl fmt::Debug for BatchEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchEntry")
            .field("id", &self.id)
            .field("name", &self.source.name())
            .field("status", &self.status)
            .field("events", &self.events.len())
            .finish()
    }
}

impl BatchEntry {
    /// Identifier assigned when the file was added.
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// File name.
    pub fn name(&self) -> &str {
        self.source.name()
    }

    /// File size, when the source knows it.
    pub fn size(&self) -> Option<u64> {
        self.source.size()
    }

    /// Current status.
    pub const fn status(&self) -> &FileStatus {
        &self.status
    }

    /// Retained events, empty unless the file succeeded.
    pub fn events(&self) -> &[PlayEvent] {
        &self.events
    }
}

/// A status transition published while a batch runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportProgress {
    /// Position of the file in the batch
    pub index: usize,
    /// Entry id
    pub id: Uuid,
    /// File name
    pub file_name: String,
    /// New status
    pub status: FileStatus,
}

/// Outcome of a batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    /// Events of the files that succeeded in this run, file order then
    /// in-file order
    pub events: Vec<PlayEvent>,
    /// Summary of `events`; `None` when there are no events
    pub summary: Option<AggregatedSummary>,
    /// Files of this run that ended in `Success`
    pub succeeded: usize,
    /// Files of this run that ended in `Error`
    pub failed: usize,
    /// Files of the batch still `Pending`, e.g. after cancellation
    pub pending: usize,
}

/// Result of reading and parsing one file; `None` when the run was
/// cancelled before the file started.
type FileOutcome = Option<Result<Vec<PlayEvent>, ImportError>>;

/// An ordered set of files imported together.
#[derive(Debug)]
pub struct ImportBatch {
    options: ImportOptions,
    aggregator: Aggregator,
    entries: Vec<BatchEntry>,
    progress_tx: Option<mpsc::UnboundedSender<ImportProgress>>,
}

impl ImportBatch {
    /// Creates an empty batch.
    pub const fn new(options: ImportOptions, aggregator: Aggregator) -> Self {
        Self {
            options,
            aggregator,
            entries: Vec::new(),
            progress_tx: None,
        }
    }

    /// Publishes every status transition on the returned channel.
    pub fn with_progress_reporting(mut self) -> (Self, mpsc::UnboundedReceiver<ImportProgress>) {
        let (tx, rx) = mpsc::unbounded_channel();
        self.progress_tx = Some(tx);
        (self, rx)
    }

    /// Adds a selection of files as `Pending`, returning the ids of the
    /// admitted ones.
    ///
    /// Files that are neither `.json` nor `.csv` (by name or declared MIME
    /// type) are dropped. If a non-empty selection contains no admissible file
    /// at all, nothing is added and [`ImportError::InvalidSelection`] is
    /// returned.
    pub fn add_files<I>(&mut self, files: I) -> Result<Vec<Uuid>, ImportError>
    where
        I: IntoIterator<Item = Arc<dyn FileSource>>,
    {
        let selection: Vec<Arc<dyn FileSource>> = files.into_iter().collect();
        let offered = selection.len();
        let admitted: Vec<Arc<dyn FileSource>> = selection
            .into_iter()
            .filter(|source| {
                let ok = is_importable(source.as_ref());
                if !ok {
                    debug!(file = source.name(), "Dropping file with unsupported type");
                }
                ok
            })
            .collect();

        if offered > 0 && admitted.is_empty() {
            warn!(count = offered, "Rejected selection without importable files");
            return Err(ImportError::InvalidSelection { count: offered });
        }

        let ids = admitted
            .into_iter()
            .map(|source| {
                let id = Uuid::new_v4();
                self.entries.push(BatchEntry {
                    id,
                    source,
                    status: FileStatus::Pending,
                    events: Vec::new(),
                });
                id
            })
            .collect::<Vec<_>>();

        debug!(offered, admitted = ids.len(), "Added files to batch");
        Ok(ids)
    }

    /// Removes a pending file.
    pub fn remove_file(&mut self, id: Uuid) -> Result<(), ImportError> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.id == id)
            .ok_or(ImportError::UnknownEntry(id))?;

        if self.entries[index].status != FileStatus::Pending {
            return Err(ImportError::NotPending {
                file: self.entries[index].name().to_string(),
            });
        }

        let removed = self.entries.remove(index);
        debug!(file = removed.name(), "Removed file from batch");
        Ok(())
    }

    /// Files in selection order.
    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    /// Number of files still pending.
    pub fn pending_count(&self) -> usize {
        self.count(|status| *status == FileStatus::Pending)
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the batch holds no file.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The aggregator runs are reduced with.
    pub const fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Imports every pending file and reduces the combined dataset.
    ///
    /// Per-file failures never stop the run. Cancelling `cancel` aborts the
    /// read in flight, which ends in `Error`; files that have not started stay
    /// `Pending` for a later run.
    #[instrument(skip(self, cancel), fields(files = self.entries.len(), parallelism = self.options.parallelism))]
    pub async fn run(&mut self, cancel: &CancellationToken) -> ImportReport {
        let pending: Vec<(usize, Arc<dyn FileSource>)> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.status == FileStatus::Pending)
            .map(|(index, entry)| (index, Arc::clone(&entry.source)))
            .collect();

        info!(pending = pending.len(), "Starting import run");

        let this_run: Vec<usize> = pending.iter().map(|(index, _)| *index).collect();
        if self.options.parallelism <= 1 {
            self.run_sequential(pending, cancel).await;
        } else {
            self.run_buffered(pending, cancel).await;
        }

        self.report(&this_run)
    }

    async fn run_sequential(
        &mut self,
        pending: Vec<(usize, Arc<dyn FileSource>)>,
        cancel: &CancellationToken,
    ) {
        let timeout = self.options.read_timeout;
        for (index, source) in pending {
            if cancel.is_cancelled() {
                break;
            }
            self.transition(index, FileStatus::Processing);
            if let Some(outcome) = load(source, timeout, cancel).await {
                self.complete(index, outcome);
            }
        }
    }

    /// Reads up to `parallelism` files at once. `buffered` yields outcomes in
    /// selection order, so transitions are replayed exactly as a sequential
    /// run would publish them.
    async fn run_buffered(
        &mut self,
        pending: Vec<(usize, Arc<dyn FileSource>)>,
        cancel: &CancellationToken,
    ) {
        let timeout = self.options.read_timeout;
        let mut outcomes = stream::iter(pending)
            .map(|(index, source)| async move { (index, load(source, timeout, cancel).await) })
            .buffered(self.options.parallelism);

        while let Some((index, outcome)) = outcomes.next().await {
            let Some(outcome) = outcome else { continue };
            self.transition(index, FileStatus::Processing);
            self.complete(index, outcome);
        }
    }

    fn complete(&mut self, index: usize, outcome: Result<Vec<PlayEvent>, ImportError>) {
        match outcome {
            Ok(events) => {
                let record_count = events.len();
                self.entries[index].events = events;
                info!(file = self.entries[index].name(), record_count, "Imported file");
                self.transition(index, FileStatus::Success { record_count });
            }
            Err(err) => {
                warn!(file = self.entries[index].name(), error = %err, "File import failed");
                self.transition(index, FileStatus::Error(err));
            }
        }
    }

    fn transition(&mut self, index: usize, status: FileStatus) {
        let entry = &mut self.entries[index];
        entry.status = status;
        if let Some(tx) = &self.progress_tx {
            let _ = tx.send(ImportProgress {
                index,
                id: entry.id,
                file_name: entry.name().to_string(),
                status: entry.status.clone(),
            });
        }
    }

    fn count(&self, predicate: impl Fn(&FileStatus) -> bool) -> usize {
        self.entries
            .iter()
            .filter(|entry| predicate(&entry.status))
            .count()
    }

    fn report(&self, this_run: &[usize]) -> ImportReport {
        let ran = || this_run.iter().map(|&index| &self.entries[index]);

        let events: Vec<PlayEvent> = ran()
            .filter(|entry| matches!(entry.status, FileStatus::Success { .. }))
            .flat_map(|entry| entry.events.iter().cloned())
            .collect();

        let summary = if events.is_empty() {
            info!("Import produced no events; skipping aggregation");
            None
        } else {
            Some(self.aggregator.aggregate(&events))
        };

        ImportReport {
            events,
            summary,
            succeeded: ran()
                .filter(|entry| matches!(entry.status, FileStatus::Success { .. }))
                .count(),
            failed: ran()
                .filter(|entry| matches!(entry.status, FileStatus::Error(_)))
                .count(),
            pending: self.pending_count(),
        }
    }
}

/// Reads and parses one file, bounded by `timeout` and `cancel`.
async fn load(
    source: Arc<dyn FileSource>,
    timeout: Duration,
    cancel: &CancellationToken,
) -> FileOutcome {
    if cancel.is_cancelled() {
        return None;
    }
    let file = source.name().to_string();

    let bytes = tokio::select! {
        () = cancel.cancelled() => Err(ImportError::Cancelled { file: file.clone() }),
        read = tokio::time::timeout(timeout, source.read()) => match read {
            Err(_) => Err(ImportError::Timeout { file: file.clone(), after: timeout }),
            Ok(Err(err)) => Err(ImportError::Unreadable { file: file.clone(), reason: err.to_string() }),
            Ok(Ok(bytes)) => Ok(bytes),
        },
    };

    Some(bytes.and_then(|bytes| parse_bytes(&file, &bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryFile;
    use async_trait::async_trait;
    use std::io;
    use streamstats_common::test_utils::history_fixtures;

    struct BrokenFile;

    #[async_trait]
    impl FileSource for BrokenFile {
        fn name(&self) -> &str {
            "locked.json"
        }

        fn mime_type(&self) -> Option<&str> {
            None
        }

        fn size(&self) -> Option<u64> {
            None
        }

        async fn read(&self) -> io::Result<Vec<u8>> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "locked"))
        }
    }

    struct SlowFile(Duration);

    #[async_trait]
    impl FileSource for SlowFile {
        fn name(&self) -> &str {
            "slow.csv"
        }

        fn mime_type(&self) -> Option<&str> {
            None
        }

        fn size(&self) -> Option<u64> {
            None
        }

        async fn read(&self) -> io::Result<Vec<u8>> {
            tokio::time::sleep(self.0).await;
            Ok(history_fixtures::two_play_csv().into_bytes())
        }
    }

    fn memory(name: &str, contents: String) -> Arc<dyn FileSource> {
        Arc::new(MemoryFile::new(name, contents))
    }

    fn batch() -> ImportBatch {
        ImportBatch::new(ImportOptions::default(), Aggregator::new())
    }

    #[test]
    fn test_add_files_drops_invalid_types() {
        let mut batch = batch();
        let ids = batch
            .add_files(vec![
                memory("a.csv", history_fixtures::two_play_csv()),
                memory("cover.png", String::new()),
            ])
            .unwrap();

        assert_eq!(ids.len(), 1);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.entries()[0].name(), "a.csv");
        assert_eq!(batch.entries()[0].status(), &FileStatus::Pending);
    }

    #[test]
    fn test_wholly_invalid_selection_is_rejected() {
        let mut batch = batch();
        let err = batch
            .add_files(vec![memory("a.txt", String::new()), memory("b.png", String::new())])
            .unwrap_err();

        assert_eq!(err, ImportError::InvalidSelection { count: 2 });
        assert!(batch.is_empty());
        assert!(batch.add_files(Vec::<Arc<dyn FileSource>>::new()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mixed_batch_keeps_valid_file() {
        let mut batch = batch();
        batch
            .add_files(vec![
                memory("empty.json", history_fixtures::empty_history_json()),
                memory("plays.csv", history_fixtures::two_play_csv()),
            ])
            .unwrap();

        let report = batch.run(&CancellationToken::new()).await;

        assert_eq!(report.events.len(), 2);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(
            batch.entries()[0].status(),
            &FileStatus::Error(ImportError::NoValidRecords {
                file: "empty.json".to_string()
            })
        );
        assert_eq!(
            batch.entries()[1].status(),
            &FileStatus::Success { record_count: 2 }
        );
        assert_eq!(report.summary.unwrap().total_streams, 2);
    }

    #[tokio::test]
    async fn test_all_failed_skips_aggregation() {
        let mut batch = batch();
        batch
            .add_files(vec![
                Arc::new(BrokenFile) as Arc<dyn FileSource>,
                memory("empty.json", history_fixtures::empty_history_json()),
            ])
            .unwrap();

        let report = batch.run(&CancellationToken::new()).await;

        assert!(report.events.is_empty());
        assert!(report.summary.is_none());
        assert_eq!(report.failed, 2);
        assert!(matches!(
            batch.entries()[0].status(),
            FileStatus::Error(ImportError::Unreadable { .. })
        ));
    }

    #[tokio::test]
    async fn test_progress_is_published_in_selection_order() {
        let (mut batch, mut rx) = batch().with_progress_reporting();
        batch
            .add_files(vec![
                memory("one.csv", history_fixtures::two_play_csv()),
                Arc::new(BrokenFile) as Arc<dyn FileSource>,
            ])
            .unwrap();

        batch.run(&CancellationToken::new()).await;
        drop(batch);

        let mut seen = Vec::new();
        while let Some(progress) = rx.recv().await {
            seen.push((progress.index, progress.status.message_id()));
        }
        assert_eq!(
            seen,
            vec![
                (0, "status-processing"),
                (0, "status-success"),
                (1, "status-processing"),
                (1, "status-error"),
            ]
        );
    }

    #[tokio::test]
    async fn test_buffered_run_matches_sequential_order() {
        let files = || {
            vec![
                Arc::new(SlowFile(Duration::from_millis(40))) as Arc<dyn FileSource>,
                memory("b.json", history_fixtures::two_play_extended_json()),
                memory("c.json", history_fixtures::empty_history_json()),
            ]
        };

        let (mut sequential, mut seq_rx) = batch().with_progress_reporting();
        sequential.add_files(files()).unwrap();
        let seq_report = sequential.run(&CancellationToken::new()).await;

        let (mut parallel, mut par_rx) =
            ImportBatch::new(ImportOptions::default().with_parallelism(3), Aggregator::new())
                .with_progress_reporting();
        parallel.add_files(files()).unwrap();
        let par_report = parallel.run(&CancellationToken::new()).await;

        drop(sequential);
        drop(parallel);
        let mut seq_order = Vec::new();
        while let Some(p) = seq_rx.recv().await {
            seq_order.push((p.index, p.status.message_id()));
        }
        let mut par_order = Vec::new();
        while let Some(p) = par_rx.recv().await {
            par_order.push((p.index, p.status.message_id()));
        }

        assert_eq!(seq_order, par_order);
        assert_eq!(seq_report.events, par_report.events);
        assert_eq!(seq_report.summary, par_report.summary);
    }

    #[tokio::test]
    async fn test_read_timeout_fails_only_that_file() {
        let mut batch = ImportBatch::new(
            ImportOptions::default().with_read_timeout(Duration::from_millis(20)),
            Aggregator::new(),
        );
        batch
            .add_files(vec![
                Arc::new(SlowFile(Duration::from_secs(5))) as Arc<dyn FileSource>,
                memory("ok.csv", history_fixtures::two_play_csv()),
            ])
            .unwrap();

        let report = batch.run(&CancellationToken::new()).await;

        assert!(matches!(
            batch.entries()[0].status(),
            FileStatus::Error(ImportError::Timeout { .. })
        ));
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.events.len(), 2);
    }

    #[tokio::test]
    async fn test_cancellation_leaves_unstarted_files_pending() {
        let mut batch = batch();
        batch
            .add_files(vec![
                Arc::new(SlowFile(Duration::from_secs(5))) as Arc<dyn FileSource>,
                memory("later.csv", history_fixtures::two_play_csv()),
            ])
            .unwrap();

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let report = batch.run(&cancel).await;

        assert!(matches!(
            batch.entries()[0].status(),
            FileStatus::Error(ImportError::Cancelled { .. })
        ));
        assert_eq!(batch.entries()[1].status(), &FileStatus::Pending);
        assert_eq!(report.pending, 1);
        assert!(report.summary.is_none());

        // A later run picks up what was left.
        let report = batch.run(&CancellationToken::new()).await;
        assert_eq!(report.pending, 0);
        assert_eq!(report.events.len(), 2);
    }

    #[tokio::test]
    async fn test_only_pending_files_can_be_removed() {
        let mut batch = batch();
        let ids = batch
            .add_files(vec![memory("a.csv", history_fixtures::two_play_csv())])
            .unwrap();
        batch.run(&CancellationToken::new()).await;

        assert_eq!(
            batch.remove_file(ids[0]),
            Err(ImportError::NotPending {
                file: "a.csv".to_string()
            })
        );

        let later = batch
            .add_files(vec![memory("b.csv", history_fixtures::two_play_csv())])
            .unwrap();
        assert_eq!(batch.pending_count(), 1);
        batch.remove_file(later[0]).unwrap();
        assert_eq!(batch.pending_count(), 0);

        let unknown = Uuid::new_v4();
        assert_eq!(batch.remove_file(unknown), Err(ImportError::UnknownEntry(unknown)));
    }

    #[tokio::test]
    async fn test_second_run_does_not_reprocess_finished_files() {
        let (mut batch, mut rx) = batch().with_progress_reporting();
        batch
            .add_files(vec![memory("a.csv", history_fixtures::two_play_csv())])
            .unwrap();
        batch.run(&CancellationToken::new()).await;
        batch
            .add_files(vec![memory("b.json", history_fixtures::two_play_extended_json())])
            .unwrap();
        let report = batch.run(&CancellationToken::new()).await;
        drop(batch);

        let mut indices = Vec::new();
        while let Some(p) = rx.recv().await {
            indices.push(p.index);
        }
        assert_eq!(indices, vec![0, 0, 1, 1]);
        assert_eq!(report.events.len(), 2);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.summary.unwrap().unique_tracks, 2);
    }

    #[tokio::test]
    async fn test_failed_second_run_has_no_summary() {
        let mut batch = batch();
        batch
            .add_files(vec![memory("a.csv", history_fixtures::two_play_csv())])
            .unwrap();
        let first = batch.run(&CancellationToken::new()).await;
        assert_eq!(first.events.len(), 2);

        batch
            .add_files(vec![memory("empty.json", history_fixtures::empty_history_json())])
            .unwrap();
        let second = batch.run(&CancellationToken::new()).await;

        assert!(second.events.is_empty());
        assert!(second.summary.is_none());
        assert_eq!((second.succeeded, second.failed), (0, 1));
        assert!(matches!(batch.entries()[0].status(), FileStatus::Success { record_count: 2 }));
    }
}
