use crate::error::Result;
use crate::process::{Outcome, process_one};
use crate::{Context, SyncTarget};
use async_stream::stream;
use futures::stream::FuturesUnordered;
use futures::{Stream, StreamExt};
use spritesync_remote::FileEntry;
use std::collections::VecDeque;

/// Progress events emitted by [`run_batches`] for a single target.
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started): exactly once, with the number of files.
/// 2. For each batch: [`BatchStarted`](Self::BatchStarted), one
///    [`Processed`](Self::Processed) per file in completion order, then
///    [`BatchComplete`](Self::BatchComplete).
/// 3. [`Complete`](Self::Complete): exactly once, after the last batch.
///
/// A fatal error terminates the stream early, in which case
/// [`Complete`](Self::Complete) is never emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    Started { total: usize },
    /// `index` counts from 1.
    BatchStarted { index: usize, size: usize },
    Processed(Outcome),
    BatchComplete { completed: usize, total: usize },
    Complete,
}

/// Files still waiting for one target, and how far along it is.
#[derive(Debug)]
pub struct BatchState {
    queue: VecDeque<FileEntry>,
    completed: usize,
    total: usize,
    batches: usize,
}

impl BatchState {
    pub fn new(files: Vec<FileEntry>) -> Self {
        Self {
            total: files.len(),
            queue: files.into(),
            completed: 0,
            batches: 0,
        }
    }

    /// Take up to `size` files off the front of the queue, or `None` once it
    /// is empty.
    pub fn next_batch(&mut self, size: usize) -> Option<Vec<FileEntry>> {
        if self.queue.is_empty() {
            return None;
        }
        let take = size.max(1).min(self.queue.len());
        self.batches += 1;
        Some(self.queue.drain(..take).collect())
    }

    pub fn mark_completed(&mut self) {
        self.completed += 1;
    }

    pub fn is_done(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Batches taken so far.
    pub fn batches(&self) -> usize {
        self.batches
    }
}

/// Streams [`SyncEvent`]s while every file in `files` is processed into
/// `target`, in order, `ctx.batch_size` at a time.
///
/// All files of a batch run concurrently, and the whole batch must finish
/// before the next one starts. Between batches (never after the last one) the
/// stream pauses for the configured batch delay.
pub fn run_batches<'a>(
    ctx: &'a Context,
    target: &'a SyncTarget,
    files: Vec<FileEntry>,
) -> impl Stream<Item = Result<SyncEvent>> + 'a {
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        let mut state = BatchState::new(files);
        yield Ok(SyncEvent::Started { total: state.total() });

        while let Some(batch) = state.next_batch(ctx.batch_size) {
            tracing::debug!(local = %target, batch = state.batches(), size = batch.len(), "Starting batch");
            yield Ok(SyncEvent::BatchStarted { index: state.batches(), size: batch.len() });

            let mut processing: FuturesUnordered<_> =
                batch.into_iter().map(|entry| process_one(ctx, target, entry)).collect();
            while let Some(result) = processing.next().await {
                match result {
                    Ok(outcome) => {
                        state.mark_completed();
                        yield Ok(SyncEvent::Processed(outcome));
                    },
                    Err(e) => {
                        yield Err(e);
                        return;
                    },
                }
            }
            yield Ok(SyncEvent::BatchComplete { completed: state.completed(), total: state.total() });

            if !state.is_done() && !ctx.batch_delay.is_zero() {
                tokio::time::sleep(ctx.batch_delay).await;
            }
        }

        yield Ok(SyncEvent::Complete);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::report::{FailedAsset, Failure};
    use crate::test_support::{Fixture, entry};
    use futures::TryStreamExt;
    use spritesync_remote::backend::MockEvent;
    use spritesync_storage::backend::LocalBackend;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    fn target() -> SyncTarget {
        SyncTarget {
            remote: "normal".to_string(),
            local: PathBuf::from("normal"),
        }
    }

    fn numbered(count: usize) -> (Vec<String>, Vec<(String, String)>) {
        let files = (1..=count).map(|n| format!("{n}.png")).collect();
        let names = (1..=count).map(|n| (n.to_string(), format!("mon{n}"))).collect();
        (files, names)
    }

    fn fixture(count: usize) -> Fixture {
        let (files, names) = numbered(count);
        let files: Vec<&str> = files.iter().map(String::as_str).collect();
        let names: Vec<(&str, &str)> = names.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        Fixture::builder(&[("normal", files.as_slice())], &names)
            .remote(|remote| remote.with_latency(Duration::from_millis(1)))
            .build()
    }

    fn entries(fixture: &Fixture, count: usize) -> Vec<FileEntry> {
        (1..=count).map(|n| fixture.entry(&format!("normal/{n}.png"))).collect()
    }

    #[test]
    fn test_batch_state_splits_fifo() {
        let fixture = fixture(0);
        let mut state = BatchState::new(entries(&fixture, 207));
        let mut sizes = Vec::new();
        let mut first = Vec::new();
        while let Some(batch) = state.next_batch(50) {
            sizes.push(batch.len());
            first.push(batch[0].path.clone());
        }
        assert_eq!(sizes, vec![50, 50, 50, 50, 7]);
        assert_eq!(first, vec!["normal/1.png", "normal/51.png", "normal/101.png", "normal/151.png", "normal/201.png"]);
        assert_eq!(state.batches(), 5);
        assert!(state.is_done());
    }

    #[tokio::test]
    async fn test_batches_are_sequential() {
        let fixture = fixture(207);
        let target = target();
        let events: Vec<SyncEvent> = run_batches(&fixture.ctx, &target, entries(&fixture, 207)).try_collect().await.unwrap();

        let batch_sizes: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                SyncEvent::BatchStarted { size, .. } => Some(*size),
                _ => None,
            })
            .collect();
        assert_eq!(batch_sizes, vec![50, 50, 50, 50, 7]);

        let progress: Vec<(usize, usize)> = events
            .iter()
            .filter_map(|e| match e {
                SyncEvent::BatchComplete { completed, total } => Some((*completed, *total)),
                _ => None,
            })
            .collect();
        assert_eq!(progress, vec![(50, 207), (100, 207), (150, 207), (200, 207), (207, 207)]);
        assert_eq!(events.first(), Some(&SyncEvent::Started { total: 207 }));
        assert_eq!(events.last(), Some(&SyncEvent::Complete));
        assert_eq!(events.iter().filter(|e| matches!(e, SyncEvent::Processed(_))).count(), 207);

        // No download of batch k+1 starts before every download of batch k finished.
        let batch_of = |url: &str| -> usize {
            let number: usize = url.trim_start_matches("mock://raw/normal/").trim_end_matches(".png").parse().unwrap();
            (number - 1) / 50
        };
        let sizes = [50, 50, 50, 50, 7];
        let mut finished = [0usize; 5];
        for event in fixture.remote.events() {
            match event {
                MockEvent::DownloadStarted(url) => {
                    let batch = batch_of(&url);
                    for earlier in 0..batch {
                        assert_eq!(finished[earlier], sizes[earlier], "{url} started before batch {earlier} finished");
                    }
                },
                MockEvent::DownloadFinished(url) => finished[batch_of(&url)] += 1,
                MockEvent::Listed(_) => {},
            }
        }
        assert_eq!(finished, sizes);
        assert!(fixture.remote.max_in_flight() <= 50);
        assert_eq!(fixture.ctx.report.saved(), 207);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_stop_the_batch() {
        let (files, names) = numbered(50);
        let files: Vec<&str> = files.iter().map(String::as_str).collect();
        let names: Vec<(&str, &str)> = names.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        let fixture = Fixture::builder(&[("normal", files.as_slice())], &names)
            .remote(|remote| remote.with_failure("mock://raw/normal/17.png"))
            .build();
        let target = target();

        let events: Vec<SyncEvent> = run_batches(&fixture.ctx, &target, entries(&fixture, 50)).try_collect().await.unwrap();

        assert!(events.contains(&SyncEvent::BatchComplete { completed: 50, total: 50 }));
        assert_eq!(events.last(), Some(&SyncEvent::Complete));
        assert_eq!(fixture.ctx.report.saved(), 49);
        let failures = fixture.ctx.report.failures();
        assert_eq!(failures.len(), 1);
        assert!(matches!(
            &failures[0],
            FailedAsset { entry, failure: Failure::FetchFailed(_) } if entry.path == "normal/17.png"
        ));
        assert_eq!(fixture.storage.paths().await.len(), 49);
    }

    #[tokio::test]
    async fn test_fatal_error_ends_stream() {
        let fixture = fixture(3);
        fixture.storage.deny_writes();
        let target = target();

        let mut events = Vec::new();
        let mut stream = std::pin::pin!(run_batches(&fixture.ctx, &target, entries(&fixture, 3)));
        let mut error = None;
        while let Some(item) = stream.next().await {
            match item {
                Ok(event) => events.push(event),
                Err(e) => error = Some(e),
            }
        }
        let error = error.unwrap();
        assert!(matches!(&*error, ErrorKind::Storage));
        assert!(!events.contains(&SyncEvent::Complete));
        assert!(!events.iter().any(|e| matches!(e, SyncEvent::BatchComplete { .. })));
    }

    #[tokio::test]
    async fn test_empty_target() {
        let fixture = fixture(0);
        let target = target();
        let events: Vec<SyncEvent> = run_batches(&fixture.ctx, &target, vec![]).try_collect().await.unwrap();
        assert_eq!(events, vec![SyncEvent::Started { total: 0 }, SyncEvent::Complete]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_shared_names_overwrite_on_disk() {
        let files: Vec<String> = (0..20).map(|i| format!("25-f{i}.png")).collect();
        let files: Vec<&str> = files.iter().map(String::as_str).collect();
        let names: Vec<(String, String)> = (0..20).map(|i| (format!("25-f{i}"), "pikachu".to_string())).collect();
        let names: Vec<(&str, &str)> = names.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(LocalBackend::new("icons", dir.path()).unwrap());
        let (_remote, ctx) = Fixture::builder(&[("normal", files.as_slice())], &names)
            .remote(|remote| remote.with_latency(Duration::from_millis(1)))
            .build_with(storage);
        let target = target();
        let entries: Vec<FileEntry> = files.iter().map(|f| entry(&format!("normal/{f}"))).collect();

        let events: Vec<SyncEvent> = run_batches(&ctx, &target, entries).try_collect().await.unwrap();

        assert_eq!(events.last(), Some(&SyncEvent::Complete));
        assert_eq!(ctx.report.saved(), 20);
        assert_eq!(ctx.report.failed(), 0);
        let written: Vec<_> = std::fs::read_dir(dir.path().join("normal")).unwrap().map(|e| e.unwrap().file_name()).collect();
        assert_eq!(written, vec![std::ffi::OsString::from("pikachu.png")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_between_batches_only() {
        let fixture = Fixture::builder(&[("normal", &["1.png", "2.png", "3.png"])], &[("1", "a"), ("2", "b"), ("3", "c")])
            .config(|config| {
                config.batch_size = 1;
                config.batch_delay_ms = 250;
            })
            .build();
        let target = target();
        let files = entries(&fixture, 3);

        let started = tokio::time::Instant::now();
        let events: Vec<SyncEvent> = run_batches(&fixture.ctx, &target, files).try_collect().await.unwrap();
        // Three batches, two pauses.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(500) && elapsed < Duration::from_millis(750), "{elapsed:?}");
        assert_eq!(events.iter().filter(|e| matches!(e, SyncEvent::BatchStarted { .. })).count(), 3);
    }
}
