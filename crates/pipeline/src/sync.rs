use crate::batch::{SyncEvent, run_batches};
use crate::error::{ErrorKind, Result};
use crate::{Context, SyncTarget};
use async_stream::stream;
use exn::ResultExt;
use futures::{Stream, StreamExt};
use spritesync_remote::FileEntry;
use tracing::instrument;

/// Resolve `target`'s remote directory, make sure its local directory exists,
/// and return its sprites in fetch order.
///
/// # Errors
/// - [`Remote`](ErrorKind::Remote) if the directory can't be resolved or
///   listed.
/// - [`Storage`](ErrorKind::Storage) if the local directory can't be created.
#[instrument(skip_all, fields(remote = %target.remote, local = %target))]
pub async fn prepare_target(ctx: &Context, target: &SyncTarget) -> Result<Vec<FileEntry>> {
    let node = ctx.resolver.resolve(&target.remote).await.or_raise(|| ErrorKind::Remote)?;
    let listed = ctx.resolver.files(node).await.or_raise(|| ErrorKind::Remote)?;
    ctx.storage.create_dir_all(&target.local).await.or_raise(|| ErrorKind::Storage)?;

    let files = ctx.catalog.filter_and_sort(listed.iter().cloned());
    tracing::info!(listed = listed.len(), selected = files.len(), "Resolved target");
    Ok(files)
}

/// [`prepare_target`] followed by [`run_batches`].
pub fn sync_target<'a>(ctx: &'a Context, target: &'a SyncTarget) -> impl Stream<Item = Result<SyncEvent>> + 'a {
    // `rustfmt` does not format macro-specific syntax such as
    // `for await` even using the parentheses trick.
    stream! {
        let files = match prepare_target(ctx, target).await {
            Ok(files) => files,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        for await event in run_batches(ctx, target, files) {
            yield event;
        }
    }
}

/// Sync every target at once, each paced by its own batch loop.
///
/// Events from all targets are interleaved as they happen, tagged with their
/// target. The first fatal error from any target is yielded and ends the
/// stream; dropping it cancels whatever the other targets had in flight.
pub fn sync_all<'a>(
    ctx: &'a Context,
    targets: &'a [SyncTarget],
) -> impl Stream<Item = Result<(&'a SyncTarget, SyncEvent)>> + 'a {
    stream! {
        let mut merged = futures::stream::select_all(
            targets.iter().map(|target| Box::pin(sync_target(ctx, target).map(move |event| event.map(|e| (target, e))))),
        );
        while let Some(item) = merged.next().await {
            let fatal = item.is_err();
            yield item;
            if fatal {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::Outcome;
    use crate::test_support::Fixture;
    use futures::TryStreamExt;
    use std::path::PathBuf;

    fn target(remote: &str, local: &str) -> SyncTarget {
        SyncTarget {
            remote: remote.to_string(),
            local: PathBuf::from(local),
        }
    }

    fn processed(events: &[(&SyncTarget, SyncEvent)]) -> Vec<(String, String)> {
        events
            .iter()
            .filter_map(|(target, event)| match event {
                SyncEvent::Processed(Outcome::Saved { entry, .. }) => Some((target.to_string(), entry.file_name().to_string())),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_end_to_end() {
        let fixture = Fixture::new(&[("normal", &["1.png", "1-mega.png", "substitute.png"])], &[
            ("1", "bulbasaur"),
            ("substitute", "substitute"),
        ]);
        let targets = [target("normal", "normal")];

        let events: Vec<_> = sync_all(&fixture.ctx, &targets).try_collect().await.unwrap();

        // Batch size 50 puts both in one concurrent batch, so the dispatch
        // order is what the remote saw.
        let starts: Vec<_> = fixture
            .remote
            .events()
            .into_iter()
            .filter_map(|e| match e {
                spritesync_remote::backend::MockEvent::DownloadStarted(url) => Some(url),
                _ => None,
            })
            .collect();
        assert_eq!(starts, vec!["mock://raw/normal/substitute.png", "mock://raw/normal/1.png"]);
        assert_eq!(processed(&events).len(), 2);
        assert_eq!(
            fixture.storage.paths().await,
            vec![PathBuf::from("normal/bulbasaur.png"), PathBuf::from("normal/substitute.png")]
        );
        assert!(fixture.storage.has_dir("normal").await);
        assert_eq!(fixture.ctx.report().summary(), None);
        assert!(matches!(events.last(), Some((_, SyncEvent::Complete))));
    }

    #[tokio::test]
    async fn test_targets_progress_independently() {
        let fixture = Fixture::new(&[("normal", &["1.png", "2.png"]), ("shiny", &["1.png", "2.png"])], &[
            ("1", "bulbasaur"),
            ("2", "ivysaur"),
        ]);
        let targets = [target("normal", "normal"), target("shiny", "shiny")];

        let events: Vec<_> = sync_all(&fixture.ctx, &targets).try_collect().await.unwrap();

        for target in &targets {
            let own: Vec<_> = events.iter().filter(|(t, _)| *t == target).map(|(_, e)| e.clone()).collect();
            assert_eq!(own.first(), Some(&SyncEvent::Started { total: 2 }));
            assert_eq!(own.last(), Some(&SyncEvent::Complete));
        }
        assert_eq!(fixture.storage.paths().await.len(), 4);
        assert_eq!(fixture.ctx.report().saved(), 4);
        // The shared root is listed once even though both targets walk it.
        assert_eq!(fixture.remote.list_calls_for("mock://root"), 1);
    }

    #[tokio::test]
    async fn test_root_target() {
        let fixture = Fixture::new(&[("normal", &["1.png"])], &[("1", "bulbasaur")]);
        let targets = [target("", "root")];
        let events: Vec<_> = sync_all(&fixture.ctx, &targets).try_collect().await.unwrap();
        // The root only holds a directory, so there is nothing to fetch.
        assert_eq!(events.first().map(|(_, e)| e), Some(&SyncEvent::Started { total: 0 }));
        assert!(fixture.storage.has_dir("root").await);
    }

    #[tokio::test]
    async fn test_missing_directory_is_fatal() {
        let fixture = Fixture::new(&[("normal", &["1.png"])], &[("1", "bulbasaur")]);
        let targets = [target("normal", "normal"), target("female", "female")];

        let mut stream = std::pin::pin!(sync_all(&fixture.ctx, &targets));
        let mut items = Vec::new();
        while let Some(item) = stream.next().await {
            items.push(item);
        }
        let last = items.pop().unwrap();
        let err = last.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Remote));
        // Nothing follows the fatal error.
        assert!(items.iter().all(|i| i.is_ok()));
        assert!(!fixture.storage.has_dir("female").await);
    }
}
