use crate::error::{ErrorKind, Result};
use crate::report::{FailedAsset, Failure};
use crate::{Context, SyncTarget};
use exn::ResultExt;
use spritesync_imaging::RgbaImage;
use spritesync_imaging::error::ErrorKind as ImagingErrorKind;
use spritesync_remote::FileEntry;
use std::path::PathBuf;
use tracing::instrument;

/// What happened to one sprite, short of a fatal error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Written to `path`, relative to the storage root.
    Saved { entry: FileEntry, name: String, path: PathBuf },
    /// Skipped and recorded in the run's [`RunReport`](crate::RunReport).
    Failed(FailedAsset),
}

/// Fetch, trim, scale and save a single sprite into `target`.
///
/// Per-sprite problems (no identity, no name, download or decode failure,
/// nothing to trim) are recorded once in the run report and returned as
/// [`Outcome::Failed`]. An existing output file is overwritten.
///
/// # Errors
/// - [`Imaging`](ErrorKind::Imaging) if scaling or PNG encoding fails.
/// - [`Storage`](ErrorKind::Storage) if the destination rejects the write.
/// - [`Task`](ErrorKind::Task) if a blocking image task dies.
#[instrument(skip_all, fields(path = %entry.path, local = %target))]
pub async fn process_one(ctx: &Context, target: &SyncTarget, entry: FileEntry) -> Result<Outcome> {
    let (name, bytes) = match fetch(ctx, &entry).await {
        Ok(fetched) => fetched,
        Err(failure) => return Ok(fail(ctx, entry, failure)),
    };
    let image = match blocking(move || decode_and_trim(&bytes)).await? {
        Ok(image) => image,
        Err(failure) => return Ok(fail(ctx, entry, failure)),
    };

    let factor = ctx.scale;
    let png = blocking(move || spritesync_imaging::encode_png(&spritesync_imaging::scale(&image, factor)?))
        .await?
        .or_raise(|| ErrorKind::Imaging)?;

    let path = target.local.join(format!("{name}.png"));
    ctx.storage.write(&path, &png).await.or_raise(|| ErrorKind::Storage)?;
    ctx.report.record_saved();
    tracing::debug!(output = %path.display(), bytes = png.len(), "Saved sprite");
    Ok(Outcome::Saved { entry, name, path })
}

/// Identity, canonical name and raw bytes.
async fn fetch(ctx: &Context, entry: &FileEntry) -> std::result::Result<(String, Vec<u8>), Failure> {
    let stem = entry.stem();
    let id = ctx
        .catalog
        .identify(stem)
        .ok_or_else(|| Failure::IdentityExtractionFailed(stem.to_string()))?;
    let name = ctx.names.get(id.key()).ok_or_else(|| Failure::UnknownAsset(id.key().to_string()))?;
    let bytes = ctx
        .remote
        .download(&entry.download_url)
        .await
        .map_err(|e| {
            if e.is_retryable() {
                tracing::info!(url = %entry.download_url, "Download failure looks transient; a later run may fetch it");
            }
            Failure::FetchFailed((*e).to_string())
        })?;
    Ok((name.to_string(), bytes))
}

fn decode_and_trim(bytes: &[u8]) -> std::result::Result<RgbaImage, Failure> {
    let image = spritesync_imaging::decode(bytes).map_err(|e| Failure::DecodeFailed((*e).to_string()))?;
    spritesync_imaging::trim(&image).map_err(|e| match *e {
        ImagingErrorKind::FullyTransparent => Failure::TrimFailed,
        ref other => Failure::DecodeFailed(other.to_string()),
    })
}

fn fail(ctx: &Context, entry: FileEntry, failure: Failure) -> Outcome {
    tracing::warn!(path = %entry.path, reason = %failure, "Skipping sprite");
    let failed = FailedAsset { entry, failure };
    ctx.report.record_failure(failed.clone());
    Outcome::Failed(failed)
}

async fn blocking<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(work).await.or_raise(|| ErrorKind::Task)
}
