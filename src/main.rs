mod cli;
mod error;

use crate::cli::Args;
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use futures::StreamExt;
use spritesync_config::Config;
use spritesync_pipeline::{Context, NameTable, Outcome, SyncEvent, SyncTarget, sync_all};
use spritesync_remote::{HttpBackend, HttpOptions};
use spritesync_storage::backend::LocalBackend;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:?}");
            ExitCode::FAILURE
        },
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_target(false)
        .init();
}

async fn run(args: Args) -> Result<()> {
    let config = Config::load(args.config.as_deref(), &args.overrides()).or_raise(|| ErrorKind::Config)?;

    let remote = HttpBackend::new(HttpOptions {
        user_agent: config.user_agent.clone(),
        token: config.token.clone(),
        timeout: config.timeout(),
    })
    .or_raise(|| ErrorKind::Client)?;
    let storage = LocalBackend::new("local", &config.base_dir).or_raise(|| ErrorKind::Storage)?;
    let names = NameTable::load(&config.names).await.or_raise(|| ErrorKind::Names)?;

    let ctx = Context::new(&config, Arc::new(remote), Arc::new(storage), names);
    let targets: Vec<SyncTarget> = config.targets.iter().map(SyncTarget::from).collect();
    tracing::info!(
        output = %config.base_dir.display(),
        targets = targets.len(),
        scale = config.scale,
        "Starting sync"
    );

    let mut events = std::pin::pin!(sync_all(&ctx, &targets));
    while let Some(event) = events.next().await {
        let (target, event) = event.or_raise(|| ErrorKind::Sync)?;
        match event {
            SyncEvent::Started { total } => tracing::info!(local = %target, total, "Syncing target"),
            SyncEvent::Processed(Outcome::Saved { name, .. }) => tracing::debug!("{target}: {name} saved"),
            SyncEvent::BatchComplete { completed, total } => tracing::info!("{target}: [{completed}/{total}]"),
            SyncEvent::Complete => tracing::info!(local = %target, "Target complete"),
            SyncEvent::BatchStarted { .. } | SyncEvent::Processed(Outcome::Failed(_)) => {},
        }
    }

    let report = ctx.report();
    tracing::info!(saved = report.saved(), failed = report.failed(), "Sync complete");
    if let Some(summary) = report.summary() {
        println!("{summary}");
    }
    Ok(())
}
