use clap::Parser;
use spritesync_config::Overrides;
use std::path::PathBuf;

/// Mirror sprite icons from a remote Git tree, trimmed and upscaled.
///
/// Settings are layered: built-in defaults, then the config file, then
/// `SPRITESYNC_*` environment variables, then these flags.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// Scale factor applied to every trimmed sprite.
    #[arg(short = 'u', long, value_name = "FACTOR")]
    pub scale: Option<f64>,

    /// Number of sprites fetched concurrently per target.
    #[arg(short, long, value_name = "N")]
    pub batch_size: Option<usize>,

    /// Pause between batches, in milliseconds.
    #[arg(long, value_name = "MS")]
    pub delay_ms: Option<u64>,

    /// Directory the target directories are created in.
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// JSON file mapping sprite file stems to names.
    #[arg(long, value_name = "FILE")]
    pub names: Option<PathBuf>,

    /// Configuration file (defaults to `config.toml` in the user config directory).
    #[arg(short, long, value_name = "FILE", env = "SPRITESYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Tree listing endpoint that target paths are resolved from.
    #[arg(long, value_name = "URL")]
    pub tree_url: Option<String>,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            base_dir: self.output.clone(),
            names: self.names.clone(),
            scale: self.scale,
            batch_size: self.batch_size,
            batch_delay_ms: self.delay_ms,
            tree_url: self.tree_url.clone(),
        }
    }
}
