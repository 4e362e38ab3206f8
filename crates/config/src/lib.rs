//! Layered configuration for spritesync.
//!
//! Sources, lowest precedence first: built-in defaults, a TOML file, `SPRITESYNC_*`
//! environment variables (nested keys separated by `__`, e.g.
//! `SPRITESYNC_FILTER__MARKERS`), then overrides supplied on the command line.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_PREFIX: &str = "SPRITESYNC_";
pub const CONFIG_FILE_NAME: &str = "config.toml";
/// Must appear in [`Config::raw_url`]; replaced with each file's path.
pub const PATH_PLACEHOLDER: &str = "{path}";

const DEFAULT_TREE_URL: &str =
    "https://api.github.com/repos/PokeAPI/sprites/git/trees/c87f4ced89853ad94e3a474306c07d329a28d59c";
const DEFAULT_RAW_URL: &str = "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/{path}";

/// Sprites rendered in 3D rather than pixel art. They can't be told apart by
/// name alone, so they are listed by hand.
const RENDERED_3D: &[&str] = &[
    "10093.png", "10094.png", "10095.png", "10096.png", "10097.png", "10098.png", "10099.png",
    "10121.png", "10122.png", "10130.png", "10131.png", "10132.png", "10133.png", "10134.png",
    "10135.png", "10144.png", "10145.png", "10148.png", "10149.png", "10150.png", "10151.png",
    "414-plant.png", "664-icy-snow.png", "665-icy-snow.png", "666-archipelago.png",
    "666-continental.png", "666-elegant.png", "666-fancy.png", "666-garden.png",
    "666-high-plains.png", "666-icy-snow.png", "666-jungle.png", "666-marine.png",
    "666-meadow.png", "666-modern.png", "666-monsoon.png", "666-ocean.png", "666-poke-ball.png",
    "666-polar.png", "666-river.png", "666-sandstorm.png", "666-savanna.png", "666-sun.png",
    "666-tundra.png", "669-blue.png", "669-orange.png", "669-white.png", "669-yellow.png",
    "670-blue.png", "670-orange.png", "670-white.png", "670-yellow.png", "671-blue.png",
    "671-orange.png", "671-white.png", "671-yellow.png", "676-dandy.png", "676-debutante.png",
    "676-diamond.png", "676-heart.png", "676-kabuki.png", "676-la-reine.png", "676-matron.png",
    "676-pharaoh.png", "676-star.png", "710-large.png", "710-small.png", "710-super.png",
    "716-neutral.png", "720-unbound.png", "741-baile.png", "745-midday.png", "746-solo.png",
    "773-bug.png", "773-dark.png", "773-dragon.png", "773-electric.png", "773-fairy.png",
    "773-fighting.png", "773-fire.png", "773-flying.png", "773-ghost.png", "773-grass.png",
    "773-ground.png", "773-ice.png", "773-normal.png", "773-poison.png", "773-psychic.png",
    "773-rock.png", "773-steel.png", "773-water.png", "774-red-meteor.png", "775-form-1.png",
    "778-disguised.png", "784-totem.png",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Every target's local directory is created beneath this one.
    pub base_dir: PathBuf,
    /// JSON object mapping file stems to canonical names.
    pub names: PathBuf,
    /// Multiplier applied to trimmed sprites.
    pub scale: f64,
    pub batch_size: usize,
    /// Pause between batches of one target, in milliseconds.
    pub batch_delay_ms: u64,
    /// Tree listing endpoint of the directory that target paths start from.
    pub tree_url: String,
    /// Download URL template; see [`PATH_PLACEHOLDER`].
    pub raw_url: String,
    /// Bearer token sent with tree listings. Anonymous requests are heavily
    /// rate-limited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub targets: Vec<TargetConfig>,
    pub filter: FilterConfig,
}

/// A remote directory and where its sprites end up locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Slash-separated path below [`Config::tree_url`]; empty for the root.
    #[serde(default)]
    pub remote: String,
    /// Relative to [`Config::base_dir`].
    pub local: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Only files with this extension (case-insensitive, no dot) are synced.
    pub extension: String,
    /// File names containing any of these are skipped.
    pub markers: Vec<String>,
    /// Exact file names to skip.
    pub exclusions: Vec<String>,
    /// Stems that have no number but are still synced, ahead of numbered ones
    /// and in the order listed here.
    pub specials: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            extension: "png".to_string(),
            markers: vec!["-mega".to_string(), "-primal".to_string()],
            exclusions: RENDERED_3D.iter().map(|s| s.to_string()).collect(),
            specials: vec!["egg-manaphy".to_string(), "egg".to_string(), "substitute".to_string()],
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let dirs = project_dirs();
        let data_dir = dirs
            .as_ref()
            .map_or_else(|| PathBuf::from("spritesync"), |d| d.data_dir().to_path_buf());
        Self {
            base_dir: data_dir.join("icons"),
            names: data_dir.join("names.json"),
            scale: 3.0,
            batch_size: 50,
            batch_delay_ms: 1000,
            tree_url: DEFAULT_TREE_URL.to_string(),
            raw_url: DEFAULT_RAW_URL.to_string(),
            token: None,
            user_agent: concat!("spritesync/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 30,
            targets: vec![
                TargetConfig {
                    remote: String::new(),
                    local: PathBuf::from("normal"),
                },
                TargetConfig {
                    remote: "shiny".to_string(),
                    local: PathBuf::from("shiny"),
                },
            ],
            filter: FilterConfig::default(),
        }
    }
}

/// Values given on the command line. Unset fields leave lower layers alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub names: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_delay_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree_url: Option<String>,
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "spritesync")
}

/// `config.toml` in the platform configuration directory, if there is one.
pub fn default_config_file() -> Option<PathBuf> {
    project_dirs().map(|d| d.config_dir().join(CONFIG_FILE_NAME))
}

impl Config {
    /// Defaults, the TOML file and the environment, without validation.
    ///
    /// `config_file` falls back to [`default_config_file`]; a missing default
    /// file is skipped silently.
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = config_file.map(Path::to_path_buf).or_else(default_config_file) {
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let mut config: Config = figment.extract().map_err(|e| ErrorKind::Load(e.to_string()))?;
        if config.base_dir.is_relative() {
            config.base_dir = std::path::absolute(&config.base_dir)
                .map_err(|e| ErrorKind::invalid("base_dir", e.to_string()))?;
        }
        Ok(config)
    }

    /// Load every layer, apply `overrides` and validate the result.
    ///
    /// # Errors
    /// [`Load`](ErrorKind::Load) if an explicitly named file is missing or any
    /// source is malformed; [`Invalid`](ErrorKind::Invalid) from
    /// [`validate`](Self::validate).
    pub fn load(config_file: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        if let Some(file) = config_file
            && !file.is_file()
        {
            exn::bail!(ErrorKind::Load(format!("{} does not exist", file.display())));
        }
        let figment = Self::figment(config_file).merge(Serialized::defaults(overrides));
        let config = Self::from_figment(&figment)?;
        config.validate()?;
        tracing::debug!(
            base_dir = %config.base_dir.display(),
            targets = config.targets.len(),
            scale = config.scale,
            batch_size = config.batch_size,
            "Loaded configuration"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            exn::bail!(ErrorKind::invalid("scale", format!("must be a positive number, got {}", self.scale)));
        }
        if self.batch_size == 0 {
            exn::bail!(ErrorKind::invalid("batch_size", "must be at least 1"));
        }
        if self.timeout_secs == 0 {
            exn::bail!(ErrorKind::invalid("timeout_secs", "must be at least 1"));
        }
        if !self.raw_url.contains(PATH_PLACEHOLDER) {
            exn::bail!(ErrorKind::invalid("raw_url", format!("must contain {PATH_PLACEHOLDER}")));
        }
        if self.filter.extension.is_empty() {
            exn::bail!(ErrorKind::invalid("filter.extension", "must not be empty"));
        }
        if self.targets.is_empty() {
            exn::bail!(ErrorKind::invalid("targets", "at least one target is required"));
        }
        let mut seen = HashSet::new();
        for target in &self.targets {
            if target.local.is_absolute() || target.local.as_os_str().is_empty() {
                exn::bail!(ErrorKind::invalid(
                    "targets.local",
                    format!("`{}` must be a relative directory", target.local.display())
                ));
            }
            if !seen.insert(&target.local) {
                exn::bail!(ErrorKind::invalid(
                    "targets.local",
                    format!("`{}` is used by more than one target", target.local.display())
                ));
            }
        }
        Ok(())
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
