//! Deciding which remote files are sprites, what they are, and in which order
//! to fetch them.

use regex::Regex;
use spritesync_config::FilterConfig;
use spritesync_remote::FileEntry;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Sort position of unnumbered stems: ahead of every number. Specials rank
/// at or below it.
pub const SENTINEL: i64 = -1;

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+").unwrap());

/// Identity of a sprite, derived from its file stem.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssetId {
    /// A configured special stem such as `substitute`.
    Special(String),
    /// A stem containing a number, e.g. `25` or `412-sandy`.
    Numbered { number: u64, stem: String },
}

impl AssetId {
    /// Key into the name table: always the full stem, so that forms of the
    /// same number (`412-plant`, `412-sandy`) keep distinct names.
    pub fn key(&self) -> &str {
        match self {
            Self::Special(stem) | Self::Numbered { stem, .. } => stem,
        }
    }

    pub fn number(&self) -> Option<u64> {
        match self {
            Self::Special(_) => None,
            Self::Numbered { number, .. } => Some(*number),
        }
    }
}

/// The first maximal run of ASCII digits in `stem`. Runs too long for a
/// `u64` saturate.
fn first_number(stem: &str) -> Option<u64> {
    DIGITS.find(stem).map(|m| m.as_str().parse().unwrap_or(u64::MAX))
}

/// Filtering and ordering rules for one run.
#[derive(Debug, Clone)]
pub struct Catalog {
    extension: String,
    markers: Vec<String>,
    exclusions: HashSet<String>,
    /// Sort position of each special stem, `-n` for the first of `n`.
    specials: HashMap<String, i64>,
}

impl Catalog {
    pub fn new(filter: &FilterConfig) -> Self {
        Self {
            extension: filter.extension.to_lowercase(),
            markers: filter.markers.clone(),
            exclusions: filter.exclusions.iter().cloned().collect(),
            specials: filter
                .specials
                .iter()
                .rev()
                .zip((1i64..).map(|n| -n))
                .map(|(stem, rank)| (stem.clone(), rank))
                .collect(),
        }
    }

    /// Whether `entry` should be synced at all.
    pub fn accepts(&self, entry: &FileEntry) -> bool {
        let name = entry.file_name();
        entry.extension().as_deref() == Some(self.extension.as_str())
            && !self.markers.iter().any(|marker| name.contains(marker.as_str()))
            && !self.exclusions.contains(name)
    }

    /// `(number, stem length, stem)`. Specials take their configured rank
    /// and unnumbered stems take [`SENTINEL`].
    pub fn sort_key<'a>(&self, entry: &'a FileEntry) -> (i64, usize, &'a str) {
        let stem = entry.stem();
        let number = match self.identify(stem) {
            Some(AssetId::Special(_)) => self.specials.get(stem).copied().unwrap_or(SENTINEL),
            Some(id) => id.number().map_or(i64::MAX, |n| i64::try_from(n).unwrap_or(i64::MAX)),
            None => SENTINEL,
        };
        (number, stem.len(), stem)
    }

    /// Drop everything [`accepts`](Self::accepts) rejects and order the rest
    /// by [`sort_key`](Self::sort_key). Applying it twice changes nothing.
    pub fn filter_and_sort(&self, entries: impl IntoIterator<Item = FileEntry>) -> Vec<FileEntry> {
        let mut files: Vec<_> = entries.into_iter().filter(|e| self.accepts(e)).collect();
        files.sort_by(|a, b| self.sort_key(a).cmp(&self.sort_key(b)));
        files
    }

    /// `None` when the stem is neither special nor numbered.
    pub fn identify(&self, stem: &str) -> Option<AssetId> {
        if self.specials.contains_key(stem) {
            return Some(AssetId::Special(stem.to_string()));
        }
        first_number(stem).map(|number| AssetId::Numbered {
            number,
            stem: stem.to_string(),
        })
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(&FilterConfig::default())
    }
}
