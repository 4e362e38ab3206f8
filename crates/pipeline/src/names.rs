use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::collections::HashMap;
use std::path::Path;

/// Canonical display names, keyed by file stem (`"25"` to `"pikachu"`).
///
/// Names become output file names, so entries that could escape a target
/// directory are rejected on load.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    names: HashMap<String, String>,
}

impl NameTable {
    /// Read a JSON object of `stem: name` pairs from disk.
    pub async fn load(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await.or_raise(|| ErrorKind::NameTable(path.to_path_buf()))?;
        let table = Self::from_json(&bytes).or_raise(|| ErrorKind::NameTable(path.to_path_buf()))?;
        tracing::debug!(path = %path.display(), names = table.len(), "Loaded name table");
        Ok(table)
    }

    pub fn from_json(bytes: &[u8]) -> std::result::Result<Self, InvalidNameTable> {
        let names: HashMap<String, String> =
            serde_json::from_slice(bytes).map_err(|e| InvalidNameTable(e.to_string()))?;
        if let Some((key, name)) = names.iter().find(|(_, name)| !is_safe_file_stem(name)) {
            return Err(InvalidNameTable(format!("name '{name}' for '{key}' is not a plain file name")));
        }
        Ok(Self { names })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.names.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for NameTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// The name table's contents were unusable.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("invalid name table: {_0}")]
pub struct InvalidNameTable(#[error(not(source))] String);

fn is_safe_file_stem(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\', '\0'])
}
