//! Shared fixtures: a mock remote tree serving real PNG sprites, an in-memory
//! destination, and a [`Context`] wired to both.

use crate::{Context, NameTable};
use spritesync_config::Config;
use spritesync_imaging::{Rgba, RgbaImage, encode_png};
use spritesync_remote::FileEntry;
use spritesync_remote::backend::MockRemote;
use spritesync_storage::{BackendHandle, StorageBackend};
use spritesync_storage::backend::MockBackend;
use std::path::Path;
use std::sync::Arc;

pub(crate) const ROOT: &str = "mock://root";
pub(crate) const RAW: &str = "mock://raw/{path}";

/// A 2x2 opaque block centred in a 4x4 transparent canvas.
pub(crate) fn sprite_png() -> Vec<u8> {
    let image = RgbaImage::from_fn(4, 4, |x, y| match (x, y) {
        (1..=2, 1..=2) => Rgba([200, 40, 40, 255]),
        _ => Rgba([0, 0, 0, 0]),
    });
    encode_png(&image).unwrap()
}

/// The entry the mock tree would list for `path`.
pub(crate) fn entry(path: &str) -> FileEntry {
    let name = path.rsplit('/').next().unwrap_or(path);
    FileEntry {
        path: path.to_string(),
        sha: "0".to_string(),
        size: 1,
        url: format!("mock://blob/{name}"),
        download_url: RAW.replace("{path}", path),
    }
}

pub(crate) fn blank_png() -> Vec<u8> {
    encode_png(&RgbaImage::new(4, 4)).unwrap()
}

pub(crate) struct Fixture {
    pub remote: Arc<MockRemote>,
    pub storage: Arc<MockBackend>,
    pub ctx: Context,
}

pub(crate) struct FixtureBuilder {
    remote: MockRemote,
    names: NameTable,
    config: Config,
}

impl Fixture {
    pub fn new(dirs: &[(&str, &[&str])], names: &[(&str, &str)]) -> Self {
        Self::builder(dirs, names).build()
    }

    /// A root directory containing `dirs`, each holding the listed files. Every
    /// file downloads as [`sprite_png`] unless the builder says otherwise.
    pub fn builder(dirs: &[(&str, &[&str])], names: &[(&str, &str)]) -> FixtureBuilder {
        let dir_urls: Vec<(String, String)> =
            dirs.iter().map(|(dir, _)| (dir.to_string(), format!("mock://tree/{dir}"))).collect();
        let root_dirs: Vec<(&str, &str)> = dir_urls.iter().map(|(d, u)| (d.as_str(), u.as_str())).collect();

        let png = sprite_png();
        let mut remote = MockRemote::default().with_tree(ROOT, &root_dirs, &[]);
        for (dir, files) in dirs {
            remote = remote.with_tree(format!("mock://tree/{dir}"), &[], files);
            for file in *files {
                remote = remote.with_file(format!("mock://raw/{dir}/{file}"), png.clone());
            }
        }

        let config = Config {
            tree_url: ROOT.to_string(),
            raw_url: RAW.to_string(),
            batch_delay_ms: 0,
            ..Config::default()
        };
        FixtureBuilder {
            remote,
            names: names.iter().copied().collect(),
            config,
        }
    }

    pub fn entry(&self, path: &str) -> FileEntry {
        entry(path)
    }

    pub async fn storage_bytes(&self, path: &str) -> Vec<u8> {
        self.storage.read(Path::new(path)).await.unwrap()
    }
}

impl FixtureBuilder {
    pub fn remote(mut self, configure: impl FnOnce(MockRemote) -> MockRemote) -> Self {
        self.remote = configure(self.remote);
        self
    }

    pub fn config(mut self, configure: impl FnOnce(&mut Config)) -> Self {
        configure(&mut self.config);
        self
    }

    pub fn build(self) -> Fixture {
        let remote = Arc::new(self.remote);
        let storage = Arc::new(MockBackend::default());
        let ctx = Context::new(&self.config, remote.clone(), storage.clone(), self.names);
        Fixture { remote, storage, ctx }
    }

    /// Wire the mock remote to some other destination, such as a real directory.
    pub fn build_with(self, storage: BackendHandle) -> (Arc<MockRemote>, Context) {
        let remote = Arc::new(self.remote);
        let ctx = Context::new(&self.config, remote.clone(), storage, self.names);
        (remote, ctx)
    }
}
