//! In-memory remote for testing.

use crate::RemoteBackend;
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Something the mock observed, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEvent {
    Listed(String),
    DownloadStarted(String),
    DownloadFinished(String),
}

/// In-memory [`RemoteBackend`] for tests.
///
/// Serves canned tree listings and file bodies keyed by URL, counts every
/// request, and records the order in which downloads start and finish so
/// batching behaviour can be asserted on.
///
/// # Examples
///
/// ```ignore
/// use spritesync_remote::backend::{MockRemote, RemoteBackend};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let remote = MockRemote::default()
///     .with_tree("mock://root", &[("normal", "mock://normal")], &[])
///     .with_tree("mock://normal", &[], &["1.png"])
///     .with_file("mock://raw/normal/1.png", b"\x89PNG...".to_vec());
/// assert!(remote.download("mock://raw/normal/1.png").await.is_ok());
/// assert_eq!(remote.list_calls(), 0);
/// # }
/// ```
#[derive(Default)]
pub struct MockRemote {
    listings: HashMap<String, (u16, Vec<u8>)>,
    files: HashMap<String, Vec<u8>>,
    failures: HashSet<String>,
    latency: Option<Duration>,
    list_calls: Mutex<HashMap<String, usize>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    events: Mutex<Vec<MockEvent>>,
}

impl MockRemote {
    /// Serve a tree listing at `url` with the given sub-directories
    /// (`(name, url)` pairs) and files. File sizes are fixed at 1 byte.
    pub fn with_tree(mut self, url: impl Into<String>, dirs: &[(&str, &str)], files: &[&str]) -> Self {
        let mut tree = Vec::new();
        for (name, dir_url) in dirs {
            tree.push(json!({"path": name, "mode": "040000", "type": "tree", "sha": "0", "url": dir_url}));
        }
        for name in files {
            tree.push(json!({"path": name, "mode": "100644", "type": "blob", "sha": "0", "size": 1, "url": format!("mock://blob/{name}")}));
        }
        let body = json!({"sha": "0", "tree": tree, "truncated": false}).to_string().into_bytes();
        self.listings.insert(url.into(), (200, body));
        self
    }

    /// Serve an arbitrary listing body with the given status.
    pub fn with_raw_listing(mut self, url: impl Into<String>, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.listings.insert(url.into(), (status, body.into()));
        self
    }

    pub fn with_file(mut self, url: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.files.insert(url.into(), data.into());
        self
    }

    /// Make downloads of `url` fail with a `500` status.
    pub fn with_failure(mut self, url: impl Into<String>) -> Self {
        self.failures.insert(url.into());
        self
    }

    /// Delay every request, so concurrent requests actually overlap.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Total number of listing requests.
    pub fn list_calls(&self) -> usize {
        self.lock_calls().values().sum()
    }

    /// Number of listing requests made against `url`.
    pub fn list_calls_for(&self, url: &str) -> usize {
        self.lock_calls().get(url).copied().unwrap_or(0)
    }

    /// Highest number of downloads observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn events(&self) -> Vec<MockEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, HashMap<String, usize>> {
        self.list_calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, event: MockEvent) {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).push(event);
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl RemoteBackend for MockRemote {
    async fn list(&self, url: &str) -> Result<Vec<u8>> {
        *self.lock_calls().entry(url.to_string()).or_default() += 1;
        self.record(MockEvent::Listed(url.to_string()));
        self.delay().await;
        match self.listings.get(url) {
            Some((status, body)) if (200..300).contains(status) => Ok(body.clone()),
            Some((status, body)) => match serde_json::from_slice::<serde_json::Value>(body) {
                Ok(value) if value.get("message").is_some_and(|m| m.is_string()) => {
                    let message = value["message"].as_str().unwrap_or_default().to_string();
                    exn::bail!(ErrorKind::RemoteError(message))
                },
                _ => exn::bail!(ErrorKind::Status { status: *status, url: url.to_string() }),
            },
            None => exn::bail!(ErrorKind::Status { status: 404, url: url.to_string() }),
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.record(MockEvent::DownloadStarted(url.to_string()));
        self.delay().await;
        let result = if self.failures.contains(url) {
            Err(ErrorKind::Status { status: 500, url: url.to_string() })
        } else {
            self.files
                .get(url)
                .cloned()
                .ok_or_else(|| ErrorKind::Status { status: 404, url: url.to_string() })
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.record(MockEvent::DownloadFinished(url.to_string()));
        Ok(result?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counts_listings() {
        let remote = MockRemote::default().with_tree("mock://root", &[], &["1.png"]);
        remote.list("mock://root").await.unwrap();
        remote.list("mock://root").await.unwrap();
        assert!(remote.list("mock://other").await.is_err());
        assert_eq!(remote.list_calls(), 3);
        assert_eq!(remote.list_calls_for("mock://root"), 2);
    }

    #[tokio::test]
    async fn test_error_listing_surfaces_message() {
        let remote = MockRemote::default().with_raw_listing("mock://root", 403, r#"{"message": "rate limited"}"#);
        let err = remote.list("mock://root").await.unwrap_err();
        assert_eq!(*err, ErrorKind::RemoteError("rate limited".to_string()));
    }

    #[tokio::test]
    async fn test_download_failure() {
        let remote = MockRemote::default().with_file("mock://a", b"data".to_vec()).with_failure("mock://b");
        assert_eq!(remote.download("mock://a").await.unwrap(), b"data");
        let err = remote.download("mock://b").await.unwrap_err();
        assert!(matches!(*err, ErrorKind::Status { status: 500, .. }));
        assert_eq!(remote.max_in_flight(), 1);
        assert_eq!(remote.events().len(), 4);
    }
}
