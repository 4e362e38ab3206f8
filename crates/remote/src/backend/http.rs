//! HTTP transport backed by [`reqwest`].

use crate::RemoteBackend;
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

const API_ACCEPT: &str = "application/vnd.github+json";
const API_VERSION_HEADER: &str = "X-GitHub-Api-Version";
const API_VERSION: &str = "2022-11-28";

/// Knobs for the HTTP client.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub user_agent: String,
    /// Bearer token sent with tree listings only.
    pub token: Option<String>,
    pub timeout: Duration,
}
impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            user_agent: concat!("spritesync/", env!("CARGO_PKG_VERSION")).to_string(),
            token: None,
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// [`RemoteBackend`] talking to a real server.
///
/// The inner [`Client`] is cheap to clone and pools connections, so a single
/// backend is shared by every task in a run.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    api_headers: HeaderMap,
}
impl HttpBackend {
    pub fn new(options: HttpOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(options.user_agent)
            .timeout(options.timeout)
            .build()
            .or_raise(|| ErrorKind::Client("could not build HTTP client".to_string()))?;

        let mut api_headers = HeaderMap::new();
        api_headers.insert(ACCEPT, HeaderValue::from_static(API_ACCEPT));
        api_headers.insert(API_VERSION_HEADER, HeaderValue::from_static(API_VERSION));
        if let Some(token) = options.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .or_raise(|| ErrorKind::Client("token is not a valid header value".to_string()))?;
            value.set_sensitive(true);
            api_headers.insert(AUTHORIZATION, value);
        }
        Ok(Self { client, api_headers })
    }

    async fn send(request: RequestBuilder, url: &str) -> Result<(u16, Vec<u8>)> {
        let response = request.send().await.map_err(|e| ErrorKind::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| ErrorKind::Network(format!("{url}: {e}")))?;
        Ok((status, body.to_vec()))
    }
}

#[async_trait]
impl RemoteBackend for HttpBackend {
    #[instrument(skip(self))]
    async fn list(&self, url: &str) -> Result<Vec<u8>> {
        let request = self.client.get(url).headers(self.api_headers.clone());
        let (status, body) = Self::send(request, url).await?;
        if (200..300).contains(&status) {
            return Ok(body);
        }
        match serde_json::from_slice::<ErrorBody>(&body) {
            Ok(ErrorBody { message }) => exn::bail!(ErrorKind::RemoteError(message)),
            Err(_) => exn::bail!(ErrorKind::Status { status, url: url.to_string() }),
        }
    }

    #[instrument(skip(self))]
    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let (status, body) = Self::send(self.client.get(url), url).await?;
        if !(200..300).contains(&status) {
            exn::bail!(ErrorKind::Status { status, url: url.to_string() });
        }
        tracing::trace!(bytes = body.len(), "Downloaded");
        Ok(body)
    }
}
