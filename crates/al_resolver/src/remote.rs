//! Remote actor pack source.

use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use std::time::Duration;

/// Default location of the published actor packs.
pub const DEFAULT_REMOTE_BASE_URL: &str =
    "https://raw.githubusercontent.com/ArchLeaders/ActorLoader/master/src/Data/Actors";

/// Fetches actor packs that are missing from the local cache.
pub trait RemoteSource: Send + Sync {
    /// Return the raw `<name>.sbactorpack` bytes.
    fn fetch(&self, name: &str) -> Result<Vec<u8>>;
}

/// HTTP(S) source: `GET <base_url>/<name>.sbactorpack`.
pub struct HttpSource {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "actor-loader",
            HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
        );

        let client = reqwest::blocking::Client::builder()
            .user_agent(format!(
                "actor-loader/{} (+https://github.com/ArchLeaders/actor-loader)",
                env!("CARGO_PKG_VERSION")
            ))
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn url_for(&self, name: &str) -> String {
        format!("{}/{}.{}", self.base_url, name, al_formats::ACTOR_PACK_EXTENSION)
    }
}

impl RemoteSource for HttpSource {
    fn fetch(&self, name: &str) -> Result<Vec<u8>> {
        let url = self.url_for(name);
        tracing::info!(actor = name, "Downloading {}", url);

        let resp = self.client.get(&url).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Fetch {
                name: name.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(resp.bytes()?.to_vec())
    }
}

impl std::fmt::Debug for HttpSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSource")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
