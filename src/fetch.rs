//! Blocking retrieval of remote binding data and images.

use crate::config::FetchConfig;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::RwLock;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("`{url}` answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("no resource registered for `{0}`")]
    NotFound(String),

    #[error("remote fetching is disabled (`{0}`)")]
    Offline(String),
}

/// What is being fetched; selects the timeouts applied
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FetchKind {
    Json,
    Image,
}

/// Retrieves the body of a URL. Implementations must bound how long a
/// request may block; callers degrade every error to an empty result.
pub trait Fetcher: Send + Sync + Debug {
    fn fetch(&self, url: &str, kind: FetchKind) -> Result<Vec<u8>, FetchError>;
}

/// HTTP(S) fetcher with separate connect/read timeouts for JSON and images
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    json: reqwest::blocking::Client,
    image: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<HttpFetcher, FetchError> {
        let client = |(connect, read): (Duration, Duration)| {
            reqwest::blocking::Client::builder()
                .connect_timeout(connect)
                .timeout(read)
                .build()
        };
        Ok(HttpFetcher {
            json: client(config.json_timeouts())?,
            image: client(config.image_timeouts())?,
        })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, kind: FetchKind) -> Result<Vec<u8>, FetchError> {
        let client = match kind {
            FetchKind::Json => &self.json,
            FetchKind::Image => &self.image,
        };
        log::debug!("fetching {kind:?} from {url}");
        let response = client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.bytes()?.to_vec())
    }
}

/// Serves pre-registered bodies; anything else is [FetchError::NotFound]
#[derive(Debug, Default)]
pub struct InMemoryFetcher {
    responses: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<S: Into<String>, B: Into<Vec<u8>>>(&self, url: S, body: B) {
        if let Ok(mut responses) = self.responses.write() {
            responses.insert(url.into(), body.into());
        }
    }
}

impl Fetcher for InMemoryFetcher {
    fn fetch(&self, url: &str, _kind: FetchKind) -> Result<Vec<u8>, FetchError> {
        self.responses
            .read()
            .ok()
            .and_then(|responses| responses.get(url).cloned())
            .ok_or_else(|| FetchError::NotFound(url.to_string()))
    }
}

/// Refuses every request, for fully offline generation
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineFetcher;

impl Fetcher for OfflineFetcher {
    fn fetch(&self, url: &str, _kind: FetchKind) -> Result<Vec<u8>, FetchError> {
        Err(FetchError::Offline(url.to_string()))
    }
}
