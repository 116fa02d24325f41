//! Simulated image network
//!
//! Resolves image sources against the page URL and decides, per URL,
//! how long a fetch takes and whether it succeeds. There is no real I/O.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Image request identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub(crate) u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request-{}", self.0)
    }
}

/// Result delivered when an image fetch settles
pub type FetchOutcome = Result<Url, FetchError>;

/// Fetch error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Empty image source")]
    EmptySource,

    #[error("Invalid URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Image not found: {0}")]
    NotFound(Url),
}

/// Per-URL fetch behavior
#[derive(Debug, Clone)]
pub struct ImageNetwork {
    base: Url,
    default_latency: Duration,
    latencies: HashMap<Url, Duration>,
    missing: HashSet<Url>,
}

impl ImageNetwork {
    pub fn new(base: Url, default_latency: Duration) -> Self {
        Self {
            base,
            default_latency,
            latencies: HashMap::new(),
            missing: HashSet::new(),
        }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Resolve a (possibly relative) `src` against the page URL
    pub fn resolve(&self, src: &str) -> Result<Url, FetchError> {
        let src = src.trim();
        if src.is_empty() {
            return Err(FetchError::EmptySource);
        }
        self.base.join(src).map_err(|source| FetchError::InvalidUrl {
            url: src.to_string(),
            source,
        })
    }

    /// Make fetches of `src` fail with `NotFound`
    pub fn mark_missing(&mut self, src: &str) -> Result<(), FetchError> {
        let url = self.resolve(src)?;
        self.missing.insert(url);
        Ok(())
    }

    /// Override the latency for one image
    pub fn set_latency(&mut self, src: &str, latency: Duration) -> Result<(), FetchError> {
        let url = self.resolve(src)?;
        self.latencies.insert(url, latency);
        Ok(())
    }

    /// How long a fetch of `src` takes and how it ends.
    /// Sources that cannot be resolved fail without latency.
    pub fn request(&self, src: &str) -> (Duration, FetchOutcome) {
        let url = match self.resolve(src) {
            Ok(url) => url,
            Err(e) => return (Duration::ZERO, Err(e)),
        };
        let latency = self.latencies.get(&url).copied().unwrap_or(self.default_latency);
        if self.missing.contains(&url) {
            (latency, Err(FetchError::NotFound(url)))
        } else {
            (latency, Ok(url))
        }
    }
}
