//! Outbound fetch collaborator.
//!
//! A `Fetcher` streams one link's response body into a caller-supplied sink.
//! Fetches are blocking and never retried; the archive builder runs them on a
//! blocking thread so a slow link only stalls its own build.

mod curl_get;

pub use curl_get::CurlFetcher;

use std::io::Write;

/// Why a single fetch produced no usable body.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Connection, DNS, TLS, timeout, or other transport failure.
    #[error("{0}")]
    Transport(String),
    /// Response arrived with a non-2xx status.
    #[error("HTTP {0}")]
    Status(u32),
    /// Writing the body into the sink failed.
    #[error("write body: {0}")]
    Sink(#[source] std::io::Error),
}

/// Fetches a link and writes the full response body to `sink`.
/// Returns the number of body bytes written. A non-2xx status is an error
/// even if a body was written; callers should discard the sink in that case.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str, sink: &mut dyn Write) -> Result<u64, FetchError>;
}
