//! Single-stream HTTP GET via libcurl.

use std::io::Write;
use std::time::Duration;

use super::{FetchError, Fetcher};
use crate::config::FetchConfig;

/// Blocking curl-backed fetcher. One `Easy` handle per fetch; no shared state.
#[derive(Debug, Clone)]
pub struct CurlFetcher {
    cfg: FetchConfig,
}

impl CurlFetcher {
    pub fn new(cfg: FetchConfig) -> Self {
        Self { cfg }
    }
}

impl Default for CurlFetcher {
    fn default() -> Self {
        Self::new(FetchConfig::default())
    }
}

fn transport(e: curl::Error) -> FetchError {
    FetchError::Transport(e.to_string())
}

impl Fetcher for CurlFetcher {
    fn fetch(&self, url: &str, sink: &mut dyn Write) -> Result<u64, FetchError> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url).map_err(transport)?;
        easy.follow_location(true).map_err(transport)?;
        easy.max_redirections(self.cfg.max_redirections)
            .map_err(transport)?;
        easy.connect_timeout(Duration::from_secs(self.cfg.connect_timeout_secs))
            .map_err(transport)?;
        easy.timeout(Duration::from_secs(self.cfg.timeout_secs))
            .map_err(transport)?;

        let mut written = 0u64;
        let mut sink_error: Option<std::io::Error> = None;
        let performed = {
            let mut transfer = easy.transfer();
            transfer
                .write_function(|data| match sink.write_all(data) {
                    Ok(()) => {
                        written += data.len() as u64;
                        Ok(data.len())
                    }
                    Err(e) => {
                        sink_error = Some(e);
                        Ok(0) // abort transfer
                    }
                })
                .map_err(transport)?;
            transfer.perform()
        };

        if let Some(e) = sink_error {
            return Err(FetchError::Sink(e));
        }
        performed.map_err(transport)?;

        let code = easy.response_code().map_err(transport)?;
        if !(200..300).contains(&code) {
            return Err(FetchError::Status(code));
        }
        sink.flush().map_err(FetchError::Sink)?;
        tracing::debug!(url, bytes = written, "fetched");
        Ok(written)
    }
}
