//! Fetcher test double that blocks each fetch until the test opens the gate.

use std::io::Write;
use std::sync::{Condvar, Mutex};
use std::time::Duration;

use linkpack_core::fetch::{FetchError, Fetcher};

#[derive(Default)]
struct GateState {
    permits: usize,
    active: usize,
    max_active: usize,
    started: Vec<String>,
}

/// Each fetch records itself as started, then waits for one permit from `release`.
#[derive(Default)]
pub struct GatedFetcher {
    state: Mutex<GateState>,
    cond: Condvar,
}

impl GatedFetcher {
    /// Let `n` blocked (or future) fetches proceed.
    pub fn release(&self, n: usize) {
        self.state.lock().unwrap().permits += n;
        self.cond.notify_all();
    }

    pub fn started(&self) -> Vec<String> {
        self.state.lock().unwrap().started.clone()
    }

    /// Highest number of fetches observed in flight at once.
    pub fn max_active(&self) -> usize {
        self.state.lock().unwrap().max_active
    }

    /// Poll until at least `n` fetches have started, or panic after `timeout`.
    pub async fn wait_started(&self, n: usize, timeout: Duration) {
        tokio::time::timeout(timeout, async {
            while self.started().len() < n {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("expected {} fetches to start, saw {:?}", n, self.started()));
    }
}

impl Fetcher for GatedFetcher {
    fn fetch(&self, url: &str, sink: &mut dyn Write) -> Result<u64, FetchError> {
        let mut state = self.state.lock().unwrap();
        state.started.push(url.to_string());
        state.active += 1;
        state.max_active = state.max_active.max(state.active);
        while state.permits == 0 {
            state = self.cond.wait(state).unwrap();
        }
        state.permits -= 1;
        state.active -= 1;
        drop(state);

        sink.write_all(url.as_bytes()).map_err(FetchError::Sink)?;
        Ok(url.len() as u64)
    }
}
