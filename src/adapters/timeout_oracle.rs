//! Deadline guard for oracle calls.
//!
//! Each call runs on a helper thread; the caller waits on a channel for at
//! most `timeout`. An overrunning call is abandoned and keeps its thread until
//! the inner oracle returns. Calls never overlap: while an abandoned call is
//! still running, later calls fail immediately instead of starting another.

use crate::domain::error::SigtraderError;
use crate::domain::signal::DecisionPayload;
use crate::ports::oracle_port::DecisionOracle;
use chrono::NaiveDate;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::warn;

pub struct TimeoutOracle {
    inner: Arc<dyn DecisionOracle + Send + Sync>,
    timeout: Duration,
    in_flight: Mutex<Option<JoinHandle<()>>>,
}

impl TimeoutOracle {
    pub fn new(inner: Arc<dyn DecisionOracle + Send + Sync>, timeout: Duration) -> Self {
        Self {
            inner,
            timeout,
            in_flight: Mutex::new(None),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl DecisionOracle for TimeoutOracle {
    fn decide(&self, symbol: &str, date: NaiveDate) -> Result<DecisionPayload, SigtraderError> {
        // held for the whole call so concurrent callers queue up here
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);

        if in_flight.as_ref().is_some_and(|h| !h.is_finished()) {
            warn!(%date, "previous oracle call still running, skipping");
            return Err(SigtraderError::oracle(format!(
                "previous oracle call still running, no decision for {} on {}",
                symbol, date
            )));
        }

        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        let owned_symbol = symbol.to_string();

        let handle = thread::Builder::new()
            .name("oracle-call".into())
            .spawn(move || {
                // receiver may be gone after a timeout
                let _ = tx.send(inner.decide(&owned_symbol, date));
            })
            .map_err(|e| SigtraderError::oracle(format!("failed to spawn oracle call: {}", e)))?;

        match rx.recv_timeout(self.timeout) {
            Err(RecvTimeoutError::Timeout) => {
                *in_flight = Some(handle);
                Err(SigtraderError::oracle(format!(
                    "no decision for {} on {} within {:?}",
                    symbol, date, self.timeout
                )))
            }
            received => {
                // the worker has replied or died, reap it
                let _ = handle.join();
                *in_flight = None;
                received.unwrap_or_else(|_| {
                    Err(SigtraderError::oracle(format!(
                        "oracle call for {} on {} panicked",
                        symbol, date
                    )))
                })
            }
        }
    }
}
