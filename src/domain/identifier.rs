//! Probe identifiers.
//!
//! An identifier doubles as the row key the pipeline writes, so it is built
//! only from ASCII alphanumerics: nothing along the way may escape or
//! sanitize it before it lands in the table.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};

const PREFIX: &str = "healthcheckX";
const SUFFIX: &str = "X";

/// Number of 100ns ticks between 0001-01-01 and the Unix epoch
const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;

static LAST_TICKS: AtomicI64 = AtomicI64::new(0);

/// Unique, escape-free key identifying one probe event
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProbeIdentifier(String);

impl ProbeIdentifier {
    /// Generate a fresh identifier from the current time.
    ///
    /// Ticks are 100ns intervals since 0001-01-01 UTC. Successive calls in the
    /// same process always yield strictly increasing tick values, even when the
    /// wall clock is coarse or steps backwards.
    pub fn generate() -> Self {
        let now = current_ticks();
        let mut last = LAST_TICKS.load(Ordering::Relaxed);
        let ticks = loop {
            let next = now.max(last + 1);
            match LAST_TICKS.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => break next,
                Err(observed) => last = observed,
            }
        };

        Self::from_ticks(ticks)
    }

    pub fn from_ticks(ticks: i64) -> Self {
        Self(format!("{}{}{}", PREFIX, ticks, SUFFIX))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProbeIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProbeIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn current_ticks() -> i64 {
    let now = Utc::now();
    let nanos = now.timestamp_subsec_nanos() as i64;
    UNIX_EPOCH_TICKS + now.timestamp() * 10_000_000 + nanos / 100
}
