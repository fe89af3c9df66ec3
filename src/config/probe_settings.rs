//! Probe tuning parsed from environment variables.
//!
//! Every value has a default; a value that is present but unparsable is a
//! configuration error rather than being silently replaced.

use crate::domain::errors::ProbeError;
use std::str::FromStr;
use std::time::Duration;

pub const POLL_INTERVAL_MS: &str = "HEALTHCHECK_POLL_INTERVAL_MS";
pub const MAX_ATTEMPTS: &str = "HEALTHCHECK_MAX_ATTEMPTS";
pub const MAX_DURATION_SECS: &str = "HEALTHCHECK_MAX_DURATION_SECS";
pub const HTTP_TIMEOUT_SECS: &str = "HEALTHCHECK_HTTP_TIMEOUT_SECS";
pub const CONNECT_TIMEOUT_SECS: &str = "HEALTHCHECK_CONNECT_TIMEOUT_SECS";
pub const SEND_SESSION_EVENT: &str = "HEALTHCHECK_SEND_SESSION_EVENT";

/// Poll bounds, network timeouts and optional behavior of a probe run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSettings {
    pub poll_interval: Duration,
    pub max_attempts: u32,
    pub max_duration: Duration,
    pub http_timeout: Duration,
    pub connect_timeout: Duration,
    pub send_session_event: bool,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            max_attempts: 300,
            max_duration: Duration::from_secs(300),
            http_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            send_session_event: true,
        }
    }
}

impl ProbeSettings {
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ProbeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let settings = Self {
            poll_interval: Duration::from_millis(parse_or(
                &lookup,
                POLL_INTERVAL_MS,
                defaults.poll_interval.as_millis() as u64,
            )?),
            max_attempts: parse_or(&lookup, MAX_ATTEMPTS, defaults.max_attempts)?,
            max_duration: Duration::from_secs(parse_or(
                &lookup,
                MAX_DURATION_SECS,
                defaults.max_duration.as_secs(),
            )?),
            http_timeout: Duration::from_secs(parse_or(
                &lookup,
                HTTP_TIMEOUT_SECS,
                defaults.http_timeout.as_secs(),
            )?),
            connect_timeout: Duration::from_secs(parse_or(
                &lookup,
                CONNECT_TIMEOUT_SECS,
                defaults.connect_timeout.as_secs(),
            )?),
            send_session_event: parse_or(&lookup, SEND_SESSION_EVENT, defaults.send_session_event)?,
        };

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ProbeError> {
        if self.max_attempts == 0 {
            return Err(ProbeError::configuration(format!(
                "{} must be at least 1",
                MAX_ATTEMPTS
            )));
        }
        if self.max_duration.is_zero() {
            return Err(ProbeError::configuration(format!(
                "{} must be greater than 0",
                MAX_DURATION_SECS
            )));
        }
        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ProbeError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw.trim().parse::<T>().map_err(|e| {
            ProbeError::configuration(format!("Failed to parse {}={:?}: {}", key, raw, e))
        }),
        _ => Ok(default),
    }
}
