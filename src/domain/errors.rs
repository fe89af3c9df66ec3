use std::time::Duration;
use thiserror::Error;

/// Stage of a probe run, used to tag log lines and failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStage {
    Init,
    BaselineQuery,
    Submit,
    Polling,
    SessionEvent,
    Done,
}

impl std::fmt::Display for ProbeStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ProbeStage::Init => "INIT",
            ProbeStage::BaselineQuery => "BASELINE_QUERY",
            ProbeStage::Submit => "SUBMIT",
            ProbeStage::Polling => "POLLING",
            ProbeStage::SessionEvent => "SESSION_EVENT",
            ProbeStage::Done => "DONE",
        };
        f.write_str(name)
    }
}

/// Fatal outcomes of a probe run
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("Transport failure during {stage}: {reason}")]
    Transport { stage: ProbeStage, reason: String },

    #[error("Store unavailable during {stage}: {reason}")]
    StoreUnavailable { stage: ProbeStage, reason: String },

    #[error("Probe {rowkey} timed out after {attempts} attempts ({elapsed:?})")]
    TimedOut {
        rowkey: String,
        attempts: u32,
        elapsed: Duration,
    },
}

impl ProbeError {
    pub fn configuration(reason: impl Into<String>) -> Self {
        ProbeError::Configuration {
            reason: reason.into(),
        }
    }

    /// Wraps an infrastructure error raised while talking to the ingestion endpoint
    pub fn transport(stage: ProbeStage, err: anyhow::Error) -> Self {
        ProbeError::Transport {
            stage,
            reason: format!("{:#}", err),
        }
    }

    /// Wraps an infrastructure error raised by the backing store
    pub fn store(stage: ProbeStage, err: anyhow::Error) -> Self {
        ProbeError::StoreUnavailable {
            stage,
            reason: format!("{:#}", err),
        }
    }

    /// Process exit code for this failure
    pub fn exit_code(&self) -> u8 {
        match self {
            ProbeError::Configuration { .. } => 2,
            ProbeError::Transport { .. } => 3,
            ProbeError::StoreUnavailable { .. } => 4,
            ProbeError::TimedOut { .. } => 5,
        }
    }
}
