//! JSON bodies posted to the ingestion endpoint.

use crate::domain::identifier::ProbeIdentifier;
use crate::domain::signature::sign;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Test user every synthetic session is attributed to
pub const TEST_USER_ID: Uuid = Uuid::from_u128(0x9c8f_3b2e_5a1d_4e67_8b0c_2d4f_6a8e_1b3c);

/// Tracking path of the fixed test product the session event is recorded under
pub const TEST_SESSION_EVENT_PATH: &str = "/track/v1/WithRegard/Test/event";

/// Probe event: the row key the pipeline should write, signed with the shared secret
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedPayload {
    pub rowkey: ProbeIdentifier,
    pub rowkeysignature: String,
}

impl SignedPayload {
    pub fn new(rowkey: ProbeIdentifier, shared_secret: &str) -> Self {
        let rowkeysignature = sign(rowkey.as_str(), shared_secret);
        Self {
            rowkey,
            rowkeysignature,
        }
    }
}

/// Synthetic session-start event for the test account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSessionEvent {
    #[serde(rename = "new-session")]
    pub new_session: bool,
    #[serde(rename = "session-id")]
    pub session_id: Uuid,
    #[serde(rename = "user-id")]
    pub user_id: Uuid,
    #[serde(rename = "is-a")]
    pub is_a: String,
    #[serde(rename = "healthcheck-id")]
    pub healthcheck_id: ProbeIdentifier,
}

impl TestSessionEvent {
    pub fn new(healthcheck_id: ProbeIdentifier) -> Self {
        Self {
            new_session: true,
            session_id: Uuid::new_v4(),
            user_id: TEST_USER_ID,
            is_a: "HealthCheck".to_string(),
            healthcheck_id,
        }
    }
}
