pub mod errors;
pub mod events;
pub mod identifier;
pub mod ports;
pub mod signature;

pub use errors::{ProbeError, ProbeStage};
pub use events::{SignedPayload, TestSessionEvent};
pub use identifier::ProbeIdentifier;
pub use signature::sign;
