//! Client-side controllers for the sandbox lab page: instance lifecycle,
//! challenge completion tracking and the polling that keeps both in sync.

pub mod api;
pub mod challenges;
pub mod config;
pub mod error;
pub mod instance;
pub mod polling;
pub mod session;
pub mod types;
pub mod view;

pub use api::{HttpLabApi, LabApi, Verification};
pub use challenges::{completion_score, ChallengeController, MAX_SCORE};
pub use config::{PollingPolicy, SessionConfig};
pub use error::ClientError;
pub use instance::{InstanceController, OpenOutcome};
pub use session::LabSession;
pub use types::InstanceRecord;
pub use view::{Navigator, View, ViewProjector};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
