//! The simulated live consultation.
//!
//! [`state`] holds the pure state machine, [`script`] the narration lines and
//! [`controller`] the async driver that owns timers, history and events.

pub mod controller;
pub mod script;
pub mod state;

use thiserror::Error;

pub use controller::{EndReason, SessionController, SessionEvent, SessionSnapshot, SessionSummary};
pub use script::Script;
pub use state::{format_clock, ConnectionPhase, SessionState, TickOutcome};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Please login to start a consultation.")]
    NotAuthenticated,
    #[error("a session is already active")]
    AlreadyActive,
    #[error("no active session")]
    NotActive,
    #[error("failed to provision agent session")]
    Provisioning(#[source] anyhow::Error),
}
