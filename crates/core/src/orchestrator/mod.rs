//! Result orchestrator for post-transaction finalization.
//!
//! The orchestrator turns each host outcome into exactly one delivery:
//! - **Failure outcomes**: delivered immediately, nothing else happens
//! - **Approved outcomes**: one session at a time, animation and printing run
//!   concurrently, delivery once both are done
//! - **Busy**: a second approved outcome is rejected while a session is active

mod config;
mod runner;
pub mod session;
mod types;

pub use config::OrchestratorConfig;
pub use runner::ResultOrchestrator;
pub use session::{join_ready, JoinStatus, ProcessingSession};
pub use types::{
    Admission, OrchestratorCounters, OrchestratorError, OrchestratorPhase, OrchestratorStatus,
    SessionId, StageCompletion, StageEvent,
};
