//! Receipt printing stage.
//!
//! Workflow per outcome:
//!
//! ```text
//! Idle -> Checking -> Done(NotRequired)
//!                  -> AwaitingConfirmation -> Done(Declined)
//!                                          -> Printing -> Done(Printed)
//!                                                      -> Error -> Printing (retry)
//!                                                               -> Done(Abandoned | Failed)
//! ```
//!
//! Print failures never escape the stage as errors. The caller only sees a
//! [`PrintingResolution`], or a [`PrintingError`] when the request itself was
//! rejected (stage or printer already busy).

mod config;
mod stage;
mod types;

pub use config::PrintingConfig;
pub use stage::{PrintingRun, PrintingStage};
pub use types::{PrintingError, PrintingResolution, PrintingState};
