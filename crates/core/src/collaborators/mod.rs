//! Interfaces to the parts of the terminal that live outside the core.
//!
//! The core never renders, formats receipts or talks to hardware. It consumes:
//!
//! - a [`Printer`] with an asynchronous completion,
//! - a [`DecisionProvider`] that asynchronously returns the operator's choices,
//! - a [`Presenter`] for fire-and-forget visual feedback,
//! - a [`DeliverySink`] that accepts each finalized outcome exactly once.

mod error;
mod traits;

pub use error::PrinterError;
pub use traits::{DecisionProvider, DeliverySink, Presenter, Printer};
