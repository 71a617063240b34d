//! The UI-affinity execution context.
//!
//! Stages run on worker tasks, but everything the operator can observe
//! (animations, printing dialogs) and the final delivery are marshalled onto a
//! single loop task through a [`UiHandle`].

mod dispatcher;
mod handle;

pub use dispatcher::{create_ui_dispatcher, UiLoop};
pub use handle::{UiClosed, UiCommand, UiHandle};
