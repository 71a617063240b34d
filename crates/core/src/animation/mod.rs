//! Result animation stage.
//!
//! Tracks when the success mark shown after a host response has been on
//! screen long enough. Independent of printing and of delivery.

mod config;
mod stage;
mod types;

pub use config::AnimationConfig;
pub use stage::{AnimationStage, AnimationTicket};
pub use types::{AnimationEnd, AnimationEvent, AnimationHandle};
