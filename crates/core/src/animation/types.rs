//! Types for the animation stage.

use std::fmt;

/// Identifies one `start` of the animation stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimationHandle(pub(crate) u64);

impl fmt::Display for AnimationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How an animation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationEnd {
    /// The full duration elapsed.
    Elapsed,
    /// Cut short by `cancel` or `force_complete`.
    Cancelled,
    /// Replaced by a newer `start` or dropped by `reset`. No completion event is sent.
    Discarded,
}

/// Completion event sent to the stage listener, once per completed `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationEvent {
    pub handle: AnimationHandle,
    pub end: AnimationEnd,
}
