//! Task state definitions for tracking a single crawl task
//!
//! A task moves `Queued → Fetching`, then either `Discarded` (the page could not
//! be fetched) or `Extracting → EnqueuingChildren → Done`.
use crate::SpiderError;
use std::fmt;

/// Represents the current state of a crawl task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    // ===== Active States =====
    /// Task is waiting in the FIFO queue
    Queued,

    /// The page is being fetched
    Fetching,

    /// Image and link candidates are being extracted and images downloaded
    Extracting,

    /// Accepted links are being pushed onto the queue
    EnqueuingChildren,

    // ===== Terminal States =====
    /// The task finished normally
    Done,

    /// The page fetch failed; the task contributes nothing
    Discarded,
}

impl TaskState {
    /// Returns true if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Discarded)
    }

    /// Returns true if the move from `self` to `next` is legal
    pub fn can_transition_to(&self, next: TaskState) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Fetching)
                | (Self::Fetching, Self::Extracting)
                | (Self::Fetching, Self::Discarded)
                | (Self::Extracting, Self::EnqueuingChildren)
                | (Self::EnqueuingChildren, Self::Done)
        )
    }

    /// Moves to `next`, rejecting illegal transitions
    pub fn advance(&mut self, next: TaskState) -> crate::Result<()> {
        if !self.can_transition_to(next) {
            return Err(SpiderError::InvalidTransition {
                from: *self,
                to: next,
            });
        }

        tracing::trace!("Task state {} -> {}", self, next);
        *self = next;
        Ok(())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Fetching => "fetching",
            Self::Extracting => "extracting",
            Self::EnqueuingChildren => "enqueuing_children",
            Self::Done => "done",
            Self::Discarded => "discarded",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
