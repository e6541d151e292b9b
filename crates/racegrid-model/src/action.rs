//! References to actions committed to the current execution.

use crate::thread::ThreadId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A reference to a program action the execution engine has already
/// committed (a load, store, fence, thread operation, ...).
///
/// The engine assigns every action a sequence number that is unique within
/// the execution, so `(thread, seq)` identifies the action. The detector
/// never dereferences an `ActionRef`; it only attributes findings to it
/// and uses it as a node key in the
/// [`RelationsGraph`](crate::relations::RelationsGraph).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ActionRef {
    /// Thread that performed the action.
    pub thread: ThreadId,
    /// Execution-wide sequence number of the action.
    pub seq: u64,
}

impl ActionRef {
    pub fn new(thread: ThreadId, seq: u64) -> Self {
        Self { thread, seq }
    }
}

impl fmt::Display for ActionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}#{}", self.thread, self.seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_ref_identity() {
        let a = ActionRef::new(ThreadId(1), 10);
        let b = ActionRef::new(ThreadId(1), 10);
        let c = ActionRef::new(ThreadId(2), 10);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn action_ref_display() {
        assert_eq!(ActionRef::new(ThreadId(3), 42).to_string(), "t3#42");
    }
}
