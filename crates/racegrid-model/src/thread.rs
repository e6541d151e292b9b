//! Thread identity and logical time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a thread in the analyzed program.
///
/// Thread ids are assigned densely by the execution engine, starting at 0.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ThreadId(pub u32);

impl ThreadId {
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A logical clock value.
///
/// Clock 0 is reserved for "no recorded access"; the engine starts real
/// clocks at 1.
pub type Clock = u32;

/// A byte address in the analyzed program's memory.
pub type Address = u64;

/// A return address captured from the instrumentation call stack.
pub type FrameAddr = u64;
