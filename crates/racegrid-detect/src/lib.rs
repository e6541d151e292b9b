//! Shadow-memory data-race detection for the racegrid analysis engine.
//!
//! The execution engine replays one schedule of the analyzed program at a
//! time and calls a [`RaceDetector`] entry point for every load and store
//! the program performs. For each byte touched, the detector keeps a
//! per-byte access history and flags any new access that is causally
//! unordered with a recorded conflicting access.
//!
//! # Architecture
//!
//! ```text
//! instrumented access            RaceDetector
//! ───────────────────            ────────────
//! store_u32(t, addr)   ──▶  ShadowTable::slot_mut(addr)
//!                                │
//!                                ▼
//!                      CompactRecord fast path ──(overflow)──▶ ExpandedRecord
//!                                │
//!                                ▼
//!                      conflict test vs. Execution::clock_vector(t)
//!                                │
//!                                ▼
//!                      RaceSet dedup ──▶ DataRace (+ causal distance)
//! ```
//!
//! # Module Structure
//!
//! - [`codec`] — bit-packed compact shadow records and their field limits
//! - [`record`] — expanded records for histories the compact form cannot hold
//! - [`table`] — the sparse per-byte shadow table and its page arena
//! - [`detector`] — the race-check entry points and re-entrancy guard
//! - [`report`] — race reports and per-run stack-shape deduplication
//!
//! # Example
//!
//! ```
//! use racegrid_detect::RaceDetector;
//! use racegrid_model::{ActionRef, Clock, ClockVector, Execution, FrameAddr, ThreadId};
//!
//! struct Clocks(Vec<Clock>);
//!
//! impl ClockVector for Clocks {
//!     fn clock(&self, thread: ThreadId) -> Clock {
//!         self.0.get(thread.as_u32() as usize).copied().unwrap_or(0)
//!     }
//! }
//!
//! struct Engine {
//!     clocks: Vec<Clocks>,
//! }
//!
//! impl Execution for Engine {
//!     fn clock_vector(&self, thread: ThreadId) -> Option<&dyn ClockVector> {
//!         self.clocks.get(thread.as_u32() as usize).map(|cv| cv as &dyn ClockVector)
//!     }
//!     fn parent_action(&self, thread: ThreadId) -> ActionRef {
//!         ActionRef::new(thread, 1)
//!     }
//!     fn last_action(&self, thread: ThreadId) -> ActionRef {
//!         ActionRef::new(thread, 1)
//!     }
//!     fn capture_backtrace(&self, _max_frames: usize) -> Vec<FrameAddr> {
//!         vec![0, 0, 1]
//!     }
//! }
//!
//! // Two threads, neither aware of the other's progress.
//! let engine = Engine {
//!     clocks: vec![Clocks(vec![1, 0]), Clocks(vec![0, 1])],
//! };
//!
//! let mut detector = RaceDetector::default();
//! detector.store_u8(&engine, ThreadId(0), 0x1000);
//! detector.store_u8(&engine, ThreadId(1), 0x1000);
//!
//! assert_eq!(detector.races().len(), 1);
//! ```

pub mod codec;
pub mod detector;
pub mod record;
pub mod report;
pub mod table;

pub use codec::{CompactRecord, MAX_COMPACT_CLOCK, MAX_COMPACT_THREAD};
pub use detector::{AccessCounters, DetectorConfig, RaceDetector};
pub use record::{ExpandedRecord, ReadEntry, INITIAL_READER_CAPACITY};
pub use report::{DataRace, RaceSet, DETECTOR_FRAME_SKIP, MAX_BACKTRACE_FRAMES};
pub use table::{ShadowSlot, ShadowTable, PAGE_SLOTS};
