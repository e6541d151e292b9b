//! Shared execution-model types for the racegrid race detection engine.
//!
//! The detector in `racegrid-detect` is driven by an external execution
//! engine that replays one schedule of the analyzed program at a time.
//! This crate holds the vocabulary both sides agree on:
//!
//! - [`ThreadId`], [`Clock`], [`Address`] — identity of threads, logical
//!   time, and analyzed-program memory locations.
//! - [`ActionRef`] — a reference to an action already committed to the
//!   execution, used to attribute findings.
//! - [`ClockVector`] and [`Execution`] — the consumed interface to the
//!   engine: per-thread clock vectors, action attribution, and backtrace
//!   capture. The engine implements these; this workspace only calls them.
//! - [`RelationsGraph`] — the happens-before relations graph used to
//!   explain a detected race after the fact.
//!
//! ```text
//! execution engine ──implements──▶ Execution / ClockVector
//!        │                              ▲
//!        │ owns                         │ consults
//!        ▼                              │
//!  RelationsGraph ◀──queries── racegrid-detect::RaceDetector
//! ```

pub mod action;
pub mod execution;
pub mod relations;
pub mod thread;

pub use action::ActionRef;
pub use execution::{ClockVector, Execution};
pub use relations::{RelationEdge, RelationKind, RelationPath, RelationsGraph};
pub use thread::{Address, Clock, FrameAddr, ThreadId};
