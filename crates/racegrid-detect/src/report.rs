//! Race reports and per-run deduplication.

use racegrid_model::{ActionRef, Address, Clock, FrameAddr, ThreadId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Innermost backtrace frames that belong to the detector's own call path
/// and are skipped when hashing/comparing reports, so the same source
/// location deduplicates regardless of runtime call depth.
pub const DETECTOR_FRAME_SKIP: usize = 2;

/// Default bound on captured backtrace depth.
pub const MAX_BACKTRACE_FRAMES: usize = 64;

/// A confirmed conflict between two causally unordered accesses to the
/// same byte.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataRace {
    /// Thread of the older (recorded) access.
    pub old_thread: ThreadId,
    /// Clock of the older access.
    pub old_clock: Clock,
    /// Whether the older access was a write.
    pub is_old_write: bool,
    /// The action performing the newer access.
    pub new_action: ActionRef,
    /// Whether the newer access is a write.
    pub is_new_write: bool,
    /// The raced-on byte address.
    pub address: Address,
    /// Call stack of the newer access, innermost first.
    pub backtrace: Vec<FrameAddr>,
    /// Shortest causal path between the two accesses in the relations
    /// graph, when the execution engine exposes one. `None` also covers
    /// "no path recorded".
    pub graph_distance: Option<usize>,
}

impl DataRace {
    fn kind(is_write: bool) -> &'static str {
        if is_write {
            "write"
        } else {
            "read"
        }
    }
}

impl fmt::Display for DataRace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Data race detected @ address {:#x}:", self.address)?;
        writeln!(
            f,
            "    Access 1: {:>5} in thread {:>2} @ clock {:>3}",
            Self::kind(self.is_old_write),
            self.old_thread,
            self.old_clock,
        )?;
        write!(
            f,
            "    Access 2: {:>5} in thread {:>2} @ clock {:>3}",
            Self::kind(self.is_new_write),
            self.new_action.thread,
            self.new_action.seq,
        )?;
        if let Some(distance) = self.graph_distance {
            write!(f, "\n    Distance between racy accesses: {}", distance)?;
        }
        Ok(())
    }
}

/// Set of already-reported races, keyed by call-stack shape.
///
/// Two reports are the same static race when their backtraces agree frame
/// for frame after the detector's own [`DETECTOR_FRAME_SKIP`] innermost
/// frames are dropped.
#[derive(Debug, Default)]
pub struct RaceSet {
    seen: HashSet<Vec<FrameAddr>>,
}

impl RaceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `race`. Returns `true` the first time this stack shape is
    /// seen (the report should be surfaced) and `false` for a duplicate.
    pub fn add(&mut self, race: &DataRace) -> bool {
        let key: Vec<FrameAddr> = race
            .backtrace
            .iter()
            .skip(DETECTOR_FRAME_SKIP)
            .copied()
            .collect();
        self.seen.insert(key)
    }

    /// Number of distinct races reported so far.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Forget all reported races (fresh run).
    pub fn clear(&mut self) {
        self.seen.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn race_with_backtrace(frames: Vec<FrameAddr>) -> DataRace {
        DataRace {
            old_thread: ThreadId(1),
            old_clock: 1,
            is_old_write: true,
            new_action: ActionRef::new(ThreadId(2), 5),
            is_new_write: true,
            address: 0x1000,
            backtrace: frames,
            graph_distance: None,
        }
    }

    #[test]
    fn first_report_is_new_second_is_duplicate() {
        let mut set = RaceSet::new();
        let race = race_with_backtrace(vec![1, 2, 10, 11]);
        assert!(set.add(&race));
        assert!(!set.add(&race));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn detector_frames_are_ignored() {
        let mut set = RaceSet::new();
        // Same program stack, different detector entry frames.
        assert!(set.add(&race_with_backtrace(vec![100, 101, 10, 11])));
        assert!(!set.add(&race_with_backtrace(vec![200, 201, 10, 11])));
    }

    #[test]
    fn differing_program_frames_are_distinct() {
        let mut set = RaceSet::new();
        assert!(set.add(&race_with_backtrace(vec![1, 2, 10, 11])));
        assert!(set.add(&race_with_backtrace(vec![1, 2, 10, 12])));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn differing_stack_depth_is_distinct() {
        let mut set = RaceSet::new();
        assert!(set.add(&race_with_backtrace(vec![1, 2, 10, 11])));
        assert!(set.add(&race_with_backtrace(vec![1, 2, 10, 11, 12])));
    }

    #[test]
    fn clear_forgets_reports() {
        let mut set = RaceSet::new();
        let race = race_with_backtrace(vec![1, 2, 10]);
        assert!(set.add(&race));
        set.clear();
        assert!(set.is_empty());
        assert!(set.add(&race));
    }

    #[test]
    fn display_formats_both_accesses() {
        let mut race = race_with_backtrace(vec![]);
        race.is_old_write = false;
        race.graph_distance = Some(3);
        let text = race.to_string();
        assert!(text.contains("Data race detected @ address 0x1000"));
        assert!(text.contains("Access 1:  read in thread  1 @ clock   1"));
        assert!(text.contains("Access 2: write in thread  2 @ clock   5"));
        assert!(text.contains("Distance between racy accesses: 3"));
    }

    #[test]
    fn serializes_to_json_and_back() {
        let race = race_with_backtrace(vec![1, 2, 3]);
        let json = serde_json::to_string(&race).unwrap();
        let back: DataRace = serde_json::from_str(&json).unwrap();
        assert_eq!(back.old_thread, race.old_thread);
        assert_eq!(back.new_action, race.new_action);
        assert_eq!(back.backtrace, race.backtrace);
        assert_eq!(back.address, race.address);
    }
}
