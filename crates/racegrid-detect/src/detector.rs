//! The race-check entry points.
//!
//! The execution engine calls one entry per access the analyzed program
//! performs. Each check resolves the byte's shadow slot, runs the
//! conflict test against the recorded history, updates the history, and
//! surfaces at most one deduplicated [`DataRace`] per conflict site.
//!
//! # Conflict test
//!
//! Given the accessing thread `t1` with clock vector `cv`, and a recorded
//! access by thread `t2` at clock `c2`, the accesses may race iff
//!
//! ```text
//! t1 != t2  &&  c2 != 0  &&  cv.clock(t2) <= c2
//! ```
//!
//! i.e. the new access's causal knowledge of `t2` has not advanced past
//! the recorded access, so no happens-before edge orders them.
//!
//! # Fast paths
//!
//! Every check has a compact-word fast path and a promoted-record path.
//! The width-specialized entries (2/4/8 bytes) additionally exploit
//! alignment: the first byte's check yields the slot's `(old, new)` word
//! pair, and when the whole access falls inside one shadow page each
//! remaining slot that still holds `old` is updated to `new` without
//! re-running the check. This compare-without-lock is sound because the
//! surrounding scheduler replays one access at a time.

use crate::codec::CompactRecord;
use crate::record::{ExpandedRecord, ReadEntry};
use crate::report::{DataRace, RaceSet, MAX_BACKTRACE_FRAMES};
use crate::table::{ShadowSlot, ShadowTable, PAGE_MASK};
use log::{debug, error, info};
use racegrid_model::{ActionRef, Address, Clock, ClockVector, Execution, ThreadId};
use serde::{Deserialize, Serialize};
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════
//  Configuration
// ═══════════════════════════════════════════════════════════════════════

/// Configuration for a [`RaceDetector`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Shadow pages to preallocate arena capacity for.
    pub prealloc_pages: usize,
    /// Bound on captured backtrace depth.
    pub max_backtrace_frames: usize,
    /// When false, conflicts still update history but are never surfaced.
    pub report_races: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            prealloc_pages: 8,
            max_backtrace_frames: MAX_BACKTRACE_FRAMES,
            report_races: true,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Access statistics
// ═══════════════════════════════════════════════════════════════════════

/// Counts of width-specialized accesses checked so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessCounters {
    pub store8: u64,
    pub store16: u64,
    pub store32: u64,
    pub store64: u64,
    pub load8: u64,
    pub load16: u64,
    pub load32: u64,
    pub load64: u64,
}

impl AccessCounters {
    fn record_store(&mut self, width: u64) {
        match width {
            1 => self.store8 += 1,
            2 => self.store16 += 1,
            4 => self.store32 += 1,
            8 => self.store64 += 1,
            _ => {}
        }
    }

    fn record_load(&mut self, width: u64) {
        match width {
            1 => self.load8 += 1,
            2 => self.load16 += 1,
            4 => self.load32 += 1,
            8 => self.load64 += 1,
            _ => {}
        }
    }
}

impl fmt::Display for AccessCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "store  8 count: {}", self.store8)?;
        writeln!(f, "store 16 count: {}", self.store16)?;
        writeln!(f, "store 32 count: {}", self.store32)?;
        writeln!(f, "store 64 count: {}", self.store64)?;
        writeln!(f, "load   8 count: {}", self.load8)?;
        writeln!(f, "load  16 count: {}", self.load16)?;
        writeln!(f, "load  32 count: {}", self.load32)?;
        write!(f, "load  64 count: {}", self.load64)
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Conflict test and check helpers
// ═══════════════════════════════════════════════════════════════════════

/// Whether the access by `t1` (with clock vector `cv`) may race with a
/// recorded access by `t2` at clock `c2`.
fn clock_may_race(cv: &dyn ClockVector, t1: ThreadId, c2: Clock, t2: ThreadId) -> bool {
    t1 != t2 && c2 != 0 && cv.clock(t2) <= c2
}

fn pending_race(
    old_thread: ThreadId,
    old_clock: Clock,
    is_old_write: bool,
    new_action: ActionRef,
    is_new_write: bool,
    address: Address,
) -> DataRace {
    DataRace {
        old_thread,
        old_clock,
        is_old_write,
        new_action,
        is_new_write,
        address,
        backtrace: Vec::new(),
        graph_distance: None,
    }
}

/// Race-check a write against a promoted record: the live readers first,
/// then the last writer. The first conflict found is the one reported;
/// the record's history becomes the new write either way.
fn full_write_check(
    record: &mut ExpandedRecord,
    cv: &dyn ClockVector,
    thread: ThreadId,
    our_clock: Clock,
    new_action: ActionRef,
    address: Address,
) -> Option<DataRace> {
    let mut race = None;

    for reader in &record.readers {
        if clock_may_race(cv, thread, reader.clock, reader.thread) {
            race = Some(pending_race(
                reader.thread,
                reader.clock,
                false,
                new_action,
                true,
                address,
            ));
            break;
        }
    }

    if race.is_none() && clock_may_race(cv, thread, record.write_clock, record.write_thread) {
        race = Some(pending_race(
            record.write_thread,
            record.write_clock,
            true,
            new_action,
            true,
            address,
        ));
    }

    record.record_write(thread, our_clock, false);
    race
}

/// Atomic-write variant: a record whose history is atomic cannot race
/// with an atomic write; the history is restamped atomic either way.
fn atom_full_write_check(
    record: &mut ExpandedRecord,
    cv: &dyn ClockVector,
    thread: ThreadId,
    our_clock: Clock,
    new_action: ActionRef,
    address: Address,
) -> Option<DataRace> {
    if record.is_atomic {
        record.record_write(thread, our_clock, true);
        return None;
    }

    let mut race = None;

    for reader in &record.readers {
        if clock_may_race(cv, thread, reader.clock, reader.thread) {
            race = Some(pending_race(
                reader.thread,
                reader.clock,
                false,
                new_action,
                true,
                address,
            ));
            break;
        }
    }

    if race.is_none() && clock_may_race(cv, thread, record.write_clock, record.write_thread) {
        race = Some(pending_race(
            record.write_thread,
            record.write_clock,
            true,
            new_action,
            true,
            address,
        ));
    }

    record.record_write(thread, our_clock, true);
    race
}

/// Race-check a read against a promoted record: only the last writer can
/// conflict. Every stored reader the new read causally dominates is
/// pruned (it can no longer be the first half of a future race the new
/// read would not also be), then the new reader is appended.
fn full_read_check(
    record: &mut ExpandedRecord,
    cv: &dyn ClockVector,
    thread: ThreadId,
    our_clock: Clock,
    new_action: ActionRef,
    address: Address,
) -> Option<DataRace> {
    let race = if clock_may_race(cv, thread, record.write_clock, record.write_thread) {
        Some(pending_race(
            record.write_thread,
            record.write_clock,
            true,
            new_action,
            false,
            address,
        ))
    } else {
        None
    };

    record
        .readers
        .retain(|reader| clock_may_race(cv, thread, reader.clock, reader.thread));
    record.readers.push(ReadEntry {
        thread,
        clock: our_clock,
    });

    race
}

/// Atomic-read variant: skips atomic history entirely and records
/// nothing (atomic reads are ordered by the model itself).
fn atom_full_read_check(
    record: &ExpandedRecord,
    cv: &dyn ClockVector,
    thread: ThreadId,
    new_action: ActionRef,
    address: Address,
) -> Option<DataRace> {
    if record.is_atomic {
        return None;
    }

    if clock_may_race(cv, thread, record.write_clock, record.write_thread) {
        return Some(pending_race(
            record.write_thread,
            record.write_clock,
            true,
            new_action,
            false,
            address,
        ));
    }

    None
}

/// Whether all `width` bytes starting at `address` fall inside one shadow
/// page, making the optimistic word-propagation fast path applicable.
fn same_shadow_page(address: Address, width: u64) -> bool {
    (address & PAGE_MASK) + (width - 1) <= PAGE_MASK
}

/// Result of one byte's check: the conflict to report, if any, and the
/// slot's `(old, new)` compact words when the compact fast path ran —
/// the wide entries use the pair to update neighbor slots optimistically.
#[derive(Default)]
struct ByteOutcome {
    race: Option<DataRace>,
    propagate: Option<(CompactRecord, CompactRecord)>,
}

impl ByteOutcome {
    fn race_only(race: Option<DataRace>) -> Self {
        Self {
            race,
            propagate: None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  RaceDetector
// ═══════════════════════════════════════════════════════════════════════

/// The shadow-memory race detector for one analysis run.
///
/// Owns the shadow table, the report dedup set, and the findings of the
/// current run. All per-thread state (clock vectors, action identity,
/// backtraces) is consulted through the [`Execution`] trait; an access by
/// a thread the execution does not track yet is a complete no-op.
///
/// The detector is driven by a single logical analysis thread and holds
/// no locks; the `in_detector` flag only defends against *nested*
/// instrumentation calls (e.g. the reporting path itself touching
/// instrumented memory), not concurrent callers.
pub struct RaceDetector {
    config: DetectorConfig,
    table: ShadowTable,
    race_set: RaceSet,
    found: Vec<DataRace>,
    counters: AccessCounters,
    in_detector: bool,
}

impl Default for RaceDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}

impl RaceDetector {
    pub fn new(config: DetectorConfig) -> Self {
        info!(
            "race detector initialized ({} shadow pages preallocated)",
            config.prealloc_pages
        );
        let table = ShadowTable::new(config.prealloc_pages);
        Self {
            config,
            table,
            race_set: RaceSet::new(),
            found: Vec::new(),
            counters: AccessCounters::default(),
            in_detector: false,
        }
    }

    // ─── Non-atomic stores ───────────────────────────────────────────

    pub fn store_u8(&mut self, exec: &dyn Execution, thread: ThreadId, address: Address) {
        self.store_width(exec, thread, address, 1);
    }

    pub fn store_u16(&mut self, exec: &dyn Execution, thread: ThreadId, address: Address) {
        self.store_width(exec, thread, address, 2);
    }

    pub fn store_u32(&mut self, exec: &dyn Execution, thread: ThreadId, address: Address) {
        self.store_width(exec, thread, address, 4);
    }

    pub fn store_u64(&mut self, exec: &dyn Execution, thread: ThreadId, address: Address) {
        self.store_width(exec, thread, address, 8);
    }

    // ─── Non-atomic loads ────────────────────────────────────────────

    pub fn load_u8(&mut self, exec: &dyn Execution, thread: ThreadId, address: Address) {
        self.load_width(exec, thread, address, 1);
    }

    pub fn load_u16(&mut self, exec: &dyn Execution, thread: ThreadId, address: Address) {
        self.load_width(exec, thread, address, 2);
    }

    pub fn load_u32(&mut self, exec: &dyn Execution, thread: ThreadId, address: Address) {
        self.load_width(exec, thread, address, 4);
    }

    pub fn load_u64(&mut self, exec: &dyn Execution, thread: ThreadId, address: Address) {
        self.load_width(exec, thread, address, 8);
    }

    // ─── Bulk memory operations ──────────────────────────────────────

    /// Check a bulk write of `len` bytes (memcpy/memset targets). Every
    /// byte is checked and updated; at most one race is surfaced for the
    /// whole operation.
    pub fn store_range(&mut self, exec: &dyn Execution, thread: ThreadId, address: Address, len: u64) {
        if self.in_detector {
            return;
        }
        self.in_detector = true;

        if exec.clock_vector(thread).is_some() {
            let mut reported = false;
            for offset in 0..len {
                let outcome = self.check_write_byte(exec, thread, address.wrapping_add(offset));
                if let Some(race) = outcome.race {
                    if !reported {
                        reported = true;
                        self.surface_race(exec, race);
                    }
                }
            }
        }

        self.in_detector = false;
    }

    /// Check a bulk read of `len` bytes. Every byte is checked and
    /// recorded; at most one race is surfaced for the whole operation.
    pub fn load_range(&mut self, exec: &dyn Execution, thread: ThreadId, address: Address, len: u64) {
        if self.in_detector {
            return;
        }
        self.in_detector = true;

        if exec.clock_vector(thread).is_some() {
            let mut reported = false;
            for offset in 0..len {
                let outcome = self.check_read_byte(exec, thread, address.wrapping_add(offset));
                if let Some(race) = outcome.race {
                    if !reported {
                        reported = true;
                        self.surface_race(exec, race);
                    }
                }
            }
        }

        self.in_detector = false;
    }

    // ─── Atomic accesses ─────────────────────────────────────────────

    /// Check an atomic store of one byte. Conflicts with non-atomic
    /// history only; restamps the slot's history as an atomic write.
    pub fn atomic_store_u8(&mut self, exec: &dyn Execution, thread: ThreadId, address: Address) {
        self.atomic_store_width(exec, thread, address, 1);
    }

    pub fn atomic_store_u16(&mut self, exec: &dyn Execution, thread: ThreadId, address: Address) {
        self.atomic_store_width(exec, thread, address, 2);
    }

    pub fn atomic_store_u32(&mut self, exec: &dyn Execution, thread: ThreadId, address: Address) {
        self.atomic_store_width(exec, thread, address, 4);
    }

    pub fn atomic_store_u64(&mut self, exec: &dyn Execution, thread: ThreadId, address: Address) {
        self.atomic_store_width(exec, thread, address, 8);
    }

    /// Check an atomic load of one byte. Conflicts with non-atomic
    /// writes only and records nothing.
    pub fn atomic_load_u8(&mut self, exec: &dyn Execution, thread: ThreadId, address: Address) {
        self.atomic_load_width(exec, thread, address, 1);
    }

    pub fn atomic_load_u16(&mut self, exec: &dyn Execution, thread: ThreadId, address: Address) {
        self.atomic_load_width(exec, thread, address, 2);
    }

    pub fn atomic_load_u32(&mut self, exec: &dyn Execution, thread: ThreadId, address: Address) {
        self.atomic_load_width(exec, thread, address, 4);
    }

    pub fn atomic_load_u64(&mut self, exec: &dyn Execution, thread: ThreadId, address: Address) {
        self.atomic_load_width(exec, thread, address, 8);
    }

    fn atomic_store_width(
        &mut self,
        exec: &dyn Execution,
        thread: ThreadId,
        address: Address,
        width: u64,
    ) {
        if self.in_detector {
            return;
        }
        self.in_detector = true;

        for offset in 0..width {
            if let Some(race) =
                self.check_atomic_write_byte(exec, thread, address.wrapping_add(offset))
            {
                self.surface_race(exec, race);
            }
        }

        self.in_detector = false;
    }

    fn atomic_load_width(
        &mut self,
        exec: &dyn Execution,
        thread: ThreadId,
        address: Address,
        width: u64,
    ) {
        if self.in_detector {
            return;
        }
        self.in_detector = true;

        for offset in 0..width {
            if let Some(race) =
                self.check_atomic_read_byte(exec, thread, address.wrapping_add(offset))
            {
                self.surface_race(exec, race);
            }
        }

        self.in_detector = false;
    }

    /// Stamp an atomic write into the slot's metadata without any
    /// conflict check (fences and other value-free atomic markers).
    pub fn record_atomic_store(&mut self, exec: &dyn Execution, thread: ThreadId, address: Address) {
        if self.in_detector {
            return;
        }
        self.in_detector = true;

        if let Some(cv) = exec.clock_vector(thread) {
            let our_clock = cv.clock(thread);
            let slot = self.table.slot_mut(address);
            match slot.compact_word() {
                Some(_) if CompactRecord::fits(thread, our_clock) => {
                    *slot = ShadowSlot::Compact(CompactRecord::encode(
                        ThreadId(0),
                        0,
                        thread,
                        our_clock,
                        true,
                    ));
                }
                _ => {
                    slot.expand().record_write(thread, our_clock, true);
                }
            }
        }

        self.in_detector = false;
    }

    /// Record the zero-initialization of freshly allocated memory as a
    /// non-atomic write to every byte, without conflict checks.
    pub fn record_zero_fill(
        &mut self,
        exec: &dyn Execution,
        thread: ThreadId,
        address: Address,
        len: u64,
    ) {
        if self.in_detector {
            return;
        }
        self.in_detector = true;

        if let Some(cv) = exec.clock_vector(thread) {
            let our_clock = cv.clock(thread);
            for offset in 0..len {
                let slot = self.table.slot_mut(address.wrapping_add(offset));
                match slot.compact_word() {
                    Some(_) if CompactRecord::fits(thread, our_clock) => {
                        *slot = ShadowSlot::Compact(CompactRecord::encode(
                            ThreadId(0),
                            0,
                            thread,
                            our_clock,
                            false,
                        ));
                    }
                    _ => {
                        slot.expand().record_write(thread, our_clock, false);
                    }
                }
            }
        }

        self.in_detector = false;
    }

    // ─── Maintenance ─────────────────────────────────────────────────

    /// Whether a non-atomic store has ever been recorded at `address`.
    /// Untouched memory counts as non-atomic.
    pub fn has_nonatomic_store(&mut self, address: Address) -> bool {
        match self.table.slot_mut(address) {
            ShadowSlot::Compact(word) => !word.is_atomic(),
            ShadowSlot::Expanded(record) => !record.is_atomic,
        }
    }

    /// Mark `address` as atomic-only, seeding the atomicity assumption
    /// for freshly allocated memory.
    pub fn set_atomic_store_flag(&mut self, address: Address) {
        let slot = self.table.slot_mut(address);
        match slot.compact_word() {
            Some(word) => *slot = ShadowSlot::Compact(word.with_atomic()),
            None => slot.expand().is_atomic = true,
        }
    }

    /// The last recorded store at `address` as `(thread, clock)`; clock 0
    /// means no store has been recorded.
    pub fn last_store(&mut self, address: Address) -> (ThreadId, Clock) {
        match self.table.slot_mut(address) {
            ShadowSlot::Compact(word) => word.writer(),
            ShadowSlot::Expanded(record) => (record.write_thread, record.write_clock),
        }
    }

    /// Reinitialize the shadow table, dedup set, findings, and counters
    /// for a fresh run.
    pub fn reset(&mut self) {
        self.table.reset();
        self.race_set.clear();
        self.found.clear();
        self.counters = AccessCounters::default();
        self.in_detector = false;
        info!("race detector reset for a fresh run");
    }

    /// Races surfaced so far in this run.
    pub fn races(&self) -> &[DataRace] {
        &self.found
    }

    /// Drain the surfaced races, leaving the dedup set intact.
    pub fn take_races(&mut self) -> Vec<DataRace> {
        std::mem::take(&mut self.found)
    }

    /// Per-width access counts.
    pub fn counters(&self) -> &AccessCounters {
        &self.counters
    }

    /// Shadow pages allocated so far.
    pub fn pages_allocated(&self) -> usize {
        self.table.pages_allocated()
    }

    // ─── Width-specialized walkers ───────────────────────────────────

    fn store_width(&mut self, exec: &dyn Execution, thread: ThreadId, address: Address, width: u64) {
        if self.in_detector {
            return;
        }
        self.in_detector = true;
        self.counters.record_store(width);

        let first = self.check_write_byte(exec, thread, address);
        if let Some(race) = first.race {
            self.surface_race(exec, race);
        }

        let mut next = 1;
        if let Some((old, new)) = first.propagate {
            if same_shadow_page(address, width) {
                while next < width {
                    let slot = self.table.slot_mut(address + next);
                    if slot.compact_word() == Some(old) {
                        *slot = ShadowSlot::Compact(new);
                        next += 1;
                    } else {
                        break;
                    }
                }
            }
        }

        while next < width {
            let outcome = self.check_write_byte(exec, thread, address.wrapping_add(next));
            if let Some(race) = outcome.race {
                self.surface_race(exec, race);
            }
            next += 1;
        }

        self.in_detector = false;
    }

    fn load_width(&mut self, exec: &dyn Execution, thread: ThreadId, address: Address, width: u64) {
        if self.in_detector {
            return;
        }
        self.in_detector = true;
        self.counters.record_load(width);

        let first = self.check_read_byte(exec, thread, address);
        if let Some(race) = first.race {
            self.surface_race(exec, race);
        }

        let mut next = 1;
        if let Some((old, new)) = first.propagate {
            if same_shadow_page(address, width) {
                while next < width {
                    let slot = self.table.slot_mut(address + next);
                    if slot.compact_word() == Some(old) {
                        *slot = ShadowSlot::Compact(new);
                        next += 1;
                    } else {
                        break;
                    }
                }
            }
        }

        while next < width {
            let outcome = self.check_read_byte(exec, thread, address.wrapping_add(next));
            if let Some(race) = outcome.race {
                self.surface_race(exec, race);
            }
            next += 1;
        }

        self.in_detector = false;
    }

    // ─── Per-byte checks ─────────────────────────────────────────────

    fn check_write_byte(&mut self, exec: &dyn Execution, thread: ThreadId, address: Address) -> ByteOutcome {
        let cv = match exec.clock_vector(thread) {
            Some(cv) => cv,
            None => return ByteOutcome::default(),
        };
        let new_action = exec.parent_action(thread);
        let our_clock = cv.clock(thread);

        let slot = self.table.slot_mut(address);
        match slot.compact_word() {
            Some(_) if !CompactRecord::fits(thread, our_clock) => ByteOutcome::race_only(
                full_write_check(slot.expand(), cv, thread, our_clock, new_action, address),
            ),
            None => ByteOutcome::race_only(full_write_check(
                slot.expand(),
                cv,
                thread,
                our_clock,
                new_action,
                address,
            )),
            Some(word) => {
                let (read_thread, read_clock) = word.reader();
                let (write_thread, write_clock) = word.writer();

                let race = if clock_may_race(cv, thread, read_clock, read_thread) {
                    Some(pending_race(read_thread, read_clock, false, new_action, true, address))
                } else if clock_may_race(cv, thread, write_clock, write_thread) {
                    Some(pending_race(write_thread, write_clock, true, new_action, true, address))
                } else {
                    None
                };

                let new = CompactRecord::encode(ThreadId(0), 0, thread, our_clock, false);
                *slot = ShadowSlot::Compact(new);

                ByteOutcome {
                    race,
                    propagate: Some((word, new)),
                }
            }
        }
    }

    fn check_read_byte(&mut self, exec: &dyn Execution, thread: ThreadId, address: Address) -> ByteOutcome {
        let cv = match exec.clock_vector(thread) {
            Some(cv) => cv,
            None => return ByteOutcome::default(),
        };
        let new_action = exec.parent_action(thread);
        let our_clock = cv.clock(thread);

        let slot = self.table.slot_mut(address);
        match slot.compact_word() {
            Some(_) if !CompactRecord::fits(thread, our_clock) => ByteOutcome::race_only(
                full_read_check(slot.expand(), cv, thread, our_clock, new_action, address),
            ),
            None => ByteOutcome::race_only(full_read_check(
                slot.expand(),
                cv,
                thread,
                our_clock,
                new_action,
                address,
            )),
            Some(word) => {
                let (write_thread, write_clock) = word.writer();
                let race = if clock_may_race(cv, thread, write_clock, write_thread) {
                    Some(pending_race(write_thread, write_clock, true, new_action, false, address))
                } else {
                    None
                };

                let (read_thread, read_clock) = word.reader();
                if clock_may_race(cv, thread, read_clock, read_thread) {
                    // The stored reader stays live alongside ours: promote
                    // the slot and track both.
                    let record = slot.expand();
                    record.readers.push(ReadEntry {
                        thread,
                        clock: our_clock,
                    });
                    ByteOutcome::race_only(race)
                } else {
                    let new = CompactRecord::encode(
                        thread,
                        our_clock,
                        write_thread,
                        write_clock,
                        word.is_atomic(),
                    );
                    *slot = ShadowSlot::Compact(new);
                    ByteOutcome {
                        race,
                        propagate: Some((word, new)),
                    }
                }
            }
        }
    }

    fn check_atomic_write_byte(
        &mut self,
        exec: &dyn Execution,
        thread: ThreadId,
        address: Address,
    ) -> Option<DataRace> {
        let cv = exec.clock_vector(thread)?;
        let new_action = exec.parent_action(thread);
        let our_clock = cv.clock(thread);

        let slot = self.table.slot_mut(address);
        match slot.compact_word() {
            Some(_) if !CompactRecord::fits(thread, our_clock) => {
                atom_full_write_check(slot.expand(), cv, thread, our_clock, new_action, address)
            }
            None => atom_full_write_check(slot.expand(), cv, thread, our_clock, new_action, address),
            Some(word) => {
                let race = if word.is_atomic() {
                    // Atomic history cannot race with an atomic write.
                    None
                } else {
                    let (read_thread, read_clock) = word.reader();
                    let (write_thread, write_clock) = word.writer();
                    if clock_may_race(cv, thread, read_clock, read_thread) {
                        Some(pending_race(read_thread, read_clock, false, new_action, true, address))
                    } else if clock_may_race(cv, thread, write_clock, write_thread) {
                        Some(pending_race(write_thread, write_clock, true, new_action, true, address))
                    } else {
                        None
                    }
                };

                *slot = ShadowSlot::Compact(CompactRecord::encode(
                    ThreadId(0),
                    0,
                    thread,
                    our_clock,
                    true,
                ));
                race
            }
        }
    }

    fn check_atomic_read_byte(
        &mut self,
        exec: &dyn Execution,
        thread: ThreadId,
        address: Address,
    ) -> Option<DataRace> {
        let cv = exec.clock_vector(thread)?;
        let new_action = exec.parent_action(thread);

        match self.table.slot_mut(address) {
            ShadowSlot::Expanded(record) => {
                atom_full_read_check(record, cv, thread, new_action, address)
            }
            ShadowSlot::Compact(word) => {
                if word.is_atomic() {
                    return None;
                }
                let (write_thread, write_clock) = word.writer();
                if clock_may_race(cv, thread, write_clock, write_thread) {
                    Some(pending_race(
                        write_thread,
                        write_clock,
                        true,
                        new_action,
                        false,
                        address,
                    ))
                } else {
                    None
                }
            }
        }
    }

    // ─── Reporting ───────────────────────────────────────────────────

    /// Capture the backtrace, deduplicate, annotate with the causal
    /// distance, and retain a first-time race.
    fn surface_race(&mut self, exec: &dyn Execution, mut race: DataRace) {
        if !self.config.report_races {
            return;
        }

        race.backtrace = exec.capture_backtrace(self.config.max_backtrace_frames);
        if !self.race_set.add(&race) {
            debug!("duplicate data race suppressed @ {:#x}", race.address);
            return;
        }

        if let Some(graph) = exec.relations() {
            let older = exec.last_action(race.old_thread);
            race.graph_distance = graph.min_distance_between(older, race.new_action);
        }

        error!("{}", race);
        self.found.push(race);
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
