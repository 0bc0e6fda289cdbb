//! Sample window resolution over the terminal's history ring buffer.
//!
//! The terminal keeps one sample per second in fixed-length circular buffers
//! and reports a write counter that counts every sample ever written since
//! boot. Slot `counter % capacity` is the next one to be overwritten, so once
//! the buffer has wrapped it is also the oldest valid sample.
//!
//! [`resolve`] turns a capacity, the write counter, and a requested sample
//! count (optionally bounded by a `start` counter from a previous call) into a
//! [`SampleWindow`]: at most two slot ranges that, visited head then tail,
//! walk the requested samples from oldest to newest.

use std::ops::Range;

/// How many of the most recent samples to include in a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleCount {
    /// Every valid sample in the buffer.
    #[default]
    All,
    /// At most this many of the newest samples.
    Last(u64),
}

impl SampleCount {
    /// Map a signed command-line count to a bound; negative means unbounded.
    pub fn from_signed(n: i64) -> Self {
        u64::try_from(n).map_or(Self::All, Self::Last)
    }
}

impl std::fmt::Display for SampleCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Last(n) => write!(f, "{n}"),
        }
    }
}

/// A resolved run of ring-buffer slots, oldest first.
///
/// `head` is visited before `tail`; `tail` is empty unless the window crosses
/// the end of the buffer. The counters are sample counters, not slot numbers:
/// the window covers samples `start_counter + 1 ..= end_counter`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleWindow {
    pub start_counter: u64,
    pub end_counter: u64,
    pub head: Range<usize>,
    pub tail: Range<usize>,
}

impl SampleWindow {
    /// A window with no samples that ends at `end_counter`.
    pub fn empty(end_counter: u64) -> Self {
        Self {
            start_counter: end_counter,
            end_counter,
            head: 0..0,
            tail: 0..0,
        }
    }

    /// Number of slots in the window.
    pub fn len(&self) -> usize {
        self.head.len() + self.tail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slot indices from oldest to newest.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.head.clone().chain(self.tail.clone())
    }

    /// Pairs of (sample counter, slot index) from oldest to newest.
    pub fn counters(&self) -> impl Iterator<Item = (u64, usize)> + '_ {
        (self.start_counter + 1..=self.end_counter).zip(self.indices())
    }
}

/// Resolve which ring-buffer slots hold the requested samples.
///
/// - Never yields more than `min(capacity, write_counter)` slots.
/// - A `start` greater than `write_counter` means the terminal rebooted since
///   the caller recorded it; it is ignored.
/// - Otherwise only samples with a counter greater than `start` are included.
///
/// Never fails; degenerate inputs yield an empty window.
pub fn resolve(
    capacity: usize,
    write_counter: u64,
    requested: SampleCount,
    start: Option<u64>,
) -> SampleWindow {
    let valid = (capacity as u64).min(write_counter);
    let count = match requested {
        SampleCount::Last(n) if n <= valid => n,
        _ => valid,
    };

    let start = match start {
        Some(s) if s > write_counter => {
            log::info!(
                "counter reset detected (start {s} > current {write_counter}), ignoring requested start"
            );
            None
        }
        other => other,
    };

    let floor = write_counter - count;
    let effective_start = start.map_or(floor, |s| s.max(floor));
    let len = write_counter - effective_start;
    log::debug!(
        "resolving window: capacity={capacity} current={write_counter} valid={valid} samples={len}"
    );
    if len == 0 {
        return SampleWindow::empty(write_counter);
    }

    // `len > 0` implies `capacity > 0`.
    let end_offset = (write_counter % capacity as u64) as usize;
    let start_offset = (effective_start % capacity as u64) as usize;
    let (head, tail) = if start_offset < end_offset {
        (start_offset..end_offset, 0..0)
    } else {
        (start_offset..capacity, 0..end_offset)
    };

    SampleWindow {
        start_counter: effective_start,
        end_counter: write_counter,
        head,
        tail,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
