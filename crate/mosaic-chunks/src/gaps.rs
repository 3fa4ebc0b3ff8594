//! Missing-byte tracking for a chunk being assembled out of order.
//!
//! A [ChunkGaps] instance tracks which byte positions of a fixed-size chunk
//! are still missing, as a sorted list of disjoint [ByteSpan]s. Positions
//! are 1-based and inclusive; the list is empty once the chunk is complete.
//!
//! ```
//! use mosaic_chunks::ChunkGaps;
//!
//! let gaps = ChunkGaps::new(1000);
//! gaps.fill_gap(1, 1000);
//! assert!(gaps.is_complete());
//! ```

use mosaic_types::{ByteSpan, SpanParseError};
use std::fmt;
use std::sync::Mutex;

/// The missing-byte spans of a single fixed-size chunk.
///
/// Created with one gap covering the whole chunk, then narrowed through
/// [ChunkGaps::fill_gap] as byte ranges are confirmed received. Every
/// operation takes the per-instance lock, so one instance can be shared
/// by the tasks that download the same chunk; the gap list itself never
/// escapes the lock, only copies of it do.
#[derive(Debug)]
pub struct ChunkGaps {
    /// Chunk size in bytes. Kept for boundary checks.
    chunk_size: u64,
    gaps: Mutex<Vec<ByteSpan>>,
}

impl ChunkGaps {
    /// Create a tracker with one gap covering the whole chunk.
    ///
    /// A zero-size chunk gets no gap at all; every operation on such an
    /// instance is a no-op returning empty or zero.
    pub fn new(chunk_size: u64) -> Self {
        let gaps = if chunk_size == 0 {
            Vec::new()
        } else {
            vec![ByteSpan::new(1, chunk_size)]
        };

        ChunkGaps {
            chunk_size,
            gaps: Mutex::new(gaps),
        }
    }

    /// The chunk size, in bytes.
    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// Replace the gap list with the single span `[start, end]`.
    ///
    /// Bounds are not checked against the chunk size; after a reset it is
    /// up to the caller how the chunk is addressed. A 1000-byte chunk can
    /// be tracked 1-based with `reset(1, 1000)` or 0-based with
    /// `reset(0, 999)`.
    pub fn reset(&self, start: u64, end: u64) {
        let mut gaps = self.gaps.lock().unwrap();
        gaps.clear();
        gaps.push(ByteSpan::new(start, end));
    }

    /// True when the gap list is empty, meaning the chunk is complete.
    pub fn is_complete(&self) -> bool {
        self.gaps.lock().unwrap().is_empty()
    }

    /// Number of bytes still missing, summed over all gaps.
    pub fn missing_bytes(&self) -> u64 {
        self.gaps
            .lock()
            .unwrap()
            .iter()
            .map(|gap| gap.bytecount())
            .sum()
    }

    /// Number of downloaded bytes according to the gaps.
    pub fn downloaded_bytes(&self) -> u64 {
        self.chunk_size - self.missing_bytes()
    }

    /// Number of gaps in the list.
    ///
    /// Diagnostic only: one gap may be bigger than two gaps when counting
    /// bytes, so this says nothing about how much is missing.
    pub fn gap_count(&self) -> usize {
        self.gaps.lock().unwrap().len()
    }

    /// Empty the gap list, marking the chunk complete whatever its prior
    /// state. For receiving bytes, use [ChunkGaps::fill_gap] instead.
    pub fn clear(&self) {
        self.gaps.lock().unwrap().clear();
    }

    /// Fill the full chunk range through the normal fill algorithm.
    pub fn fill_all(&self) {
        self.fill_gap(1, self.chunk_size);
    }

    /// Consistent copy of the gap list, in ascending order.
    pub fn snapshot(&self) -> Vec<ByteSpan> {
        self.gaps.lock().unwrap().clone()
    }

    /// True if `[check_start, check_end]` does not intersect any gap,
    /// meaning that sub-range has been fully received.
    ///
    /// Fails closed: an inverted range or one that ends past the chunk
    /// returns false.
    pub fn is_full(&self, check_start: u64, check_end: u64) -> bool {
        if check_end < check_start || check_end > self.chunk_size {
            return false;
        }

        let gaps = self.gaps.lock().unwrap();
        for gap in gaps.iter() {
            // Gaps are sorted; nothing further right can reach back
            // into the checked range.
            if gap.start > check_end {
                return true;
            }
            if gap.end >= check_start {
                return false;
            }
        }

        true
    }

    /// Update the gap list with newly received bytes `[new_start,
    /// new_end]`, both inclusive.
    ///
    /// Handles all the possible overlaps, although in real usage the
    /// received bytes usually split a gap and then cover it from left to
    /// right:
    ///
    /// ```text
    ///       1. full   2. left   3. right   4. split
    /// gap:  ====      =====       =====    =======
    /// new:  ######    ###           ###      ###
    /// ```
    ///
    /// Returns the number of bytes removed from gaps, which may be less
    /// than the given range if some of it was already received. An
    /// illegal range, or one that overlaps no gap, leaves the list
    /// untouched and returns 0.
    pub fn fill_gap(&self, new_start: u64, new_end: u64) -> u64 {
        // Verify positions.
        if new_start > new_end || new_end > self.chunk_size {
            log::debug!(
                "rejected fill {new_start}-{new_end} for chunk of {} bytes",
                self.chunk_size
            );
            return 0;
        }

        let mut gaps = self.gaps.lock().unwrap();
        if gaps.is_empty() {
            return 0;
        }

        // Skip gaps that end before the received range even starts.
        let mut i = 0;
        while i < gaps.len() && gaps[i].end < new_start {
            i += 1;
        }

        // No gap overlaps the received range. Requests are made from the
        // gaps on hand, so this only happens when a delivery races a
        // concurrent fill of the same range.
        if i >= gaps.len() || gaps[i].start > new_end {
            log::debug!(
                "fill {new_start}-{new_end} matched no gap in chunk of {} bytes",
                self.chunk_size
            );
            return 0;
        }

        let mut completed_bytes = 0;
        while i < gaps.len() {
            let cur = gaps[i];
            if cur.start >= new_start {
                if cur.end <= new_end {
                    // 1. Gap fully covered. Drop it and rescan the same
                    // index; the received range may cover further gaps.
                    completed_bytes += cur.bytecount();
                    gaps.remove(i);
                    continue;
                }
                if cur.start <= new_end {
                    // 2. Left part of the gap covered. Cut it from the
                    // left.
                    completed_bytes += new_end - cur.start + 1;
                    gaps[i].start = new_end + 1;
                }
                // Either way nothing further right can overlap.
                break;
            }

            // Only the first overlapping gap can start before new_start.
            if cur.end <= new_end {
                // 3. Right part of the gap covered. Cut it from the
                // right and keep going; the received range may extend
                // over the following gaps.
                completed_bytes += cur.end - new_start + 1;
                gaps[i].end = new_start - 1;
            } else {
                // 4. Received range lies strictly inside the gap. Split
                // it in two around the received bytes.
                completed_bytes += new_end - new_start + 1;
                let tail = ByteSpan::new(new_end + 1, cur.end);
                gaps[i].end = new_start - 1;
                gaps.insert(i + 1, tail);
                break;
            }

            i += 1;
        }

        completed_bytes
    }

    /// The gap list rendered for embedding in a chunk record.
    ///
    /// Each gap renders as `start-end` followed by a comma, in ascending
    /// order, for example `"1-120,451-900,"`. A complete chunk renders as
    /// the empty string.
    pub fn rendered(&self) -> String {
        self.to_string()
    }

    /// Restore a tracker from its rendering.
    ///
    /// Accepts the output of [ChunkGaps::rendered] for a chunk of the
    /// given size: zero or more `start-end` tokens, each followed by a
    /// comma, in ascending disjoint order. The empty string restores a
    /// complete chunk. The final comma may be omitted.
    pub fn parse(chunk_size: u64, rendered: &str) -> Result<ChunkGaps, GapListError> {
        let mut gaps: Vec<ByteSpan> = Vec::new();
        for token in rendered.split_terminator(',') {
            let span = ByteSpan::parse(token)?;
            if span.end > chunk_size {
                return Err(GapListError::OutOfBounds(span));
            }
            if let Some(prev) = gaps.last()
                && span.start <= prev.end
            {
                return Err(GapListError::OutOfOrder(span));
            }
            gaps.push(span);
        }

        Ok(ChunkGaps {
            chunk_size,
            gaps: Mutex::new(gaps),
        })
    }
}

impl fmt::Display for ChunkGaps {
    /// Formats the gap list as comma-terminated `start-end` tokens.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let gaps = self.gaps.lock().unwrap();
        for gap in gaps.iter() {
            write!(f, "{gap},")?;
        }
        Ok(())
    }
}

/// Error returned when restoring a gap list from its rendering fails.
#[derive(Debug, thiserror::Error)]
pub enum GapListError {
    #[error(transparent)]
    BadSpan(#[from] SpanParseError),

    #[error("gap {0} is not in ascending disjoint order")]
    OutOfOrder(ByteSpan),

    #[error("gap {0} extends past the chunk end")]
    OutOfBounds(ByteSpan),
}
