//! Temporal smoothing of per-frame readings.
//!
//! Recognition flickers: one frame in a window misreads a digit while its
//! neighbors read it correctly. Each scoreboard field keeps a short
//! sliding window of raw readings and reports the majority value, which
//! suppresses single-frame misreads at the cost of about half a window of
//! lag. One buffer per field per stream; buffers are never shared.

use std::collections::HashMap;
use std::collections::VecDeque;

/// Default window length, in frames.
pub const DEFAULT_CAPACITY: usize = 5;

/// A fixed-capacity sliding window of raw readings with majority vote.
#[derive(Debug, Clone)]
pub struct ConsensusBuffer {
    window: VecDeque<String>,
    capacity: usize,
}

impl ConsensusBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
        }
    }

    /// Appends a reading, evicting the oldest beyond capacity.
    ///
    /// Empty readings are pushed like any other value: a frame that failed
    /// extraction still advances the window so it stays aligned with frame
    /// cadence.
    pub fn push(&mut self, reading: impl Into<String>) {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(reading.into());
    }

    /// The most frequent reading currently in the window, or `None` when
    /// nothing has been pushed yet.
    ///
    /// Ties are broken deterministically: scanning the window oldest to
    /// newest with running counts, the winner is the first value whose
    /// running count reaches the overall maximum.
    pub fn consensus(&self) -> Option<&str> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut best: Option<&str> = None;
        let mut best_count = 0usize;

        for reading in &self.window {
            let count = counts.entry(reading.as_str()).or_insert(0);
            *count += 1;
            if *count > best_count {
                best_count = *count;
                best = Some(reading.as_str());
            }
        }

        best
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_with(readings: &[&str]) -> ConsensusBuffer {
        let mut buf = ConsensusBuffer::new(DEFAULT_CAPACITY);
        for r in readings {
            buf.push(*r);
        }
        buf
    }

    #[test]
    fn test_majority_wins() {
        let buf = buffer_with(&["12", "13", "12", "9", "12"]);
        assert_eq!(buf.consensus(), Some("12"));
    }

    #[test]
    fn test_empty_buffer_has_no_consensus() {
        let buf = ConsensusBuffer::new(5);
        assert_eq!(buf.consensus(), None);
    }

    #[test]
    fn test_eviction_beyond_capacity() {
        let mut buf = ConsensusBuffer::new(3);
        for r in ["88", "88", "89", "89", "89"] {
            buf.push(r);
        }
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.consensus(), Some("89"));
    }

    #[test]
    fn test_tie_breaks_to_earliest_max() {
        // "12" and "13" both end at two; "12" reaches two first.
        let buf = buffer_with(&["12", "13", "12", "13"]);
        assert_eq!(buf.consensus(), Some("12"));

        // Reversed arrival order flips the winner.
        let buf = buffer_with(&["13", "12", "13", "12"]);
        assert_eq!(buf.consensus(), Some("13"));
    }

    #[test]
    fn test_empty_readings_count_like_values() {
        let buf = buffer_with(&["", "", "88", "", "88"]);
        assert_eq!(buf.consensus(), Some(""));
    }

    #[test]
    fn test_single_push() {
        let buf = buffer_with(&["45"]);
        assert_eq!(buf.consensus(), Some("45"));
    }
}
