//! Bounded, bidirectional frame history for scrubbing.
//!
//! [`HistoryRing`] keeps a FIFO of past site-position snapshots (not full
//! [`voronoi_core::VoronoiResult`]s — those are cheap to recompute and
//! expensive to retain). A cursor indexes the "currently viewed" frame and
//! may trail the most recent ("head") frame; stepping forward past the head
//! runs physics and appends, stepping forward while behind the head just
//! advances the cursor.
//!
//! # Used By
//!
//! - `voronoi-engine` - `Engine::step`, `Engine::step_back`, `Engine::step_forward`

use std::collections::VecDeque;

/// A single frame's site positions, retained for scrubbing.
///
/// Velocities are not stored: stepping back only needs to re-render a past
/// frame's tessellation, which depends on positions alone.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// X positions at this frame, index-aligned with `ys`.
    pub xs: Vec<f64>,
    /// Y positions at this frame.
    pub ys: Vec<f64>,
}

/// Lower bound on retained frames regardless of site count, so scrubbing
/// stays usable even with very large `N`.
const MIN_FRAMES: usize = 50;

/// Target memory budget for the ring, in bytes (`~2 MiB`).
const MEMORY_BUDGET_BYTES: usize = 2 * 1024 * 1024;

/// Bytes a single site contributes to a snapshot (two `f64` positions plus
/// bookkeeping overhead), used to size the ring from the current site count.
const BYTES_PER_SITE: usize = 20;

/// Computes `max_frames = max(50, floor(2 MiB / (20 * N)))`.
fn max_frames_for(site_count: usize) -> usize {
    if site_count == 0 {
        return MIN_FRAMES;
    }
    (MEMORY_BUDGET_BYTES / (BYTES_PER_SITE * site_count)).max(MIN_FRAMES)
}

/// A bounded deque of site-position snapshots with a scrub cursor.
#[derive(Debug, Clone, Default)]
pub struct HistoryRing {
    frames: VecDeque<Snapshot>,
    cursor: usize,
}

impl HistoryRing {
    /// An empty ring.
    pub fn new() -> Self {
        Self { frames: VecDeque::new(), cursor: 0 }
    }

    /// Discards every frame and resets the cursor. Called whenever sites are
    /// wholesale replaced (`set_sites_from_sampler`, `set_sites`).
    pub fn clear(&mut self) {
        self.frames.clear();
        self.cursor = 0;
    }

    /// Number of retained frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True if no frames are retained.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The cursor's index into the retained frames.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// True if the cursor is at the most recently appended frame.
    pub fn is_at_head(&self) -> bool {
        self.frames.is_empty() || self.cursor + 1 == self.frames.len()
    }

    /// The snapshot the cursor currently points at, if any.
    pub fn current(&self) -> Option<&Snapshot> {
        self.frames.get(self.cursor)
    }

    /// Appends a new head frame, trimming the oldest frame(s) if the ring
    /// now exceeds its memory-derived capacity, and moves the cursor to it.
    pub fn push(&mut self, xs: Vec<f64>, ys: Vec<f64>) {
        let site_count = xs.len();
        self.frames.push_back(Snapshot { xs, ys });
        let cap = max_frames_for(site_count);
        while self.frames.len() > cap {
            self.frames.pop_front();
            self.cursor = self.cursor.saturating_sub(1);
        }
        self.cursor = self.frames.len() - 1;
    }

    /// Moves the cursor one frame earlier. Returns `false` (no-op) if
    /// already at the oldest retained frame.
    pub fn step_back(&mut self) -> bool {
        if self.cursor == 0 {
            false
        } else {
            self.cursor -= 1;
            true
        }
    }

    /// Moves the cursor one frame later within the ring, without running
    /// physics. Returns `false` if already at the head (the caller should
    /// run physics and [`Self::push`] instead).
    pub fn advance_within_ring(&mut self) -> bool {
        if self.is_at_head() {
            false
        } else {
            self.cursor += 1;
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_moves_cursor_to_new_head() {
        let mut ring = HistoryRing::new();
        ring.push(vec![0.0], vec![0.0]);
        ring.push(vec![1.0], vec![1.0]);
        assert!(ring.is_at_head());
        assert_eq!(ring.current().unwrap().xs, vec![1.0]);
    }

    #[test]
    fn step_back_then_forward_round_trips() {
        let mut ring = HistoryRing::new();
        ring.push(vec![0.0], vec![0.0]);
        ring.push(vec![1.0], vec![1.0]);
        ring.push(vec![2.0], vec![2.0]);
        assert!(ring.step_back());
        assert!(ring.step_back());
        assert_eq!(ring.current().unwrap().xs, vec![0.0]);
        assert!(!ring.is_at_head());
        assert!(ring.advance_within_ring());
        assert_eq!(ring.current().unwrap().xs, vec![1.0]);
        assert!(ring.advance_within_ring());
        assert!(ring.is_at_head());
        assert!(!ring.advance_within_ring());
    }

    #[test]
    fn step_back_stops_at_oldest_frame() {
        let mut ring = HistoryRing::new();
        ring.push(vec![0.0], vec![0.0]);
        assert!(!ring.step_back());
    }

    #[test]
    fn capacity_respects_memory_budget_for_large_site_counts() {
        let mut ring = HistoryRing::new();
        let n = 20_000;
        for i in 0..80 {
            ring.push(vec![i as f64; n], vec![i as f64; n]);
        }
        // 2 MiB / (20 * 20000) = 5.24 -> floored to 5, clamped up to MIN_FRAMES.
        assert_eq!(ring.len(), MIN_FRAMES);
    }

    #[test]
    fn capacity_grows_for_small_site_counts_but_stays_bounded() {
        let mut ring = HistoryRing::new();
        for i in 0..5000 {
            ring.push(vec![i as f64], vec![i as f64]);
        }
        let expected = max_frames_for(1);
        assert_eq!(ring.len(), expected);
    }

    #[test]
    fn clear_resets_ring() {
        let mut ring = HistoryRing::new();
        ring.push(vec![0.0], vec![0.0]);
        ring.clear();
        assert!(ring.is_empty());
        assert_eq!(ring.cursor(), 0);
    }
}
