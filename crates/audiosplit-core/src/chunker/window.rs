//! Time-window arithmetic for the split loop.

use crate::config::MIN_WINDOW_MS;

/// Half-open interval `[start_ms, end_ms)` over a track, with its 1-based
/// position in the output sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkWindow {
    pub index: usize,
    pub start_ms: u64,
    pub end_ms: u64,
}

impl ChunkWindow {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms - self.start_ms
    }

    /// Whether the window is still long enough to be shrunk.
    pub fn above_floor(&self) -> bool {
        self.duration_ms() > MIN_WINDOW_MS
    }

    /// Same start, duration reduced to `floor(duration * 0.9)`.
    pub fn shrunk(&self) -> ChunkWindow {
        ChunkWindow {
            end_ms: self.start_ms + shrink_duration(self.duration_ms()),
            ..*self
        }
    }

    /// Like [`shrunk`](Self::shrunk), but never below the one-minute floor.
    pub fn shrunk_to_floor(&self) -> ChunkWindow {
        let duration = shrink_duration(self.duration_ms()).max(MIN_WINDOW_MS);
        ChunkWindow {
            end_ms: self.start_ms + duration.min(self.duration_ms()),
            ..*self
        }
    }
}

/// `floor(duration * 0.9)` in exact integer arithmetic.
pub fn shrink_duration(duration_ms: u64) -> u64 {
    duration_ms / 10 * 9 + duration_ms % 10 * 9 / 10
}

/// Window starting at `start_ms`, capped by `max_duration_ms` and the end
/// of the track.
pub fn next_window(
    start_ms: u64,
    total_ms: u64,
    max_duration_ms: u64,
    index: usize,
) -> ChunkWindow {
    ChunkWindow {
        index,
        start_ms,
        end_ms: start_ms.saturating_add(max_duration_ms).min(total_ms),
    }
}

/// The window schedule when no shrink retries fire.
pub fn plan_windows(total_ms: u64, max_duration_ms: u64) -> Vec<ChunkWindow> {
    let mut windows = Vec::new();
    if max_duration_ms == 0 {
        return windows;
    }

    let mut start_ms = 0;
    while start_ms < total_ms {
        let window = next_window(start_ms, total_ms, max_duration_ms, windows.len() + 1);
        start_ms = window.end_ms;
        windows.push(window);
    }
    windows
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: u64 = 60_000;

    #[test]
    fn test_plan_45_minutes_in_20_minute_windows() {
        let windows = plan_windows(45 * MINUTE, 20 * MINUTE);
        let bounds: Vec<_> = windows.iter().map(|w| (w.start_ms, w.end_ms)).collect();
        assert_eq!(
            bounds,
            vec![
                (0, 20 * MINUTE),
                (20 * MINUTE, 40 * MINUTE),
                (40 * MINUTE, 45 * MINUTE)
            ]
        );
        assert_eq!(
            windows.iter().map(|w| w.index).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_plan_short_track_single_window() {
        let windows = plan_windows(10 * MINUTE, 20 * MINUTE);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].end_ms, 10 * MINUTE);
    }

    #[test]
    fn test_plan_count_is_ceiling() {
        for (total, max) in [(1, 1), (999, 100), (1000, 100), (1001, 100), (7_654_321, 60_000)] {
            let windows = plan_windows(total, max);
            assert_eq!(windows.len() as u64, total.div_ceil(max), "total={total} max={max}");
            assert_eq!(windows.last().unwrap().end_ms, total);
            for pair in windows.windows(2) {
                assert_eq!(pair[0].end_ms, pair[1].start_ms);
            }
        }
    }

    #[test]
    fn test_plan_empty_track() {
        assert!(plan_windows(0, 1000).is_empty());
        assert!(plan_windows(1000, 0).is_empty());
    }

    #[test]
    fn test_shrink_duration_is_floor_of_ninety_percent() {
        assert_eq!(shrink_duration(20 * MINUTE), 18 * MINUTE);
        assert_eq!(shrink_duration(61_000), 54_900);
        assert_eq!(shrink_duration(61_001), 54_900);
        assert_eq!(shrink_duration(61_009), 54_908);
        assert_eq!(shrink_duration(u64::MAX), u64::MAX / 10 * 9 + 4);
    }

    #[test]
    fn test_shrunk_keeps_start() {
        let window = ChunkWindow {
            index: 2,
            start_ms: 20 * MINUTE,
            end_ms: 40 * MINUTE,
        };
        let shrunk = window.shrunk();
        assert_eq!(shrunk.start_ms, 20 * MINUTE);
        assert_eq!(shrunk.duration_ms(), 18 * MINUTE);
        assert_eq!(shrunk.index, 2);
    }

    #[test]
    fn test_shrunk_to_floor_clamps() {
        let window = ChunkWindow {
            index: 1,
            start_ms: 0,
            end_ms: 62_000,
        };
        assert_eq!(window.shrunk().duration_ms(), 55_800);
        assert_eq!(window.shrunk_to_floor().duration_ms(), MINUTE);
    }

    #[test]
    fn test_floor_boundary() {
        let at_floor = ChunkWindow {
            index: 1,
            start_ms: 0,
            end_ms: MINUTE,
        };
        assert!(!at_floor.above_floor());
        assert!(ChunkWindow { end_ms: MINUTE + 1, ..at_floor }.above_floor());
    }
}
