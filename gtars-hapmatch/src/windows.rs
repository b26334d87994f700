use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::errors::{HapMatchError, Result};

/// A half-open range `[start, end)` of variant indices processed as one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub index: usize,
    pub start: usize,
    pub end: usize,
}

impl Window {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn contains(&self, variant: usize) -> bool {
        self.range().contains(&variant)
    }
}

///
/// Split variants into windows spanning roughly `window_size` base pairs each.
///
/// A window starts at some variant and takes every following variant whose position is
/// less than the first variant's position plus `window_size`. The windows are contiguous
/// and together cover every variant.
///
/// The second variant may already open a new window, and the trailing window is always
/// emitted even when it is shorter than `window_size`.
///
/// # Arguments
/// - positions: base-pair positions of the variants, in ascending order
/// - window_size: span of each window in base pairs
///
pub fn partition_windows(positions: &[u64], window_size: u64) -> Result<Vec<Window>> {
    if window_size == 0 {
        return Err(HapMatchError::InvalidWindowSize);
    }

    let Some(&first) = positions.first() else {
        return Ok(Vec::new());
    };

    let mut windows = Vec::new();
    let mut start = 0;
    let mut boundary = first.saturating_add(window_size);

    for (i, &position) in positions.iter().enumerate().skip(1) {
        if position < boundary {
            continue;
        }
        windows.push(Window {
            index: windows.len(),
            start,
            end: i,
        });
        start = i;
        boundary = position.saturating_add(window_size);
    }

    windows.push(Window {
        index: windows.len(),
        start,
        end: positions.len(),
    });

    Ok(windows)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn bounds(windows: &[Window]) -> Vec<(usize, usize)> {
        windows.iter().map(|w| (w.start, w.end)).collect()
    }

    #[rstest]
    fn test_partition_windows() {
        let positions = [100, 150, 199, 200, 260, 420, 421, 900];
        let windows = partition_windows(&positions, 100).unwrap();

        assert_eq!(bounds(&windows), vec![(0, 3), (3, 5), (5, 7), (7, 8)]);
        assert_eq!(
            windows.iter().map(|w| w.index).collect::<Vec<_>>(),
            vec![0, 1, 2, 3]
        );
    }

    #[rstest]
    fn test_partition_windows_cover_all_variants() {
        let positions: Vec<u64> = (0..1000).map(|i| i * 37 % 50_000 + i * 13).collect();
        let mut sorted = positions.clone();
        sorted.sort();

        let windows = partition_windows(&sorted, 1_000).unwrap();
        assert_eq!(windows.first().unwrap().start, 0);
        assert_eq!(windows.last().unwrap().end, sorted.len());
        for pair in windows.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
            assert!(!pair[0].is_empty());
        }
    }

    #[rstest]
    fn test_second_variant_boundary_and_short_tail() {
        let windows = partition_windows(&[100, 500, 510], 100).unwrap();
        assert_eq!(bounds(&windows), vec![(0, 1), (1, 3)]);
    }

    #[rstest]
    fn test_single_window() {
        let windows = partition_windows(&[5, 6, 7], 1_000).unwrap();
        assert_eq!(bounds(&windows), vec![(0, 3)]);
        assert_eq!(windows[0].len(), 3);
        assert!(windows[0].contains(2));
        assert!(!windows[0].contains(3));
    }

    #[rstest]
    fn test_empty_positions() {
        assert_eq!(partition_windows(&[], 10).unwrap(), Vec::<Window>::new());
    }

    #[rstest]
    fn test_zero_window_size() {
        assert!(matches!(
            partition_windows(&[1, 2], 0),
            Err(HapMatchError::InvalidWindowSize)
        ));
    }
}
