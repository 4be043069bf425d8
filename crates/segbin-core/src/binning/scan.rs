//! Black-box boundary scanning for size -> bin functions.
//!
//! These helpers treat the mapping as opaque: they probe sizes with growing
//! strides and binary-search each bin change, so a full 64-bit scheme can be
//! walked in a few thousand calls. They check a mapping without trusting
//! its own inverse.

use thiserror::Error;

/// A mapping property the scan found broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScanViolation {
    #[error("scan starts in bin {found}, expected {expected}")]
    WrongFirstBin { expected: usize, found: usize },
    #[error("bin {found} at size {size} follows bin {previous}; bins must step by one")]
    NotDense {
        previous: usize,
        found: usize,
        size: u64,
    },
}

/// Calls `on_boundary(bin, size)` for every size in `start..=end` where
/// `size_to_bin` yields a different bin than at `size - 1`, plus once for
/// `start` itself.
///
/// `size_to_bin` is assumed monotonically non-decreasing; if it is not, the
/// reported boundaries are still in ascending size order but bins may repeat
/// or go backwards.
pub fn find_boundaries<F, C>(start: u64, end: u64, size_to_bin: F, mut on_boundary: C)
where
    F: Fn(u64) -> usize,
    C: FnMut(usize, u64),
{
    let mut size = start;
    let mut prev_size = start;
    let mut prev_bin: Option<usize> = None;
    let mut increment = 1u64;

    while size <= end {
        let mut bin = size_to_bin(size);

        if prev_bin != Some(bin) {
            if let Some(prev) = prev_bin {
                size = find_boundary(prev + 1, prev_size, size, &size_to_bin);
                bin = size_to_bin(size);
            }

            on_boundary(bin, size);

            increment = ((size - prev_size) / 4).max(1);
            prev_size = size;
            prev_bin = Some(bin);
        }

        if size == end {
            break;
        }
        size = size.saturating_add(increment).min(end);
    }
}

/// First size in `base..=acme` yielding a bin of at least `next_bin`.
///
/// - If nothing in range reaches `next_bin`, returns `acme`.
/// - If everything does, returns `base`.
fn find_boundary<F>(next_bin: usize, mut base: u64, mut acme: u64, size_to_bin: &F) -> u64
where
    F: Fn(u64) -> usize,
{
    while base < acme {
        let mid = base + (acme - base) / 2;
        if size_to_bin(mid) >= next_bin {
            acme = mid;
        } else {
            base = mid + 1;
        }
    }
    base
}

/// Walks `start..=end` and checks that bins begin at `first_bin` and then
/// step by exactly one at every boundary.
///
/// Returns the `(bin, first_size)` boundaries found.
pub fn check_dense<F>(
    start: u64,
    end: u64,
    first_bin: usize,
    size_to_bin: F,
) -> Result<Vec<(usize, u64)>, ScanViolation>
where
    F: Fn(u64) -> usize,
{
    let mut boundaries = Vec::new();
    let mut violation = None;

    find_boundaries(start, end, size_to_bin, |bin, size| {
        if violation.is_some() {
            return;
        }
        match boundaries.last().map(|&(previous, _)| previous) {
            None if bin != first_bin => {
                violation = Some(ScanViolation::WrongFirstBin {
                    expected: first_bin,
                    found: bin,
                });
            }
            Some(previous) if bin != previous + 1 => {
                violation = Some(ScanViolation::NotDense {
                    previous,
                    found: bin,
                    size,
                });
            }
            _ => boundaries.push((bin, size)),
        }
    });

    match violation {
        Some(v) => Err(v),
        None => Ok(boundaries),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: [usize; 12] = [0, 1, 1, 1, 2, 2, 2, 2, 2, 2, 3, 3];

    #[test]
    fn boundary_search() {
        let f = |s: u64| TABLE[s as usize];
        assert_eq!(find_boundary(2, 1, 3, &f), 3);
        assert_eq!(find_boundary(2, 3, 5, &f), 4);
        assert_eq!(find_boundary(2, 2, 4, &f), 4);
        assert_eq!(find_boundary(2, 4, 6, &f), 4);
        assert_eq!(find_boundary(2, 5, 7, &f), 5);
        assert_eq!(find_boundary(2, 0, 7, &f), 4);
        assert_eq!(find_boundary(4, 0, 11, &f), 11);
    }

    #[test]
    fn boundaries_of_small_table() {
        let mut found = Vec::new();
        find_boundaries(0, 11, |s| TABLE[s as usize], |bin, size| {
            found.push((bin, size));
        });
        assert_eq!(found, [(0, 0), (1, 1), (2, 4), (3, 10)]);
    }

    #[test]
    fn dense_table_passes() {
        let result = check_dense(0, 11, 0, |s| TABLE[s as usize]);
        assert_eq!(result, Ok(vec![(0, 0), (1, 1), (2, 4), (3, 10)]));
    }

    #[test]
    fn skipped_bin_is_reported() {
        let table = [0usize, 0, 1, 1, 3, 3, 4];
        let result = check_dense(0, 6, 0, |s| table[s as usize]);
        assert_eq!(
            result,
            Err(ScanViolation::NotDense {
                previous: 1,
                found: 3,
                size: 4
            })
        );
    }

    #[test]
    fn wrong_first_bin_is_reported() {
        let result = check_dense(0, 11, 5, |s| TABLE[s as usize]);
        assert_eq!(
            result,
            Err(ScanViolation::WrongFirstBin {
                expected: 5,
                found: 0
            })
        );
    }

    #[test]
    fn scan_reaches_end_of_u64() {
        let mut last = None;
        find_boundaries(1, u64::MAX, |s| s.ilog2() as usize, |bin, size| {
            last = Some((bin, size));
        });
        assert_eq!(last, Some((63, 1 << 63)));
    }
}
