//! Greedy lane assignment for overlapping intervals.
//!
//! Intervals are half-open (`[start, end)`), so back-to-back appointments can
//! share a lane. Works on any ordered time point; the timeline uses
//! `DateTime<Utc>`.

/// A half-open interval on some ordered axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span<T> {
    pub start: T,
    pub end: T,
}

impl<T: Ord + Copy> Span<T> {
    pub fn new(start: T, end: T) -> Self {
        Span { start, end }
    }

    pub fn is_positive(&self) -> bool {
        self.end > self.start
    }

    pub fn overlaps(&self, other: &Span<T>) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Result of a lane assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneAssignment {
    /// Lane per input interval, in input order. `None` for intervals that
    /// were skipped because `end <= start`.
    pub lanes: Vec<Option<usize>>,
    /// Number of lanes actually used (drives row height)
    pub lane_count: usize,
    /// True when at least one interval was forced into the last lane
    pub overflowed: bool,
}

/// Assign every interval a lane so that intervals sharing a lane do not
/// overlap, opening at most `cap` lanes.
///
/// Intervals are placed in ascending start order, longer first on equal
/// starts. Each goes into the first lane whose latest end is at or before its
/// start. When no lane is free and `cap` lanes are open, the interval is
/// forced into the last lane. A `cap` of zero behaves like one.
pub fn assign_lanes<T: Ord + Copy>(spans: &[Span<T>], cap: usize) -> LaneAssignment {
    let cap = cap.max(1);

    let mut order: Vec<usize> = (0..spans.len()).filter(|&i| spans[i].is_positive()).collect();
    // Equal starts: the later end is the longer interval
    order.sort_by(|&a, &b| {
        spans[a]
            .start
            .cmp(&spans[b].start)
            .then_with(|| spans[b].end.cmp(&spans[a].end))
            .then_with(|| a.cmp(&b))
    });

    let mut lane_ends: Vec<T> = Vec::new();
    let mut lanes = vec![None; spans.len()];
    let mut overflowed = false;

    for i in order {
        let span = spans[i];

        let lane = match lane_ends.iter().position(|end| *end <= span.start) {
            Some(free) => {
                lane_ends[free] = span.end;
                free
            }
            None if lane_ends.len() < cap => {
                lane_ends.push(span.end);
                lane_ends.len() - 1
            }
            None => {
                overflowed = true;
                let last = lane_ends.len() - 1;
                lane_ends[last] = lane_ends[last].max(span.end);
                last
            }
        };

        lanes[i] = Some(lane);
    }

    LaneAssignment {
        lanes,
        lane_count: lane_ends.len(),
        overflowed,
    }
}

/// Largest number of positive intervals covering a single instant, i.e. the
/// fewest lanes that could hold them without overlap.
pub fn max_concurrency<T: Ord + Copy>(spans: &[Span<T>]) -> usize {
    // (time, delta): ends sort before starts at the same instant
    let mut edges: Vec<(T, i32)> = spans
        .iter()
        .filter(|s| s.is_positive())
        .flat_map(|s| [(s.start, 1), (s.end, -1)])
        .collect();
    edges.sort();

    let mut current = 0i32;
    let mut peak = 0i32;
    for (_, delta) in edges {
        current += delta;
        peak = peak.max(current);
    }
    peak as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minutes since midnight
    fn span(start: (u32, u32), end: (u32, u32)) -> Span<u32> {
        Span::new(start.0 * 60 + start.1, end.0 * 60 + end.1)
    }

    fn assert_no_shared_overlap(spans: &[Span<u32>], result: &LaneAssignment, allow_last: bool) {
        for i in 0..spans.len() {
            for j in (i + 1)..spans.len() {
                let (Some(a), Some(b)) = (result.lanes[i], result.lanes[j]) else {
                    continue;
                };
                if a != b || !spans[i].overlaps(&spans[j]) {
                    continue;
                }
                assert!(
                    allow_last && a == result.lane_count - 1,
                    "intervals {i} and {j} overlap in lane {a}"
                );
            }
        }
    }

    #[test]
    fn back_to_back_jobs_share_a_lane() {
        let spans = [span((9, 0), (10, 0)), span((9, 30), (11, 0)), span((10, 0), (10, 30))];
        let result = assign_lanes(&spans, 6);

        assert_eq!(result.lane_count, 2);
        assert_eq!(result.lanes, vec![Some(0), Some(1), Some(0)]);
        assert!(!result.overflowed);
    }

    #[test]
    fn longer_job_claims_lane_on_equal_start() {
        let spans = [span((9, 0), (9, 30)), span((9, 0), (12, 0)), span((9, 30), (10, 0))];
        let result = assign_lanes(&spans, 6);

        // The 3h job goes first and takes lane 0; the short ones chain in lane 1
        assert_eq!(result.lanes, vec![Some(1), Some(0), Some(1)]);
        assert_eq!(result.lane_count, 2);
    }

    #[test]
    fn unordered_input_keeps_input_positions() {
        let spans = [span((13, 0), (14, 0)), span((8, 0), (9, 0)), span((8, 30), (13, 30))];
        let result = assign_lanes(&spans, 6);

        assert_eq!(result.lanes, vec![Some(0), Some(0), Some(1)]);
    }

    #[test]
    fn cap_forces_overflow_into_last_lane() {
        let spans = [
            span((9, 0), (12, 0)),
            span((9, 0), (11, 0)),
            span((9, 0), (10, 0)),
            span((9, 15), (9, 45)),
        ];
        let result = assign_lanes(&spans, 2);

        assert_eq!(result.lane_count, 2);
        assert!(result.overflowed);
        assert_eq!(result.lanes[0], Some(0));
        assert_eq!(result.lanes[1], Some(1));
        assert_eq!(result.lanes[2], Some(1));
        assert_eq!(result.lanes[3], Some(1));
        assert_no_shared_overlap(&spans, &result, true);
    }

    #[test]
    fn zero_cap_behaves_like_one() {
        let spans = [span((9, 0), (10, 0)), span((9, 30), (10, 30))];
        let result = assign_lanes(&spans, 0);

        assert_eq!(result.lane_count, 1);
        assert!(result.overflowed);
    }

    #[test]
    fn non_positive_intervals_get_no_lane() {
        let spans = [span((9, 0), (9, 0)), span((10, 0), (9, 0)), span((9, 0), (10, 0))];
        let result = assign_lanes(&spans, 6);

        assert_eq!(result.lanes, vec![None, None, Some(0)]);
        assert_eq!(result.lane_count, 1);
    }

    #[test]
    fn empty_input_uses_no_lanes() {
        let result = assign_lanes::<u32>(&[], 6);
        assert_eq!(result.lane_count, 0);
        assert!(result.lanes.is_empty());
    }

    #[test]
    fn max_concurrency_treats_touching_ends_as_free() {
        let spans = [span((9, 0), (10, 0)), span((10, 0), (11, 0)), span((9, 30), (10, 30))];
        assert_eq!(max_concurrency(&spans), 2);
    }

    #[test]
    fn lane_count_matches_minimum_on_generated_days() {
        // Deterministic pseudo-random days of 1..12 jobs between 07:00 and 21:00
        let mut seed: u64 = 0x5eed;
        let mut next = || {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (seed >> 33) as u32
        };

        for _ in 0..300 {
            let count = 1 + next() % 12;
            let spans: Vec<Span<u32>> = (0..count)
                .map(|_| {
                    let start = 7 * 60 + (next() % (13 * 4)) * 15;
                    let length = 15 + (next() % 16) * 15;
                    Span::new(start, (start + length).min(21 * 60))
                })
                .collect();

            let unbounded = assign_lanes(&spans, usize::MAX);
            assert_eq!(unbounded.lane_count, max_concurrency(&spans));
            assert!(!unbounded.overflowed);
            assert_no_shared_overlap(&spans, &unbounded, false);

            let capped = assign_lanes(&spans, 3);
            assert!(capped.lane_count <= 3);
            assert_eq!(capped.lane_count, max_concurrency(&spans).min(3));
            assert_no_shared_overlap(&spans, &capped, true);
        }
    }
}
