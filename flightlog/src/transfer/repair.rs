//! Gap repair: turning a sparse chunk set into re-request byte ranges.
//!
//! Repair only runs after the link has been silent for a while. It looks at
//! the chunks received so far and decides what to ask for again:
//!
//! - No holes below the highest chunk: the tail was lost, so request
//!   everything after it.
//! - Holes below the highest chunk: request each maximal run of missing
//!   chunks, lowest first, up to a per-pass cap. Holes beyond the cap wait
//!   for a later pass.

use super::tracker::ChunkTracker;
use super::{CHUNK_SIZE, FULL_RANGE};

/// A byte range to request from the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte offset.
    pub offset: u32,
    /// Number of bytes, or [`FULL_RANGE`] for "to end of file".
    pub length: u32,
}

impl ByteRange {
    /// Range covering the inclusive chunk run `start..=end`.
    pub fn for_chunks(start: u32, end: u32) -> Self {
        Self {
            offset: start * CHUNK_SIZE,
            length: (end + 1 - start) * CHUNK_SIZE,
        }
    }

    /// Range from `offset` to the end of the file.
    pub fn to_end(offset: u32) -> Self {
        Self {
            offset,
            length: FULL_RANGE,
        }
    }

    /// Check whether the range runs to the end of the file.
    pub fn is_open_ended(&self) -> bool {
        self.length == FULL_RANGE
    }
}

/// Outcome of a repair pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairPlan {
    /// Nothing received yet; there is nothing to infer a gap against.
    Nothing,
    /// Contiguous prefix received but no terminal chunk; ask for the tail.
    Tail(ByteRange),
    /// Re-request these holes, lowest offset first.
    Gaps(Vec<ByteRange>),
}

impl RepairPlan {
    /// The requests this plan issues, in order.
    pub fn requests(&self) -> Vec<ByteRange> {
        match self {
            RepairPlan::Nothing => Vec::new(),
            RepairPlan::Tail(range) => vec![*range],
            RepairPlan::Gaps(ranges) => ranges.clone(),
        }
    }
}

/// Plan the re-requests for the chunks received so far.
///
/// At most `max_requests` gap ranges are planned; a cap of 0 is treated as 1
/// so repair always makes progress.
pub fn plan_repair(tracker: &ChunkTracker, max_requests: usize) -> RepairPlan {
    let Some(highest) = tracker.highest() else {
        return RepairPlan::Nothing;
    };

    let runs = tracker.missing_runs();
    if runs.is_empty() {
        return RepairPlan::Tail(ByteRange::to_end((highest + 1) * CHUNK_SIZE));
    }

    RepairPlan::Gaps(
        runs.into_iter()
            .take(max_requests.max(1))
            .map(|(start, end)| ByteRange::for_chunks(start, end))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::DEFAULT_MAX_REPAIR_REQUESTS;

    fn tracker_of(indices: impl IntoIterator<Item = u32>) -> ChunkTracker {
        let mut tracker = ChunkTracker::new();
        for i in indices {
            tracker.insert(i);
        }
        tracker
    }

    #[test]
    fn test_empty_tracker_plans_nothing() {
        let plan = plan_repair(&ChunkTracker::new(), DEFAULT_MAX_REPAIR_REQUESTS);
        assert_eq!(plan, RepairPlan::Nothing);
        assert!(plan.requests().is_empty());
    }

    #[test]
    fn test_contiguous_prefix_requests_tail() {
        let plan = plan_repair(&tracker_of(0..3), DEFAULT_MAX_REPAIR_REQUESTS);
        assert_eq!(plan, RepairPlan::Tail(ByteRange::to_end(270)));
        assert!(plan.requests()[0].is_open_ended());
    }

    #[test]
    fn test_single_chunk_requests_tail() {
        let plan = plan_repair(&tracker_of([0]), DEFAULT_MAX_REPAIR_REQUESTS);
        assert_eq!(plan, RepairPlan::Tail(ByteRange::to_end(90)));
    }

    #[test]
    fn test_dropped_middle_chunk() {
        let plan = plan_repair(&tracker_of([0, 2]), DEFAULT_MAX_REPAIR_REQUESTS);
        assert_eq!(
            plan,
            RepairPlan::Gaps(vec![ByteRange {
                offset: 90,
                length: 90
            }])
        );
    }

    #[test]
    fn test_runs_are_coalesced() {
        let plan = plan_repair(&tracker_of([0, 4, 7]), DEFAULT_MAX_REPAIR_REQUESTS);
        assert_eq!(
            plan.requests(),
            vec![
                ByteRange {
                    offset: 90,
                    length: 270
                },
                ByteRange {
                    offset: 450,
                    length: 180
                },
            ]
        );
    }

    #[test]
    fn test_cap_limits_requests_to_lowest_runs() {
        // Every other chunk received: 30 single-chunk holes.
        let tracker = tracker_of((0..=60).step_by(2));
        let requests = plan_repair(&tracker, 20).requests();

        assert_eq!(requests.len(), 20);
        assert_eq!(requests[0].offset, 90);
        assert_eq!(requests[19].offset, 39 * 90);
    }

    #[test]
    fn test_zero_cap_still_makes_progress() {
        let requests = plan_repair(&tracker_of([0, 2, 4]), 0).requests();
        assert_eq!(requests.len(), 1);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;
        use std::collections::BTreeSet;

        proptest! {
            #[test]
            fn test_gap_ranges_cover_missing_exactly(
                received in prop::collection::btree_set(0u32..400, 1..120)
            ) {
                let tracker = tracker_of(received.iter().copied());
                let highest = *received.iter().next_back().unwrap();
                let plan = plan_repair(&tracker, usize::MAX);

                let expected: BTreeSet<u32> =
                    (0..highest).filter(|i| !received.contains(i)).collect();

                match plan {
                    RepairPlan::Tail(range) => {
                        prop_assert!(expected.is_empty());
                        prop_assert_eq!(range.offset, (highest + 1) * CHUNK_SIZE);
                    }
                    RepairPlan::Gaps(ranges) => {
                        let mut covered = BTreeSet::new();
                        let mut last_offset = None;
                        for range in &ranges {
                            prop_assert_eq!(range.offset % CHUNK_SIZE, 0);
                            prop_assert_eq!(range.length % CHUNK_SIZE, 0);
                            prop_assert!(last_offset.map_or(true, |o| o < range.offset));
                            last_offset = Some(range.offset);

                            let first = range.offset / CHUNK_SIZE;
                            let count = range.length / CHUNK_SIZE;
                            for i in first..first + count {
                                prop_assert!(covered.insert(i), "chunk {} requested twice", i);
                            }
                        }
                        prop_assert_eq!(covered, expected);
                    }
                    RepairPlan::Nothing => prop_assert!(false, "non-empty tracker planned nothing"),
                }
            }

            #[test]
            fn test_gap_requests_respect_cap(
                received in prop::collection::btree_set(0u32..400, 1..120),
                cap in 1usize..25
            ) {
                let tracker = tracker_of(received.iter().copied());
                let requests = plan_repair(&tracker, cap).requests();
                prop_assert!(requests.len() <= cap);
                prop_assert!(!requests.is_empty());
            }
        }
    }
}
