use crate::tt::Trip;
use std::collections::HashMap;

/// Travel-time acceptance window in minutes. Values outside it are corrupt
/// records, not slow vehicles; both bounds come from observed data and stay
/// adjustable.
pub const MIN_TRAVEL_MINUTES: u32 = 1;
pub const MAX_TRAVEL_MINUTES: u32 = 60;

/// Directed travel-time samples between stop indices, accumulated across all
/// trips of one file.
#[derive(Debug, Clone, Default)]
pub struct EdgeSet {
    samples: HashMap<(usize, usize), Vec<u32>>,
}

impl EdgeSet {
    /// Collects every consecutive stop pair of every trip. Self-loops and
    /// out-of-window travel times are dropped.
    pub fn from_trips(trips: &[Trip]) -> Self {
        let mut samples: HashMap<(usize, usize), Vec<u32>> = HashMap::new();
        for trip in trips {
            for pair in trip.calls.windows(2) {
                let (from, to) = (pair[0], pair[1]);
                if from.stop_idx == to.stop_idx {
                    continue;
                }
                let travel = to.minute.saturating_sub(from.minute);
                if !(MIN_TRAVEL_MINUTES..=MAX_TRAVEL_MINUTES).contains(&travel) {
                    continue;
                }
                samples.entry((from.stop_idx, to.stop_idx)).or_default().push(travel);
            }
        }
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn total_samples(&self) -> usize {
        self.samples.values().map(Vec::len).sum()
    }

    pub fn get(&self, from: usize, to: usize) -> Option<&[u32]> {
        self.samples.get(&(from, to)).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &[u32])> {
        self.samples
            .iter()
            .map(|(&key, times)| (key, times.as_slice()))
    }
}

#[cfg(test)]
use crate::tt::Call;

#[cfg(test)]
fn trip(calls: &[(usize, u32)]) -> Trip {
    Trip {
        calls: calls
            .iter()
            .map(|&(stop_idx, minute)| Call { stop_idx, minute })
            .collect(),
    }
}

#[test]
fn edge_accumulation_test() {
    // The three-trip shape from a small morning schedule: A-B-C, A-B, B-C.
    let trips = [
        trip(&[(0, 480), (1, 485), (2, 491)]),
        trip(&[(0, 495), (1, 501)]),
        trip(&[(1, 510), (2, 516)]),
    ];
    let edges = EdgeSet::from_trips(&trips);
    assert_eq!(edges.get(0, 1), Some([5u32, 6].as_slice()));
    assert_eq!(edges.get(1, 2), Some([6u32, 6].as_slice()));
    assert_eq!(edges.len(), 2);
    assert_eq!(edges.total_samples(), 4);
}

#[test]
fn edge_rejects_self_loop_test() {
    let trips = [trip(&[(3, 480), (3, 485), (4, 490)])];
    let edges = EdgeSet::from_trips(&trips);
    assert!(edges.get(3, 3).is_none());
    assert_eq!(edges.get(3, 4), Some([5u32].as_slice()));
}

#[test]
fn edge_rejects_out_of_window_test() {
    let trips = [
        // Zero minutes and beyond an hour are both data errors.
        trip(&[(0, 480), (1, 480)]),
        trip(&[(2, 480), (3, 545)]),
    ];
    let edges = EdgeSet::from_trips(&trips);
    assert!(edges.is_empty());
}

#[test]
fn edge_window_bounds_test() {
    let trips = [trip(&[(0, 480), (1, 481), (2, 541)])];
    let edges = EdgeSet::from_trips(&trips);
    assert_eq!(edges.get(0, 1), Some([1u32].as_slice()));
    assert_eq!(edges.get(1, 2), Some([60u32].as_slice()));
}
