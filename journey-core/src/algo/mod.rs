//! Earliest-arrival queries over the built graph and the itinerary
//! post-processing that turns a raw path into renderable legs.

pub mod itinerary;
pub mod query;

pub use itinerary::{legs, make_itinerary, Leg, Path, PathItem};
pub use query::{compute, compute_many, Query};

use std::cmp::Ordering;

/// `MinScored<K, T>` holds a score `K` and a scored object `T` in a pair
/// for use with a `BinaryHeap`.
///
/// `MinScored` compares in reverse order by the score, so that the heap
/// behaves as a min-heap and pops the entry with the least score first.
/// This implementation is based on the one in the [`petgraph`] crate.
pub(crate) struct MinScored<K, T>(pub K, pub T);

impl<K: Ord, T> PartialEq for MinScored<K, T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<K: Ord, T> Eq for MinScored<K, T> {}

impl<K: Ord, T> PartialOrd for MinScored<K, T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord, T> Ord for MinScored<K, T> {
    fn cmp(&self, other: &Self) -> Ordering {
        other.0.cmp(&self.0)
    }
}
