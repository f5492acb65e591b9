//! Path records and the rendering-oriented post-processing.
//!
//! [`compute`](crate::algo::query::compute) emits one item per boarding and
//! one per in-vehicle arrival. [`make_itinerary`] collapses every run of
//! consecutive same-line items down to its boarding and alighting ends, and
//! [`legs`] regroups the compressed path at stop-area transitions.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// One event of a journey: being at a stop area at a given time, on a given
/// line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathItem {
    pub stop_area: u32,
    /// Seconds of day in `[0, 86400)`.
    pub seconds: u32,
    pub day: u32,
    /// Vehicle journey the traveller is on at this event.
    pub line: u32,
}

/// Ordered list of journey events; empty when no journey exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    pub items: Vec<PathItem>,
}

impl Path {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Arrival event of the whole journey.
    #[must_use]
    pub fn arrival(&self) -> Option<&PathItem> {
        self.items.last()
    }
}

/// One continuous in-vehicle segment of a compressed path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Leg {
    pub line: u32,
    pub board: PathItem,
    pub alight: PathItem,
}

/// Two legs are interchangeable when they use the same line and alight at
/// the same stop area.
impl PartialEq for Leg {
    fn eq(&self, other: &Self) -> bool {
        self.line == other.line && self.alight.stop_area == other.alight.stop_area
    }
}

impl Eq for Leg {}

/// Collapses every maximal run of same-line items to its first (departure)
/// and last (arrival) item. Idempotent.
#[must_use]
pub fn make_itinerary(path: &Path) -> Path {
    let mut items = Vec::new();
    let mut start = 0;
    while start < path.items.len() {
        let line = path.items[start].line;
        let mut end = start;
        while end + 1 < path.items.len() && path.items[end + 1].line == line {
            end += 1;
        }
        items.push(path.items[start]);
        if end > start {
            items.push(path.items[end]);
        }
        start = end + 1;
    }
    Path { items }
}

/// The journey as boarding/alighting pairs, one per continuous in-vehicle
/// segment.
#[must_use]
pub fn legs(path: &Path) -> Vec<Leg> {
    make_itinerary(path)
        .items
        .into_iter()
        .tuples()
        .map(|(board, alight)| Leg {
            line: board.line,
            board,
            alight,
        })
        .collect()
}
