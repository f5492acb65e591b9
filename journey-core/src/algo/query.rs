//! Label-setting earliest-arrival expansion.
//!
//! Labels carry the journey state: whether the traveller has boarded yet,
//! the seconds-of-day position (always below 86 400, with an absolute day
//! counter), the elapsed travel time and the current vehicle. The frontier
//! pops the earliest `(day, seconds)` first, ties broken by fewer vehicle
//! changes, then lower elapsed time. Reachability is bounded by one day
//! rollover past the query day.

use std::collections::BinaryHeap;

use hashbrown::hash_map::Entry::{Occupied, Vacant};
use hashbrown::{HashMap, HashSet};
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::algo::itinerary::{Path, PathItem};
use crate::algo::MinScored;
use crate::calendar::PatternRegistry;
use crate::graph::{EdgeDesc, EdgeKind, TransitGraph};
use crate::model::TransitData;
use crate::space::VertexKind;
use crate::DAY_SECONDS;

/// One earliest-arrival request between two stop areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub origin: usize,
    pub destination: usize,
    /// Seconds of day at which the traveller is ready to leave.
    pub departure: u32,
    /// Calendar day of the validity period.
    pub day: u32,
}

/// Journey state attached to a vertex during the expansion.
#[derive(Debug, Clone, Copy)]
struct Label {
    started: bool,
    /// Seconds of day, kept in `[0, 86400)`.
    at: u32,
    /// Absolute day; grows on past-midnight traversals.
    day: u32,
    /// Elapsed seconds since the first boarding.
    time: u32,
    vehicle_journey: Option<u32>,
    changes: u32,
}

/// Frontier ordering of a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Rank {
    day: u32,
    at: u32,
    changes: u32,
    time: u32,
}

impl Label {
    fn rank(&self) -> Rank {
        Rank {
            day: self.day,
            at: self.at,
            changes: self.changes,
            time: self.time,
        }
    }
}

/// Record of an in-vehicle traversal, kept on the parent pointer so the
/// path can be rebuilt without touching the timetable again.
#[derive(Debug, Clone, Copy)]
struct Hop {
    vehicle_journey: u32,
    /// True when the traveller boarded or changed vehicles on this hop.
    boarded: bool,
    departure: u32,
    departure_day: u32,
    arrival: u32,
    arrival_day: u32,
}

struct Relaxed {
    label: Label,
    hop: Option<Hop>,
}

/// Applies one edge to a label. `None` means the edge is infeasible under
/// this label (missed departure, calendar miss, or past the horizon).
fn relax(edge: &EdgeDesc, label: &Label, calendar: &PatternRegistry, horizon: u32) -> Option<Relaxed> {
    if !edge.timed {
        // structural links, waiting chains and transfers move the traveller
        // without consuming time
        return Some(Relaxed {
            label: *label,
            hop: None,
        });
    }

    let vehicle_journey = edge.vehicle_journey?;
    let start = edge.start_time % DAY_SECONDS;
    let end = edge.end_time % DAY_SECONDS;
    let leg = (end + DAY_SECONDS - start) % DAY_SECONDS;
    let cross = u32::from(start > end);

    if !label.started {
        if edge.kind != EdgeKind::TdTa {
            // before boarding, everything except a departure propagates the
            // label unchanged
            return Some(Relaxed {
                label: *label,
                hop: None,
            });
        }
        if label.at > start {
            return None;
        }
        let arrival_day = label.day + cross;
        if arrival_day > horizon || !calendar.is_valid(edge.pattern, arrival_day as usize) {
            return None;
        }
        return Some(Relaxed {
            label: Label {
                started: true,
                at: end,
                day: arrival_day,
                time: leg,
                vehicle_journey: Some(vehicle_journey),
                changes: 0,
            },
            hop: Some(Hop {
                vehicle_journey,
                boarded: true,
                departure: start,
                departure_day: label.day,
                arrival: end,
                arrival_day,
            }),
        });
    }

    // a missed departure rolls over to the next day at most once; the
    // horizon check cuts anything further
    let (departure_day, wait) = if label.at <= start {
        (label.day, start - label.at)
    } else {
        (label.day + 1, DAY_SECONDS - label.at + start)
    };
    let arrival_day = departure_day + cross;
    if arrival_day > horizon || !calendar.is_valid(edge.pattern, arrival_day as usize) {
        return None;
    }

    let changed = label.vehicle_journey != Some(vehicle_journey);
    let time = label.time + leg + if changed { wait } else { 0 };
    let changes = label.changes + u32::from(changed && edge.kind == EdgeKind::TdTa);
    let hop = (edge.kind == EdgeKind::TdTa).then_some(Hop {
        vehicle_journey,
        boarded: changed,
        departure: start,
        departure_day,
        arrival: end,
        arrival_day,
    });
    Some(Relaxed {
        label: Label {
            started: true,
            at: end,
            day: arrival_day,
            time,
            vehicle_journey: Some(vehicle_journey),
            changes,
        },
        hop,
    })
}

/// A vertex together with the journey state of the label sitting on it.
/// Keeping the two states apart lets an in-journey traveller pass through
/// vertices the pre-boarding expansion has already settled.
type LabelKey = (NodeIndex, bool);

/// Earliest-arrival path between two stop areas. Empty when the destination
/// cannot be reached before the end of the next day, or when the query is
/// degenerate (same origin and destination, indices out of range).
#[must_use]
pub fn compute(graph: &TransitGraph, data: &TransitData, query: &Query) -> Path {
    let stop_areas = data.stop_areas.len();
    if query.origin == query.destination
        || query.origin >= stop_areas
        || query.destination >= stop_areas
    {
        return Path::default();
    }

    let origin = graph.node_of(VertexKind::StopArea, query.origin);
    let horizon = query.day + 1;

    let mut labels: HashMap<LabelKey, Label> = HashMap::new();
    let mut parents: HashMap<LabelKey, (LabelKey, Option<Hop>)> = HashMap::new();
    let mut visited: HashSet<LabelKey> = HashSet::new();
    let mut frontier = BinaryHeap::new();

    let seed = Label {
        started: false,
        at: query.departure % DAY_SECONDS,
        day: query.day,
        time: 0,
        vehicle_journey: None,
        changes: 0,
    };
    let seed_key = (origin, false);
    labels.insert(seed_key, seed);
    frontier.push(MinScored(seed.rank(), seed_key));

    while let Some(MinScored(_, key)) = frontier.pop() {
        if !visited.insert(key) {
            continue;
        }
        let Some(&label) = labels.get(&key) else {
            continue;
        };
        let (node, _) = key;

        if label.started && graph[node].stop_area as usize == query.destination {
            trace!(vertex = node.index(), day = label.day, at = label.at, "destination settled");
            return rebuild(graph, &parents, seed_key, key);
        }

        for edge in graph.edges(node) {
            let Some(relaxed) = relax(edge.weight(), &label, &data.calendar, horizon) else {
                continue;
            };
            let next = (edge.target(), relaxed.label.started);
            if visited.contains(&next) {
                continue;
            }
            match labels.entry(next) {
                Occupied(mut entry) => {
                    if relaxed.label.rank() < entry.get().rank() {
                        entry.insert(relaxed.label);
                        parents.insert(next, (key, relaxed.hop));
                        frontier.push(MinScored(relaxed.label.rank(), next));
                    }
                }
                Vacant(entry) => {
                    entry.insert(relaxed.label);
                    parents.insert(next, (key, relaxed.hop));
                    frontier.push(MinScored(relaxed.label.rank(), next));
                }
            }
        }
    }

    Path::default()
}

/// Answers a batch of queries in parallel over the same immutable graph.
#[must_use]
pub fn compute_many(graph: &TransitGraph, data: &TransitData, queries: &[Query]) -> Vec<Path> {
    queries
        .par_iter()
        .map(|query| compute(graph, data, query))
        .collect()
}

/// Walks the parent pointers back from the settled vertex and emits path
/// items in departure order: one item at each boarding, one per in-vehicle
/// arrival.
fn rebuild(
    graph: &TransitGraph,
    parents: &HashMap<LabelKey, (LabelKey, Option<Hop>)>,
    seed: LabelKey,
    settled: LabelKey,
) -> Path {
    let mut hops = Vec::new();
    let mut current = settled;
    while current != seed {
        let Some(&(previous, hop)) = parents.get(&current) else {
            break;
        };
        if let Some(hop) = hop {
            hops.push((previous.0, current.0, hop));
        }
        current = previous;
    }
    hops.reverse();

    let mut items = Vec::new();
    for (from, to, hop) in hops {
        if hop.boarded {
            items.push(PathItem {
                stop_area: graph[from].stop_area,
                seconds: hop.departure,
                day: hop.departure_day,
                line: hop.vehicle_journey,
            });
        }
        items.push(PathItem {
            stop_area: graph[to].stop_area,
            seconds: hop.arrival,
            day: hop.arrival_day,
            line: hop.vehicle_journey,
        });
    }
    Path { items }
}
