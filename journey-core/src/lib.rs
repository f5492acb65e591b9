/*!
# journey-core

**journey-core** builds a time-expanded graph from a normalized public
transport timetable and answers earliest-arrival queries on it, including
connections that run past midnight.

The timetable is a set of plain indexed sequences (stop areas, stop points,
route points, stop times, vehicle journeys) plus a registry of 366-day
validity patterns. The graph packs five vertex kinds into one dense index
space and wires in-vehicle, dwell, waiting and inter-route transfer edges;
queries run a label-setting expansion over it and return a renderable path.

# Example
```ignore
use journey_core::prelude::*;

let mut builder = TimetableBuilder::new();
builder
    .vj("morning express")
    .at("central", 8 * 3600)
    .at("harbour", 8 * 3600 + 900);
let mut data = builder.build();

let graph = build_graph(&mut data)?;
let path = compute(
    &graph,
    &data,
    &Query {
        origin: 0,
        destination: 1,
        departure: 8 * 3600 - 300,
        day: 0,
    },
);

for item in &path.items {
    println!("{item:?}");
}
```
*/

use thiserror::Error;

pub mod algo;
pub mod builder;
pub mod calendar;
pub mod graph;
pub mod model;
pub mod prelude;
pub mod session;
pub mod space;

/// Seconds in one calendar day.
pub const DAY_SECONDS: u32 = 86_400;

/// Minimum time between alighting and the next inter-route departure.
pub const MIN_TRANSFER_SECONDS: u32 = 5 * 60;

/// Error type for timetable validation, graph construction and the shared
/// data store.
#[derive(Error, Debug)]
pub enum Error {
    #[error("stop point {stop_point} references stop area {stop_area} out of range")]
    StopAreaOutOfRange { stop_point: usize, stop_area: usize },
    #[error("route point {route_point} references stop point {stop_point} out of range")]
    StopPointOutOfRange { route_point: usize, stop_point: usize },
    #[error("stop time {stop_time} references route point {route_point} out of range")]
    RoutePointOutOfRange { stop_time: usize, route_point: usize },
    #[error("vehicle journey {vehicle_journey} references stop time {stop_time} out of range")]
    StopTimeOutOfRange {
        vehicle_journey: usize,
        stop_time: usize,
    },
    #[error("vehicle journey {vehicle_journey} references validity pattern {pattern} out of range")]
    PatternOutOfRange {
        vehicle_journey: usize,
        pattern: u32,
    },
    #[error("validity pattern registry exhausted its 32-bit index space")]
    CalendarOverflow,
    #[error("dataset is loading")]
    LoaderInProgress,
    #[error("internal invariant violated: {0}")]
    Internal(String),
}
