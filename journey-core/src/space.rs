//! Packed vertex addressing.
//!
//! Every vertex of the time-expanded graph lives in one dense index space,
//! a concatenation of five blocks in this exact order:
//!
//! ```text
//! [stop areas][stop points][route points][arrivals][departures]
//! ```
//!
//! The arrival and departure blocks are both as long as the stop-time
//! sequence: stop time `i` owns arrival vertex `i` and departure vertex `i`
//! of their respective blocks. All mappings are pure functions of the
//! dataset shape and stay constant for the life of a graph.

use crate::model::TransitData;

/// Closed set of vertex kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexKind {
    StopArea,
    StopPoint,
    RoutePoint,
    Arrival,
    Departure,
}

/// Block boundaries of the vertex index space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VertexSpace {
    stop_areas: usize,
    stop_points: usize,
    route_points: usize,
    stop_times: usize,
}

impl VertexSpace {
    #[must_use]
    pub fn of(data: &TransitData) -> Self {
        VertexSpace {
            stop_areas: data.stop_areas.len(),
            stop_points: data.stop_points.len(),
            route_points: data.route_points.len(),
            stop_times: data.stop_times.len(),
        }
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.stop_areas + self.stop_points + self.route_points + 2 * self.stop_times
    }

    /// Packed vertex id of `(kind, local)`.
    #[must_use]
    pub fn vid_of(&self, kind: VertexKind, local: usize) -> usize {
        match kind {
            VertexKind::StopArea => local,
            VertexKind::StopPoint => self.stop_areas + local,
            VertexKind::RoutePoint => self.stop_areas + self.stop_points + local,
            VertexKind::Arrival => self.stop_areas + self.stop_points + self.route_points + local,
            VertexKind::Departure => {
                self.stop_areas + self.stop_points + self.route_points + self.stop_times + local
            }
        }
    }

    /// Kind and local index of a packed vertex id.
    #[must_use]
    pub fn local_of(&self, vid: usize) -> (VertexKind, usize) {
        let mut rest = vid;
        if rest < self.stop_areas {
            return (VertexKind::StopArea, rest);
        }
        rest -= self.stop_areas;
        if rest < self.stop_points {
            return (VertexKind::StopPoint, rest);
        }
        rest -= self.stop_points;
        if rest < self.route_points {
            return (VertexKind::RoutePoint, rest);
        }
        rest -= self.route_points;
        if rest < self.stop_times {
            return (VertexKind::Arrival, rest);
        }
        (VertexKind::Departure, rest - self.stop_times)
    }

    #[must_use]
    pub fn kind_of(&self, vid: usize) -> VertexKind {
        self.local_of(vid).0
    }

    /// Stop area a vertex belongs to: identity for stop areas, one hop for
    /// stop points, and through the stop-point chain for the rest.
    #[must_use]
    pub fn stop_area_of(&self, vid: usize, data: &TransitData) -> usize {
        let (kind, local) = self.local_of(vid);
        match kind {
            VertexKind::StopArea => local,
            VertexKind::StopPoint => data.stop_points[local].stop_area,
            VertexKind::RoutePoint => {
                data.stop_points[data.route_points[local].stop_point].stop_area
            }
            VertexKind::Arrival | VertexKind::Departure => data.stop_area_of_stop_time(local),
        }
    }
}
