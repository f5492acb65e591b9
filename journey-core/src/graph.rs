//! The time-expanded graph and its vertex/edge records.
//!
//! Backed by a [`petgraph`] `DiGraph`; the wrapper pins the invariant that
//! node indices coincide with the packed vertex ids of [`VertexSpace`], so
//! a vertex can be addressed either way without a lookup table.

use std::ops::{Deref, DerefMut};

use petgraph::graph::{DiGraph, NodeIndex};

use crate::calendar::{PatternIdx, ALWAYS_VALID};
use crate::space::{VertexKind, VertexSpace};

/// Closed set of edge kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Stop area to one of its stop points.
    SaSp,
    /// Stop point to one of its route points.
    SpRp,
    /// Route point to an arrival event; boarding anchor.
    RpTa,
    /// Arrival to departure within one stop time; dwell.
    TaTd,
    /// Departure to the next arrival of the same vehicle journey.
    TdTa,
    /// Consecutive departures of one route point; same-route wait.
    TdTd,
    /// Earliest feasible departure on another route point of the same stop
    /// area.
    Transfer,
}

/// Vertex record; kind and stop area are carried inline so traversal never
/// goes back to the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexDesc {
    pub local: u32,
    pub kind: VertexKind,
    pub stop_area: u32,
}

/// Edge record. Untimed edges carry the [`ALWAYS_VALID`] sentinel and zeroed
/// times; timed edges carry seconds-of-day bounds, the (possibly shifted)
/// validity pattern and the vehicle journey they belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeDesc {
    pub kind: EdgeKind,
    pub pattern: PatternIdx,
    pub start_time: u32,
    pub end_time: u32,
    pub timed: bool,
    pub vehicle_journey: Option<u32>,
}

impl EdgeDesc {
    /// Untimed structural link.
    #[must_use]
    pub fn link(kind: EdgeKind) -> Self {
        EdgeDesc {
            kind,
            pattern: ALWAYS_VALID,
            start_time: 0,
            end_time: 0,
            timed: false,
            vehicle_journey: None,
        }
    }

    /// Timed dwell or in-vehicle leg.
    #[must_use]
    pub fn ride(
        kind: EdgeKind,
        vehicle_journey: u32,
        pattern: PatternIdx,
        start_time: u32,
        end_time: u32,
    ) -> Self {
        EdgeDesc {
            kind,
            pattern,
            start_time,
            end_time,
            timed: true,
            vehicle_journey: Some(vehicle_journey),
        }
    }
}

/// The built graph; immutable once construction finishes.
#[derive(Debug, Clone, Default)]
pub struct TransitGraph {
    graph: DiGraph<VertexDesc, EdgeDesc>,
    space: VertexSpace,
}

impl TransitGraph {
    #[must_use]
    pub(crate) fn with_space(space: VertexSpace) -> Self {
        TransitGraph {
            graph: DiGraph::with_capacity(space.vertex_count(), space.vertex_count()),
            space,
        }
    }

    #[must_use]
    pub fn space(&self) -> &VertexSpace {
        &self.space
    }

    /// Node index of `(kind, local)`; identical to the packed vertex id.
    #[must_use]
    pub fn node_of(&self, kind: VertexKind, local: usize) -> NodeIndex {
        NodeIndex::new(self.space.vid_of(kind, local))
    }
}

impl Deref for TransitGraph {
    type Target = DiGraph<VertexDesc, EdgeDesc>;

    fn deref(&self) -> &Self::Target {
        &self.graph
    }
}

impl DerefMut for TransitGraph {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.graph
    }
}
