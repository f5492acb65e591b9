//! Convenient re-exports for downstream crates.

pub use crate::algo::{compute, compute_many, legs, make_itinerary, Leg, Path, PathItem, Query};
pub use crate::builder::build_graph;
pub use crate::calendar::{PatternRegistry, ValidityPattern};
pub use crate::graph::{EdgeDesc, EdgeKind, TransitGraph, VertexDesc};
pub use crate::model::{TimetableBuilder, TransitData};
pub use crate::session::DataStore;
pub use crate::space::{VertexKind, VertexSpace};
pub use crate::Error;
