//! Shared ownership of the timetable and its graph.
//!
//! The loader takes the store exclusively while (re)loading; every query
//! takes it shared. A shared acquisition never blocks: while the loader
//! holds the store, [`DataStore::try_shared`] reports
//! [`Error::LoaderInProgress`] and the request layer answers "loading"
//! instead of waiting. Guards are scoped, so the lock is released on every
//! exit path.

use std::sync::{RwLock, RwLockReadGuard, TryLockError};

use tracing::info;

use crate::algo::query::{compute, Query};
use crate::algo::Path;
use crate::builder::build_graph;
use crate::graph::TransitGraph;
use crate::model::TransitData;
use crate::Error;

#[derive(Default)]
struct StoreState {
    loaded: bool,
    data: TransitData,
    graph: TransitGraph,
}

/// The one place a process keeps its timetable.
#[derive(Default)]
pub struct DataStore {
    state: RwLock<StoreState>,
}

impl DataStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the timetable and rebuilds the graph under the exclusive
    /// lock. On any failure the store is left unloaded and the error
    /// propagates.
    pub fn load_with<F>(&self, loader: F) -> Result<(), Error>
    where
        F: FnOnce() -> Result<TransitData, Error>,
    {
        let mut state = self
            .state
            .write()
            .map_err(|_| Error::Internal("data store lock poisoned".to_string()))?;
        state.loaded = false;

        let mut data = loader()?;
        let graph = build_graph(&mut data)?;
        info!(
            stop_areas = data.stop_areas.len(),
            vehicle_journeys = data.vehicle_journeys.len(),
            vertices = graph.node_count(),
            "timetable loaded"
        );

        state.data = data;
        state.graph = graph;
        state.loaded = true;
        Ok(())
    }

    /// Non-blocking shared acquisition for a query handler.
    pub fn try_shared(&self) -> Result<StoreGuard<'_>, Error> {
        match self.state.try_read() {
            Ok(state) if state.loaded => Ok(StoreGuard { state }),
            Ok(_) => Err(Error::LoaderInProgress),
            Err(TryLockError::WouldBlock) => Err(Error::LoaderInProgress),
            Err(TryLockError::Poisoned(_)) => {
                Err(Error::Internal("data store lock poisoned".to_string()))
            }
        }
    }
}

/// Shared view of a loaded timetable; queries run against it while it is
/// held.
pub struct StoreGuard<'a> {
    state: RwLockReadGuard<'a, StoreState>,
}

impl StoreGuard<'_> {
    #[must_use]
    pub fn data(&self) -> &TransitData {
        &self.state.data
    }

    #[must_use]
    pub fn graph(&self) -> &TransitGraph {
        &self.state.graph
    }

    /// Convenience entry: one earliest-arrival query under this guard.
    #[must_use]
    pub fn compute(&self, query: &Query) -> Path {
        compute(self.graph(), self.data(), query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TimetableBuilder;

    fn timetable() -> TransitData {
        let mut builder = TimetableBuilder::new();
        builder.vj("A").at("stop1", 8_000).at("stop2", 8_100);
        builder.build()
    }

    #[test]
    fn unloaded_store_reports_loading() {
        let store = DataStore::new();
        assert!(matches!(store.try_shared(), Err(Error::LoaderInProgress)));
    }

    #[test]
    fn loaded_store_answers_queries() {
        let store = DataStore::new();
        store.load_with(|| Ok(timetable())).unwrap();

        let guard = store.try_shared().unwrap();
        let path = guard.compute(&Query {
            origin: 0,
            destination: 1,
            departure: 7_900,
            day: 0,
        });
        assert_eq!(path.items.len(), 2);
    }

    #[test]
    fn shared_access_is_refused_while_loading() {
        let store = DataStore::new();
        store
            .load_with(|| {
                // a request racing the loader sees "loading", not a block
                assert!(matches!(store.try_shared(), Err(Error::LoaderInProgress)));
                Ok(timetable())
            })
            .unwrap();
        assert!(store.try_shared().is_ok());
    }

    #[test]
    fn failed_load_leaves_the_store_unloaded() {
        let store = DataStore::new();
        store.load_with(|| Ok(timetable())).unwrap();
        let result = store.load_with(|| Err(Error::Internal("boom".to_string())));
        assert!(result.is_err());
        assert!(matches!(store.try_shared(), Err(Error::LoaderInProgress)));
    }
}
