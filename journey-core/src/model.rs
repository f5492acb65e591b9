//! The normalized timetable consumed by the graph builder.
//!
//! Entities arrive from the external dataset loader as plain ordered
//! sequences with stable zero-based indices; everything references
//! everything else by index. [`TransitData`] owns the sequences and the
//! validity-pattern registry, and checks referential integrity before a
//! graph is built from it.

use chrono::NaiveDate;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar::{PatternIdx, PatternRegistry, ValidityPattern};
use crate::Error;

/// Passenger-facing station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopArea {
    pub name: String,
}

/// Physical platform belonging to one stop area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopPoint {
    pub name: String,
    pub stop_area: usize,
}

/// Ordered position of a route through a stop point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub stop_point: usize,
    pub order: u32,
}

/// One arrival/departure pair of a vehicle at a route point. Times are
/// seconds-of-day and may exceed 86 400 to denote the next day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopTime {
    pub arrival: u32,
    pub departure: u32,
    pub route_point: usize,
}

/// A single scheduled trip along an ordered list of stop times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleJourney {
    pub name: String,
    pub stop_times: Vec<usize>,
    pub pattern: PatternIdx,
}

/// The whole timetable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransitData {
    pub stop_areas: Vec<StopArea>,
    pub stop_points: Vec<StopPoint>,
    pub route_points: Vec<RoutePoint>,
    pub stop_times: Vec<StopTime>,
    pub vehicle_journeys: Vec<VehicleJourney>,
    pub calendar: PatternRegistry,
}

impl TransitData {
    /// Stop area reached by following stop time → route point → stop point.
    /// Callers must hold an index that passed [`TransitData::validate`].
    #[must_use]
    pub fn stop_area_of_stop_time(&self, stop_time: usize) -> usize {
        let route_point = self.stop_times[stop_time].route_point;
        let stop_point = self.route_points[route_point].stop_point;
        self.stop_points[stop_point].stop_area
    }

    /// Checks every cross-reference in the dataset. The graph builder fails
    /// fast on the first dangling index.
    pub fn validate(&self) -> Result<(), Error> {
        for (stop_point, sp) in self.stop_points.iter().enumerate() {
            if sp.stop_area >= self.stop_areas.len() {
                return Err(Error::StopAreaOutOfRange {
                    stop_point,
                    stop_area: sp.stop_area,
                });
            }
        }
        for (route_point, rp) in self.route_points.iter().enumerate() {
            if rp.stop_point >= self.stop_points.len() {
                return Err(Error::StopPointOutOfRange {
                    route_point,
                    stop_point: rp.stop_point,
                });
            }
        }
        for (stop_time, st) in self.stop_times.iter().enumerate() {
            if st.route_point >= self.route_points.len() {
                return Err(Error::RoutePointOutOfRange {
                    stop_time,
                    route_point: st.route_point,
                });
            }
        }
        for (vehicle_journey, vj) in self.vehicle_journeys.iter().enumerate() {
            if let Some(&stop_time) = vj
                .stop_times
                .iter()
                .find(|&&st| st >= self.stop_times.len())
            {
                return Err(Error::StopTimeOutOfRange {
                    vehicle_journey,
                    stop_time,
                });
            }
            if self.calendar.get(vj.pattern).is_none() {
                return Err(Error::PatternOutOfRange {
                    vehicle_journey,
                    pattern: vj.pattern,
                });
            }
        }
        Ok(())
    }
}

/// In-memory timetable assembly, one journey at a time.
///
/// Stop areas are deduplicated by name and carry one stop point each; every
/// journey gets its own chain of route points. Mostly a fixture for tests
/// and demos, but any producer of normalized timetables can use it.
pub struct TimetableBuilder {
    data: TransitData,
    date: NaiveDate,
    areas: HashMap<String, usize>,
    points: HashMap<usize, usize>,
}

impl TimetableBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::starting(NaiveDate::default())
    }

    /// Builder whose validity patterns are anchored to `date`.
    #[must_use]
    pub fn starting(date: NaiveDate) -> Self {
        TimetableBuilder {
            data: TransitData::default(),
            date,
            areas: HashMap::new(),
            points: HashMap::new(),
        }
    }

    /// Starts a journey that runs on every day of the period.
    pub fn vj(&mut self, name: &str) -> JourneyBuilder<'_> {
        let pattern = ValidityPattern::always(self.date);
        self.journey(name, pattern)
    }

    /// Starts a journey that runs only on the given days of the period.
    pub fn vj_valid_on(&mut self, name: &str, days: &[usize]) -> JourneyBuilder<'_> {
        let pattern = ValidityPattern::from_days(self.date, days.iter().copied());
        self.journey(name, pattern)
    }

    fn journey(&mut self, name: &str, pattern: ValidityPattern) -> JourneyBuilder<'_> {
        let pattern = self
            .data
            .calendar
            .intern(pattern)
            .expect("validity pattern registry overflow");
        let journey = self.data.vehicle_journeys.len();
        self.data.vehicle_journeys.push(VehicleJourney {
            name: name.to_string(),
            stop_times: Vec::new(),
            pattern,
        });
        JourneyBuilder {
            builder: self,
            journey,
            order: 0,
        }
    }

    fn stop_point_at(&mut self, area: &str) -> usize {
        let stop_area = match self.areas.get(area) {
            Some(&idx) => idx,
            None => {
                let idx = self.data.stop_areas.len();
                self.data.stop_areas.push(StopArea {
                    name: area.to_string(),
                });
                self.areas.insert(area.to_string(), idx);
                idx
            }
        };
        *self.points.entry(stop_area).or_insert_with(|| {
            let idx = self.data.stop_points.len();
            self.data.stop_points.push(StopPoint {
                name: area.to_string(),
                stop_area,
            });
            idx
        })
    }

    #[must_use]
    pub fn build(self) -> TransitData {
        debug!(
            stop_areas = self.data.stop_areas.len(),
            vehicle_journeys = self.data.vehicle_journeys.len(),
            stop_times = self.data.stop_times.len(),
            "timetable assembled"
        );
        self.data
    }
}

impl Default for TimetableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Chained stop insertion for one vehicle journey.
pub struct JourneyBuilder<'a> {
    builder: &'a mut TimetableBuilder,
    journey: usize,
    order: u32,
}

impl JourneyBuilder<'_> {
    /// Appends a stop with distinct arrival and departure times.
    pub fn stop(self, area: &str, arrival: u32, departure: u32) -> Self {
        let stop_point = self.builder.stop_point_at(area);
        let data = &mut self.builder.data;
        let route_point = data.route_points.len();
        data.route_points.push(RoutePoint {
            stop_point,
            order: self.order,
        });
        let stop_time = data.stop_times.len();
        data.stop_times.push(StopTime {
            arrival,
            departure,
            route_point,
        });
        data.vehicle_journeys[self.journey].stop_times.push(stop_time);
        JourneyBuilder {
            builder: self.builder,
            journey: self.journey,
            order: self.order + 1,
        }
    }

    /// Appends a stop where the vehicle departs the moment it arrives.
    pub fn at(self, area: &str, time: u32) -> Self {
        self.stop(area, time, time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_dedups_areas_and_chains_route_points() {
        let mut builder = TimetableBuilder::new();
        builder.vj("A").at("stop1", 8_000).at("stop2", 8_100);
        builder.vj("B").at("stop2", 8_200).at("stop3", 8_300);
        let data = builder.build();

        assert_eq!(data.stop_areas.len(), 3);
        assert_eq!(data.stop_points.len(), 3);
        // every journey owns its route points
        assert_eq!(data.route_points.len(), 4);
        assert_eq!(data.stop_times.len(), 4);
        assert_eq!(data.vehicle_journeys.len(), 2);
        assert!(data.validate().is_ok());

        // both journeys touch stop2 through different route points
        assert_eq!(data.stop_area_of_stop_time(1), 1);
        assert_eq!(data.stop_area_of_stop_time(2), 1);
        assert_ne!(
            data.stop_times[1].route_point,
            data.stop_times[2].route_point
        );
    }

    #[test]
    fn validate_rejects_dangling_route_point() {
        let mut builder = TimetableBuilder::new();
        builder.vj("A").at("stop1", 8_000);
        let mut data = builder.build();
        data.stop_times[0].route_point = 17;

        assert!(matches!(
            data.validate(),
            Err(Error::RoutePointOutOfRange {
                stop_time: 0,
                route_point: 17
            })
        ));
    }

    #[test]
    fn validate_rejects_dangling_pattern() {
        let mut builder = TimetableBuilder::new();
        builder.vj("A").at("stop1", 8_000);
        let mut data = builder.build();
        data.vehicle_journeys[0].pattern = 40;

        assert!(matches!(
            data.validate(),
            Err(Error::PatternOutOfRange {
                vehicle_journey: 0,
                pattern: 40
            })
        ));
    }

    #[test]
    fn validate_rejects_dangling_stop_time() {
        let mut builder = TimetableBuilder::new();
        builder.vj("A").at("stop1", 8_000);
        let mut data = builder.build();
        data.vehicle_journeys[0].stop_times.push(9);

        assert!(matches!(
            data.validate(),
            Err(Error::StopTimeOutOfRange {
                vehicle_journey: 0,
                stop_time: 9
            })
        ));
    }
}
