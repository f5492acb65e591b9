//! Graph construction.
//!
//! Four strictly sequential passes over the validated timetable:
//!
//! 1. every vertex of the packed space, then the stop-area → stop-point →
//!    route-point skeleton;
//! 2. per-journey timelines: dwell and in-vehicle edges, with validity
//!    patterns shifted by one day each time a leg crosses midnight;
//! 3. same-route waiting chains linking consecutive departures of each
//!    route point;
//! 4. inter-route transfers inside each stop area, honouring the minimum
//!    connection time with at most one past-midnight restart per (stop
//!    area, route point) pair.

use hashbrown::HashMap;
use itertools::Itertools;
use tracing::debug;

use crate::calendar::{crosses_midnight, PatternIdx, PatternRegistry};
use crate::graph::{EdgeDesc, EdgeKind, TransitGraph, VertexDesc};
use crate::model::TransitData;
use crate::space::{VertexKind, VertexSpace};
use crate::{Error, DAY_SECONDS, MIN_TRANSFER_SECONDS};

/// Builds the time-expanded graph. Idempotent for identical input; the
/// validity-pattern registry may grow while in-vehicle legs crossing
/// midnight are re-labelled.
pub fn build_graph(data: &mut TransitData) -> Result<TransitGraph, Error> {
    data.validate()?;

    let space = VertexSpace::of(data);
    let mut graph = TransitGraph::with_space(space);

    create_vertices(data, &space, &mut graph);
    link_skeleton(data, &mut graph);
    link_trips(data, &mut graph)?;

    let chains = departure_chains(data);
    link_waiting_chains(&chains, &mut graph);
    link_transfers(data, &chains, &mut graph);

    debug!(
        vertices = graph.node_count(),
        edges = graph.edge_count(),
        patterns = data.calendar.len(),
        "transit graph built"
    );
    Ok(graph)
}

/// Pass 1a: the whole vertex space in index order, so that petgraph node
/// indices equal packed vertex ids.
fn create_vertices(data: &TransitData, space: &VertexSpace, graph: &mut TransitGraph) {
    for vid in 0..space.vertex_count() {
        let (kind, local) = space.local_of(vid);
        let stop_area = space.stop_area_of(vid, data) as u32;
        let node = graph.add_node(VertexDesc {
            local: local as u32,
            kind,
            stop_area,
        });
        debug_assert_eq!(node.index(), vid);
    }
}

/// Pass 1b: untimed links from each stop area to its stop points and from
/// each stop point to its route points.
fn link_skeleton(data: &TransitData, graph: &mut TransitGraph) {
    for (sp_idx, sp) in data.stop_points.iter().enumerate() {
        let sa = graph.node_of(VertexKind::StopArea, sp.stop_area);
        let sp_node = graph.node_of(VertexKind::StopPoint, sp_idx);
        graph.add_edge(sa, sp_node, EdgeDesc::link(EdgeKind::SaSp));
    }
    for (rp_idx, rp) in data.route_points.iter().enumerate() {
        let sp_node = graph.node_of(VertexKind::StopPoint, rp.stop_point);
        let rp_node = graph.node_of(VertexKind::RoutePoint, rp_idx);
        graph.add_edge(sp_node, rp_node, EdgeDesc::link(EdgeKind::SpRp));
    }
}

/// Pass 2: arrival/departure timelines of every vehicle journey.
fn link_trips(data: &mut TransitData, graph: &mut TransitGraph) -> Result<(), Error> {
    let TransitData {
        stop_times,
        vehicle_journeys,
        calendar,
        ..
    } = data;

    for (vj_idx, vj) in vehicle_journeys.iter().enumerate() {
        // running pattern of the journey, shifted once per midnight crossing
        let mut running = vj.pattern;
        let mut previous: Option<usize> = None;

        for &st_idx in &vj.stop_times {
            let st = stop_times[st_idx];
            let ta = graph.node_of(VertexKind::Arrival, st_idx);
            let td = graph.node_of(VertexKind::Departure, st_idx);
            let rp = graph.node_of(VertexKind::RoutePoint, st.route_point);

            if let Some(prev_idx) = previous {
                let departure = stop_times[prev_idx].departure;
                if crosses_midnight(departure, st.arrival) {
                    running = shift_pattern(calendar, running)?;
                }
                let prev_td = graph.node_of(VertexKind::Departure, prev_idx);
                graph.add_edge(
                    prev_td,
                    ta,
                    EdgeDesc::ride(EdgeKind::TdTa, vj_idx as u32, running, departure, st.arrival),
                );
            }

            if crosses_midnight(st.arrival, st.departure) {
                running = shift_pattern(calendar, running)?;
            }
            graph.add_edge(
                ta,
                td,
                EdgeDesc::ride(EdgeKind::TaTd, vj_idx as u32, running, st.arrival, st.departure),
            );
            graph.add_edge(rp, ta, EdgeDesc::link(EdgeKind::RpTa));

            previous = Some(st_idx);
        }
    }
    Ok(())
}

fn shift_pattern(calendar: &mut PatternRegistry, idx: PatternIdx) -> Result<PatternIdx, Error> {
    let shifted = calendar
        .get(idx)
        .ok_or_else(|| Error::Internal(format!("validity pattern {idx} vanished from the registry")))?
        .shifted_by_one_day();
    calendar.intern(shifted)
}

/// Stop-time indices of every route point, ordered by departure time (ties
/// by stop-time index).
fn departure_chains(data: &TransitData) -> HashMap<usize, Vec<usize>> {
    let mut chains: HashMap<usize, Vec<usize>> = HashMap::new();
    for (st_idx, st) in data.stop_times.iter().enumerate() {
        chains.entry(st.route_point).or_default().push(st_idx);
    }
    for chain in chains.values_mut() {
        chain.sort_unstable_by_key(|&st| (data.stop_times[st].departure, st));
    }
    chains
}

/// Pass 3: untimed waiting edges between consecutive departures of each
/// route point.
fn link_waiting_chains(chains: &HashMap<usize, Vec<usize>>, graph: &mut TransitGraph) {
    for chain in chains.values() {
        for (&earlier, &later) in chain.iter().tuple_windows() {
            let from = graph.node_of(VertexKind::Departure, earlier);
            let to = graph.node_of(VertexKind::Departure, later);
            graph.add_edge(from, to, EdgeDesc::link(EdgeKind::TdTd));
        }
    }
}

/// Monotone position in one route point's departure chain. The past-midnight
/// restart may happen once in the cursor's lifetime.
#[derive(Default)]
struct TransferCursor {
    position: usize,
    day_shift: i64,
}

impl TransferCursor {
    /// First departure at least the minimum connection time after `arrival`,
    /// if the chain still has one.
    fn seek(&mut self, chain: &[usize], data: &TransitData, arrival: i64) -> Option<usize> {
        loop {
            while let Some(&st) = chain.get(self.position) {
                let gap = i64::from(data.stop_times[st].departure) - arrival + self.day_shift;
                if gap >= i64::from(MIN_TRANSFER_SECONDS) {
                    return Some(st);
                }
                self.position += 1;
            }
            if self.day_shift != 0 {
                return None;
            }
            self.day_shift = i64::from(DAY_SECONDS);
            self.position = 0;
        }
    }
}

/// Pass 4: transfer edges from each arrival to the earliest feasible
/// departure on every other route point of the same stop area.
fn link_transfers(
    data: &TransitData,
    chains: &HashMap<usize, Vec<usize>>,
    graph: &mut TransitGraph,
) {
    let mut arrivals: HashMap<usize, Vec<usize>> = HashMap::new();
    for st_idx in 0..data.stop_times.len() {
        arrivals
            .entry(data.stop_area_of_stop_time(st_idx))
            .or_default()
            .push(st_idx);
    }
    for roster in arrivals.values_mut() {
        roster.sort_unstable_by_key(|&st| (data.stop_times[st].arrival, st));
    }

    let mut area_route_points: HashMap<usize, Vec<usize>> = HashMap::new();
    for (rp_idx, rp) in data.route_points.iter().enumerate() {
        let sa = data.stop_points[rp.stop_point].stop_area;
        area_route_points.entry(sa).or_default().push(rp_idx);
    }

    for sa in 0..data.stop_areas.len() {
        let (Some(roster), Some(route_points)) = (arrivals.get(&sa), area_route_points.get(&sa))
        else {
            continue;
        };

        let mut cursors: HashMap<usize, TransferCursor> = route_points
            .iter()
            .map(|&rp| (rp, TransferCursor::default()))
            .collect();

        for &ta_st in roster {
            let arrival = i64::from(data.stop_times[ta_st].arrival);
            for &rp in route_points {
                if rp == data.stop_times[ta_st].route_point {
                    continue; // no self-transfer
                }
                let Some(chain) = chains.get(&rp) else {
                    continue;
                };
                let Some(cursor) = cursors.get_mut(&rp) else {
                    continue;
                };
                let Some(td_st) = cursor.seek(chain, data, arrival) else {
                    continue;
                };
                let ta = graph.node_of(VertexKind::Arrival, ta_st);
                let td = graph.node_of(VertexKind::Departure, td_st);
                if graph.find_edge(ta, td).is_none() {
                    graph.add_edge(ta, td, EdgeDesc::link(EdgeKind::Transfer));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::ALWAYS_VALID;
    use crate::model::{RoutePoint, StopArea, StopPoint, StopTime, TimetableBuilder, VehicleJourney};
    use crate::calendar::ValidityPattern;
    use chrono::NaiveDate;
    use petgraph::visit::EdgeRef;

    fn edges_of_kind(graph: &TransitGraph, kind: EdgeKind) -> Vec<(usize, usize, EdgeDesc)> {
        graph
            .edge_references()
            .filter(|e| e.weight().kind == kind)
            .map(|e| (e.source().index(), e.target().index(), *e.weight()))
            .collect()
    }

    /// One stop area served by two route points: an arriving one and one
    /// with a chain of three departures.
    fn hub_data() -> TransitData {
        let date = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        let mut data = TransitData::default();
        data.stop_areas.push(StopArea { name: "hub".into() });
        data.stop_areas.push(StopArea { name: "away".into() });
        data.stop_points.push(StopPoint { name: "hub".into(), stop_area: 0 });
        data.stop_points.push(StopPoint { name: "away".into(), stop_area: 1 });
        // rp0: arrivals at the hub, rp1: departures at the hub, rp2: away
        data.route_points.push(RoutePoint { stop_point: 0, order: 1 });
        data.route_points.push(RoutePoint { stop_point: 0, order: 0 });
        data.route_points.push(RoutePoint { stop_point: 1, order: 1 });

        let pattern = data.calendar.intern(ValidityPattern::always(date)).unwrap();

        // st0 arrives at the hub
        data.stop_times.push(StopTime { arrival: 8_000, departure: 8_000, route_point: 0 });
        // st1..st3 leave the hub 60 s, 200 s and 400 s later
        for gap in [60, 200, 400] {
            data.stop_times.push(StopTime {
                arrival: 8_000 + gap,
                departure: 8_000 + gap,
                route_point: 1,
            });
        }
        // st4..st6 reach the other area so each departure belongs to a journey
        for (i, dep) in [1usize, 2, 3].into_iter().enumerate() {
            data.stop_times.push(StopTime {
                arrival: 9_000 + i as u32 * 100,
                departure: 9_000 + i as u32 * 100,
                route_point: 2,
            });
            data.vehicle_journeys.push(VehicleJourney {
                name: format!("out{dep}"),
                stop_times: vec![dep, 4 + i],
                pattern,
            });
        }
        data.vehicle_journeys.push(VehicleJourney {
            name: "in".into(),
            stop_times: vec![0],
            pattern,
        });
        data
    }

    #[test]
    fn waiting_chain_is_ordered_by_departure() {
        let mut data = hub_data();
        let graph = build_graph(&mut data).unwrap();

        // two chains of three departures each: the hub's and the away stop's
        let waits = edges_of_kind(&graph, EdgeKind::TdTd);
        assert_eq!(waits.len(), 4);
        let td = |st| graph.node_of(VertexKind::Departure, st).index();
        assert!(waits.contains(&(td(1), td(2), EdgeDesc::link(EdgeKind::TdTd))));
        assert!(waits.contains(&(td(2), td(3), EdgeDesc::link(EdgeKind::TdTd))));
        assert!(waits.contains(&(td(4), td(5), EdgeDesc::link(EdgeKind::TdTd))));
        assert!(waits.contains(&(td(5), td(6), EdgeDesc::link(EdgeKind::TdTd))));
    }

    #[test]
    fn transfer_skips_departures_under_the_minimum_connection() {
        let mut data = hub_data();
        let graph = build_graph(&mut data).unwrap();

        // from the hub arrival, 60 s and 200 s are too tight; 400 s works
        let ta = graph.node_of(VertexKind::Arrival, 0);
        let close = graph.node_of(VertexKind::Departure, 1);
        let near = graph.node_of(VertexKind::Departure, 2);
        let good = graph.node_of(VertexKind::Departure, 3);
        assert!(graph.find_edge(ta, close).is_none());
        assert!(graph.find_edge(ta, near).is_none());
        assert!(graph.find_edge(ta, good).is_some());
    }

    #[test]
    fn no_transfer_between_a_route_point_and_itself() {
        let mut data = hub_data();
        let graph = build_graph(&mut data).unwrap();

        for (source, target, _) in edges_of_kind(&graph, EdgeKind::Transfer) {
            let (_, src_st) = graph.space().local_of(source);
            let (_, dst_st) = graph.space().local_of(target);
            assert_ne!(
                data.stop_times[src_st].route_point,
                data.stop_times[dst_st].route_point
            );
        }
    }

    #[test]
    fn crossing_leg_carries_a_shifted_pattern() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        let mut builder = TimetableBuilder::starting(date);
        builder
            .vj_valid_on("night", &[0])
            .at("stop1", 23 * 3600)
            .at("stop2", 24 * 3600 + 300);
        let mut data = builder.build();
        let base = data.vehicle_journeys[0].pattern;
        let graph = build_graph(&mut data).unwrap();

        let rides = edges_of_kind(&graph, EdgeKind::TdTa);
        assert_eq!(rides.len(), 1);
        let pattern = rides[0].2.pattern;
        assert_ne!(pattern, base);
        assert!(data.calendar.is_valid(pattern, 1));
        assert!(!data.calendar.is_valid(pattern, 0));
    }

    #[test]
    fn single_stop_journey_emits_no_ride() {
        let mut builder = TimetableBuilder::new();
        builder.vj("lonely").at("stop1", 8_000);
        let mut data = builder.build();
        let graph = build_graph(&mut data).unwrap();

        assert!(edges_of_kind(&graph, EdgeKind::TdTa).is_empty());
        // the arrival/departure pair still exists, with its dwell edge
        assert_eq!(edges_of_kind(&graph, EdgeKind::TaTd).len(), 1);
    }

    #[test]
    fn untimed_edges_carry_the_sentinel_pattern() {
        let mut data = hub_data();
        let graph = build_graph(&mut data).unwrap();

        for edge in graph.edge_references() {
            let desc = edge.weight();
            if desc.timed {
                assert_ne!(desc.pattern, ALWAYS_VALID);
                assert!(desc.vehicle_journey.is_some());
            } else {
                assert_eq!(desc.pattern, ALWAYS_VALID);
            }
        }
    }
}
