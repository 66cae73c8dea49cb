//! Simulation engine behaviour on hand-computed and generated scenarios

mod common;

use std::collections::HashSet;

use common::{two_intersection_network, A, B, C};
use traffic_schedule::generator::{generate, GeneratorConfig};
use traffic_schedule::simulation::{
    EngineConfig, IntersectionId, LightPolicy, NetworkModel, ScheduleOptimizer, ScheduleStore,
    SimulationEngine, StatsGranularity, StreetId, VehicleId,
};

fn alternating_schedule() -> ScheduleStore {
    let mut store = ScheduleStore::new(2);
    store
        .set_schedule(IntersectionId(1), vec![(A, 1), (C, 1)])
        .unwrap();
    store
}

fn vehicle_engine(network: &NetworkModel) -> SimulationEngine<'_> {
    SimulationEngine::with_config(
        network,
        EngineConfig {
            granularity: StatsGranularity::Vehicles,
            ..EngineConfig::default()
        },
    )
}

#[test]
fn test_hand_computed_score() {
    let network = two_intersection_network(10, 1);
    let mut engine = vehicle_engine(&network);

    // Tick 0: both vehicles queue at intersection 1 and may not leave yet.
    // Tick 1: `c` is green, vehicle 1 leaves and reaches the end of `b` at 4.
    // Tick 2: `a` is green, vehicle 0 leaves and reaches the end of `b` at 5.
    let summary = engine.run(&alternating_schedule());
    assert_eq!(summary.score, (1 + 10 - 5) + (1 + 10 - 4));
    assert_eq!(summary.arrived, 2);
    assert_eq!(summary.total_wait, 3);

    let first = engine.vehicle_state(VehicleId(0));
    assert_eq!(first.arrived_at(), Some(5));
    assert_eq!(first.score(), 6);
    assert_eq!(first.legs().len(), 2);
    assert_eq!(first.legs()[0].wait, Some(2));
    assert_eq!(first.legs()[1].arrival, 5);
    assert_eq!(first.legs()[1].wait, None);

    let second = engine.vehicle_state(VehicleId(1));
    assert_eq!(second.arrived_at(), Some(4));
    assert_eq!(second.score(), 7);

    let visits_a = engine.stats().visits(A);
    assert_eq!(visits_a.len(), 1);
    assert_eq!(visits_a[0].arrival, 0);
    assert_eq!(visits_a[0].wait, Some(2));
    assert_eq!(engine.stats().total_wait(C), 1);
}

#[test]
fn test_late_vehicle_scores_nothing() {
    let network = two_intersection_network(5, 1);
    let mut engine = SimulationEngine::new(&network);

    let summary = engine.run(&alternating_schedule());
    assert_eq!(summary.score, 1 + 5 - 4);
    assert_eq!(summary.arrived, 1);

    let late = engine.vehicle_state(VehicleId(0));
    assert!(!late.has_arrived());
    assert_eq!(late.score(), 0);
    assert_eq!(late.leg(), 1);
    assert_eq!(late.next_arrival(), Some(5));
}

#[test]
fn test_arrival_past_tick_range_scores_nothing() {
    let mut network = NetworkModel::new(10, 1);
    network.add_intersections(2);
    network
        .add_street(IntersectionId(0), IntersectionId(1), "in", 1)
        .unwrap();
    network
        .add_street(IntersectionId(1), IntersectionId(0), "endless", u32::MAX)
        .unwrap();
    network
        .add_street(IntersectionId(1), IntersectionId(0), "back", 2)
        .unwrap();
    network.add_vehicle(vec![StreetId(0), StreetId(1)]).unwrap();
    network.add_vehicle(vec![StreetId(0), StreetId(2)]).unwrap();

    let mut store = ScheduleStore::new(2);
    store
        .set_schedule(IntersectionId(1), vec![(StreetId(0), 1)])
        .unwrap();

    // Vehicle 0 leaves at tick 1 onto a street it can never finish,
    // vehicle 1 follows at tick 2 and arrives at tick 4
    let mut engine = SimulationEngine::new(&network);
    let summary = engine.run(&store);
    assert_eq!(summary.arrived, 1);
    assert_eq!(summary.score, 1 + 10 - 4);

    let lost = engine.vehicle_state(VehicleId(0));
    assert!(!lost.has_arrived());
    assert_eq!(lost.score(), 0);
    assert_eq!(lost.leg(), 1);
    assert_eq!(lost.next_arrival(), None);
    assert_eq!(engine.stats().visits(StreetId(0))[0].wait, Some(1));
}

#[test]
fn test_single_street_vehicle_arrives_immediately() {
    let mut network = NetworkModel::new(8, 3);
    network.add_intersections(2);
    network
        .add_street(IntersectionId(0), IntersectionId(1), "only", 4)
        .unwrap();
    network.add_vehicle(vec![StreetId(0)]).unwrap();

    let mut engine = SimulationEngine::new(&network);
    let summary = engine.run(&ScheduleStore::new(2));
    assert_eq!(summary.score, 3 + 8);
    assert_eq!(summary.arrived, 1);
    assert!(engine.stats().visits(StreetId(0)).is_empty());
}

#[test]
fn test_red_lights_hold_every_vehicle() {
    let network = two_intersection_network(10, 1);
    let mut engine = SimulationEngine::new(&network);

    let summary = engine.run(&ScheduleStore::new(2));
    assert_eq!(summary.score, 0);
    assert_eq!(summary.arrived, 0);
    assert_eq!(engine.queued_vehicles(A), vec![VehicleId(0)]);
    assert_eq!(engine.queued_vehicles(C), vec![VehicleId(1)]);
    assert_eq!(engine.stats().visits(A)[0].wait, None);
}

#[test]
fn test_rerun_starts_from_scratch() {
    let network = two_intersection_network(10, 1);
    let mut engine = SimulationEngine::new(&network);
    let store = alternating_schedule();

    let first = engine.run(&store);
    let second = engine.run(&store);
    assert_eq!(first, second);
    assert_eq!(engine.stats().visits(A).len(), 1);

    // A shorter horizon only lets vehicle 1 in, at tick 4
    assert_eq!(engine.run_for(&store, 5).score, 1 + 5 - 4);

    engine.reset();
    assert_eq!(engine.summary().score, 0);
    assert!(engine.stats().visits(A).is_empty());
    assert!(engine.vehicle_states().iter().all(|state| !state.has_arrived()));
}

#[test]
fn test_queue_is_first_in_first_out() {
    let mut network = NetworkModel::new(10, 1);
    network.add_intersections(2);
    network
        .add_street(IntersectionId(0), IntersectionId(1), "a", 2)
        .unwrap();
    network
        .add_street(IntersectionId(1), IntersectionId(0), "b", 3)
        .unwrap();
    network.add_vehicle(vec![A, B]).unwrap();
    network.add_vehicle(vec![A, B]).unwrap();

    let mut store = ScheduleStore::new(2);
    store.set_schedule(IntersectionId(1), vec![(A, 1)]).unwrap();

    let mut engine = SimulationEngine::new(&network);
    let summary = engine.run(&store);
    assert_eq!(summary.score, (1 + 10 - 4) + (1 + 10 - 5));

    let waits: Vec<_> = engine.stats().visits(A).iter().map(|visit| visit.wait).collect();
    assert_eq!(waits, vec![Some(1), Some(2)]);
    assert_eq!(engine.vehicle_state(VehicleId(0)).arrived_at(), Some(4));
    assert_eq!(engine.vehicle_state(VehicleId(1)).arrived_at(), Some(5));
}

#[test]
fn test_ignoring_lights_still_releases_one_vehicle_per_tick() {
    let network = two_intersection_network(10, 1);
    let mut engine = SimulationEngine::with_config(
        &network,
        EngineConfig {
            light_policy: LightPolicy::IgnoreLights,
            ..EngineConfig::default()
        },
    );

    // Street `a` has the lower id, so vehicle 0 leaves first at tick 1
    let summary = engine.run(&ScheduleStore::new(2));
    assert_eq!(summary.arrived, 2);
    assert_eq!(engine.vehicle_state(VehicleId(0)).arrived_at(), Some(4));
    assert_eq!(engine.vehicle_state(VehicleId(1)).arrived_at(), Some(5));
    assert_eq!(summary.score, 13);
}

#[test]
fn test_generated_runs_respect_invariants() {
    let config = GeneratorConfig {
        intersections: 8,
        vehicles: 60,
        horizon: 80,
        ..GeneratorConfig::default()
    };

    for seed in 0..5 {
        let network = generate(&config, seed).unwrap();
        let optimizer = ScheduleOptimizer::new(&network);
        let mut store = ScheduleStore::new(network.intersection_count());
        for intersection in network.intersections() {
            store
                .set_schedule(intersection, optimizer.initial_schedule(intersection))
                .unwrap();
        }

        let mut engine = vehicle_engine(&network);
        let summary = engine.run(&store);
        assert!(summary.arrived <= network.vehicle_count());

        let mut score = 0;
        for (path, state) in network.vehicles().iter().zip(engine.vehicle_states()) {
            score += state.score();
            match state.arrived_at() {
                Some(tick) => {
                    assert!(tick < network.horizon());
                    assert_eq!(
                        state.score(),
                        network.bonus() + u64::from(network.horizon() - tick)
                    );
                    assert_eq!(state.legs().len(), path.len());
                }
                None => assert_eq!(state.score(), 0),
            }

            // Every completed wait is followed by the drive along the next street
            for (leg, pair) in state.legs().windows(2).enumerate() {
                let wait = pair[0].wait.expect("vehicle moved on without a recorded wait");
                let next = network.street(path.streets[leg + 1]);
                assert_eq!(pair[1].arrival, pair[0].arrival + wait + next.duration);
            }
        }
        assert_eq!(score, summary.score);

        let mut departures = HashSet::new();
        for street in network.streets() {
            let visits = engine.stats().visits(street.id);
            let mut last_departure = None;
            let mut still_waiting = false;
            for visit in visits {
                match visit.wait {
                    Some(wait) => {
                        assert!(!still_waiting, "a later vehicle overtook a waiting one");
                        assert!(wait >= 1);
                        let departure = visit.arrival + wait;
                        assert!(last_departure < Some(departure));
                        last_departure = Some(departure);
                        assert!(
                            departures.insert((street.destination, departure)),
                            "two departures at intersection {} in tick {}",
                            street.destination,
                            departure
                        );
                    }
                    None => still_waiting = true,
                }
            }
        }
    }
}
