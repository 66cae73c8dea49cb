//! Tick-stepped simulation engine
//!
//! Replays every vehicle route against the network and the current light
//! schedules. Each tick runs two phases in order:
//!
//! 1. Arrivals: vehicles reaching the end of a street either finish their
//!    route and score, or join the FIFO queue at the end of that street.
//! 2. Departures: every intersection releases at most one vehicle, the head
//!    of the queue on its green street, onto the vehicle's next street.
//!
//! A vehicle that joins a queue during the arrival phase becomes eligible to
//! leave from the next tick on.

use log::{debug, trace};
use std::collections::VecDeque;

use super::network::NetworkModel;
use super::schedule::ScheduleStore;
use super::stats::WaitStatistics;
use super::types::{IntersectionId, StreetId, Tick, VehicleId};

/// How intersections decide which queue may release a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightPolicy {
    /// Only the street green in the schedule may release
    #[default]
    FollowSchedule,
    /// Any street may release, lowest street id first; one vehicle per tick
    /// still applies, so this gives an upper bound for a schedule's score
    IgnoreLights,
}

/// How much the engine records besides the per-street queue visits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatsGranularity {
    /// Per-street wait statistics only
    #[default]
    Streets,
    /// Per-street statistics plus a record for every leg of every vehicle
    Vehicles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineConfig {
    pub light_policy: LightPolicy,
    pub granularity: StatsGranularity,
}

/// Result of one run over the horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub score: u64,
    pub arrived: usize,
    /// Sum of all completed queue waits
    pub total_wait: u64,
}

/// A vehicle reaching the end of one street of its route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegRecord {
    pub arrival: Tick,
    /// `None` for the final street and for vehicles still queued at the horizon
    pub wait: Option<Tick>,
}

/// Progress of a vehicle along its route
#[derive(Debug, Clone, Default)]
pub struct VehicleState {
    /// Index of the street the vehicle is on
    leg: usize,
    /// Tick at which the vehicle reaches the end of its current street,
    /// `None` once that tick no longer fits in a [`Tick`]
    next_arrival: Option<Tick>,
    arrived_at: Option<Tick>,
    score: u64,
    legs: Vec<LegRecord>,
}

impl VehicleState {
    pub fn leg(&self) -> usize {
        self.leg
    }

    pub fn next_arrival(&self) -> Option<Tick> {
        self.next_arrival
    }

    pub fn arrived_at(&self) -> Option<Tick> {
        self.arrived_at
    }

    pub fn has_arrived(&self) -> bool {
        self.arrived_at.is_some()
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    /// Leg records, only filled with [`StatsGranularity::Vehicles`]
    pub fn legs(&self) -> &[LegRecord] {
        &self.legs
    }
}

#[derive(Debug, Clone, Copy)]
struct QueuedVehicle {
    vehicle: VehicleId,
    since: Tick,
    /// Index of the matching visit in the wait statistics
    visit: usize,
}

/// Owns all mutable state of a simulation run
pub struct SimulationEngine<'a> {
    network: &'a NetworkModel,
    config: EngineConfig,

    /// Incoming streets per intersection, ascending
    incoming: Vec<Vec<StreetId>>,

    /// FIFO queue at the end of every street
    queues: Vec<VecDeque<QueuedVehicle>>,

    /// Number of queued vehicles per intersection
    waiting: Vec<usize>,

    /// Tick of the last release per intersection
    last_dispatch: Vec<Option<Tick>>,

    /// Vehicles reaching the end of a street, bucketed by tick
    arrivals: Vec<Vec<VehicleId>>,

    vehicles: Vec<VehicleState>,
    stats: WaitStatistics,
    horizon: Tick,
    summary: RunSummary,
}

impl<'a> SimulationEngine<'a> {
    pub fn new(network: &'a NetworkModel) -> Self {
        Self::with_config(network, EngineConfig::default())
    }

    pub fn with_config(network: &'a NetworkModel, config: EngineConfig) -> Self {
        let incoming = network
            .intersections()
            .map(|intersection| network.incoming_streets(intersection))
            .collect();

        let mut engine = Self {
            network,
            config,
            incoming,
            queues: vec![VecDeque::new(); network.street_count()],
            waiting: vec![0; network.intersection_count()],
            last_dispatch: vec![None; network.intersection_count()],
            arrivals: Vec::new(),
            vehicles: vec![VehicleState::default(); network.vehicle_count()],
            stats: WaitStatistics::new(network.street_count()),
            horizon: network.horizon(),
            summary: RunSummary::default(),
        };
        engine.reset();
        engine
    }

    /// Clears queues, statistics and vehicle progress
    pub fn reset(&mut self) {
        self.reset_for(self.network.horizon());
    }

    fn reset_for(&mut self, horizon: Tick) {
        for queue in &mut self.queues {
            queue.clear();
        }
        self.waiting.fill(0);
        self.last_dispatch.fill(None);
        self.stats.reset();
        self.horizon = horizon;
        self.summary = RunSummary::default();

        self.arrivals.clear();
        self.arrivals.resize_with(horizon as usize, Vec::new);
        for state in &mut self.vehicles {
            *state = VehicleState {
                next_arrival: Some(0),
                ..VehicleState::default()
            };
        }
        // Every vehicle starts at the end of its first street
        if let Some(first) = self.arrivals.first_mut() {
            first.extend(self.network.vehicles().iter().map(|path| path.id));
        }
    }

    /// Runs over the network's horizon
    pub fn run(&mut self, schedules: &ScheduleStore) -> RunSummary {
        self.run_for(schedules, self.network.horizon())
    }

    /// Resets and runs ticks `0..horizon`
    pub fn run_for(&mut self, schedules: &ScheduleStore, horizon: Tick) -> RunSummary {
        self.reset_for(horizon);
        for tick in 0..horizon {
            self.process_arrivals(tick);
            self.process_departures(schedules, tick);
        }
        self.summary.total_wait = self.stats.overall_wait();

        debug!(
            "Run over {} ticks: score {}, {}/{} vehicles arrived, total wait {}",
            horizon,
            self.summary.score,
            self.summary.arrived,
            self.vehicles.len(),
            self.summary.total_wait
        );
        self.summary
    }

    fn process_arrivals(&mut self, tick: Tick) {
        let mut arriving = std::mem::take(&mut self.arrivals[tick as usize]);
        arriving.sort_unstable();
        let network = self.network;

        for vehicle_id in arriving {
            let path = network.vehicle(vehicle_id);
            let state = &mut self.vehicles[vehicle_id.0];
            if self.config.granularity == StatsGranularity::Vehicles {
                state.legs.push(LegRecord {
                    arrival: tick,
                    wait: None,
                });
            }

            if path.is_last_leg(state.leg) {
                let score = network.bonus() + u64::from(self.horizon - tick);
                state.arrived_at = Some(tick);
                state.score = score;
                self.summary.score += score;
                self.summary.arrived += 1;
                continue;
            }

            let street = path.streets[state.leg];
            let intersection = network.street(street).destination;
            let visit = self.stats.record_arrival(street, tick);
            self.queues[street.0].push_back(QueuedVehicle {
                vehicle: vehicle_id,
                since: tick,
                visit,
            });
            self.waiting[intersection.0] += 1;
        }
    }

    fn process_departures(&mut self, schedules: &ScheduleStore, tick: Tick) {
        for index in 0..self.waiting.len() {
            if self.waiting[index] == 0 || self.last_dispatch[index] == Some(tick) {
                continue;
            }
            let intersection = IntersectionId(index);
            let street = match self.config.light_policy {
                LightPolicy::FollowSchedule => schedules.active_street_at(intersection, tick),
                LightPolicy::IgnoreLights => self.incoming[index]
                    .iter()
                    .copied()
                    .find(|street| self.head_can_leave(*street, tick)),
            };
            let releasable = street.filter(|street| {
                self.network.street(*street).destination == intersection
                    && self.head_can_leave(*street, tick)
            });
            if let Some(street) = releasable {
                self.dispatch(intersection, street, tick);
            }
        }
    }

    fn head_can_leave(&self, street: StreetId, tick: Tick) -> bool {
        self.queues[street.0]
            .front()
            .is_some_and(|queued| queued.since < tick)
    }

    fn dispatch(&mut self, intersection: IntersectionId, street: StreetId, tick: Tick) {
        let Some(queued) = self.queues[street.0].pop_front() else {
            return;
        };
        self.waiting[intersection.0] -= 1;
        self.last_dispatch[intersection.0] = Some(tick);
        self.stats.record_departure(street, queued.visit, tick);

        let network = self.network;
        let path = network.vehicle(queued.vehicle);
        let state = &mut self.vehicles[queued.vehicle.0];
        if let Some(leg) = state.legs.last_mut() {
            leg.wait = Some(tick - queued.since);
        }
        state.leg += 1;
        let next_street = path.streets[state.leg];
        // A vehicle whose arrival tick overflows can never finish in time
        let next_arrival = tick.checked_add(network.street(next_street).duration);
        state.next_arrival = next_arrival;
        if let Some(arrival) = next_arrival.filter(|arrival| *arrival < self.horizon) {
            self.arrivals[arrival as usize].push(queued.vehicle);
        }

        trace!(
            "Tick {}: vehicle {} left street {} at intersection {} after {} ticks",
            tick,
            queued.vehicle,
            street,
            intersection,
            tick - queued.since
        );
    }

    /// Statistics of the last run
    pub fn stats(&self) -> &WaitStatistics {
        &self.stats
    }

    /// Summary of the last run
    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    pub fn vehicle_state(&self, vehicle_id: VehicleId) -> &VehicleState {
        &self.vehicles[vehicle_id.0]
    }

    pub fn vehicle_states(&self) -> &[VehicleState] {
        &self.vehicles
    }

    /// Vehicles still queued at the end of `street`, head first
    pub fn queued_vehicles(&self, street: StreetId) -> Vec<VehicleId> {
        self.queues[street.0].iter().map(|queued| queued.vehicle).collect()
    }
}
