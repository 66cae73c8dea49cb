//! Wait statistics collected during a simulation run
//!
//! Rebuilt from scratch at the start of every run and read by the schedule
//! optimizer once the run has finished.

use super::types::{StreetId, Tick};

/// One vehicle joining the queue at the end of a street
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueVisit {
    /// Tick the vehicle reached the end of the street
    pub arrival: Tick,
    /// Ticks spent in the queue, `None` while it was still waiting at the horizon
    pub wait: Option<Tick>,
}

/// Queue visits at the end of every street
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WaitStatistics {
    visits: Vec<Vec<QueueVisit>>,
}

impl WaitStatistics {
    pub fn new(street_count: usize) -> Self {
        Self {
            visits: vec![Vec::new(); street_count],
        }
    }

    /// Drops every recorded visit, keeping the allocations
    pub fn reset(&mut self) {
        for visits in &mut self.visits {
            visits.clear();
        }
    }

    /// Records an arrival and returns its index for the matching departure
    pub(crate) fn record_arrival(&mut self, street: StreetId, tick: Tick) -> usize {
        let visits = &mut self.visits[street.0];
        visits.push(QueueVisit {
            arrival: tick,
            wait: None,
        });
        visits.len() - 1
    }

    pub(crate) fn record_departure(&mut self, street: StreetId, visit: usize, tick: Tick) {
        let entry = &mut self.visits[street.0][visit];
        entry.wait = Some(tick - entry.arrival);
    }

    /// Visits at the end of `street`, in arrival order
    pub fn visits(&self, street: StreetId) -> &[QueueVisit] {
        &self.visits[street.0]
    }

    /// Arrival ticks at the end of `street`, ascending
    pub fn arrival_ticks(&self, street: StreetId) -> impl Iterator<Item = Tick> + '_ {
        self.visits[street.0].iter().map(|visit| visit.arrival)
    }

    /// Number of arrivals at the end of `street` for every tick of the horizon
    pub fn arrivals_per_tick(&self, street: StreetId, horizon: Tick) -> Vec<u32> {
        let mut counts = vec![0; horizon as usize];
        for tick in self.arrival_ticks(street) {
            if let Some(count) = counts.get_mut(tick as usize) {
                *count += 1;
            }
        }
        counts
    }

    /// Sum of the completed waits at the end of `street`
    pub fn total_wait(&self, street: StreetId) -> u64 {
        self.visits[street.0]
            .iter()
            .filter_map(|visit| visit.wait)
            .map(u64::from)
            .sum()
    }

    /// Sum of the completed waits over all streets
    pub fn overall_wait(&self) -> u64 {
        (0..self.visits.len()).map(|street| self.total_wait(StreetId(street))).sum()
    }
}
