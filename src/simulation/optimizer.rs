//! Per-intersection schedule optimization
//!
//! For one intersection with k traffic-carrying incoming streets, every
//! street gets one tick of green per cycle of length k. Choosing which street
//! takes which offset is an assignment problem: the cost of giving street i
//! offset j is the total wait predicted for its vehicles, estimated from the
//! arrivals recorded in the previous run. The Hungarian algorithm then finds
//! the cheapest bijection.

use anyhow::Result;
use pathfinding::kuhn_munkres::kuhn_munkres_min;
use pathfinding::matrix::Matrix;
use std::collections::BTreeSet;

use super::network::NetworkModel;
use super::schedule::ScheduleStore;
use super::stats::WaitStatistics;
use super::types::{IntersectionId, StreetId, Tick};

/// How the wait for a hypothetical offset is estimated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CostMode {
    /// Each recorded arrival waits until the next green tick, ignoring
    /// the other vehicles in the queue
    #[default]
    Approximate,
    /// Replays the recorded arrivals through a queue served on green ticks
    /// and sums the queue length over the horizon
    Exact,
}

/// Predicted wait for every (street, offset) pair of one intersection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostMatrix {
    /// Row order of the matrix
    pub streets: Vec<StreetId>,
    /// `costs[(i, j)]` is the wait of `streets[i]` when green at offset j
    pub costs: Matrix<i64>,
}

impl CostMatrix {
    pub fn size(&self) -> usize {
        self.streets.len()
    }

    pub fn cost(&self, street: usize, offset: usize) -> i64 {
        self.costs[(street, offset)]
    }

    /// Total cost of an assignment where row i takes column `offsets[i]`
    pub fn total(&self, offsets: &[usize]) -> i64 {
        offsets
            .iter()
            .enumerate()
            .map(|(street, offset)| self.cost(street, *offset))
            .sum()
    }
}

/// Builds cost matrices and turns their optimal assignment into schedules
pub struct ScheduleOptimizer<'a> {
    network: &'a NetworkModel,
    traffic: BTreeSet<StreetId>,
}

impl<'a> ScheduleOptimizer<'a> {
    pub fn new(network: &'a NetworkModel) -> Self {
        Self {
            network,
            traffic: network.traffic_carrying_streets(),
        }
    }

    /// Streets of the intersection that take part in its schedule
    pub fn scheduled_streets(&self, intersection_id: IntersectionId) -> Vec<StreetId> {
        self.network.scheduled_streets(intersection_id, &self.traffic)
    }

    /// One tick of green per traffic-carrying street, ascending street id
    pub fn initial_schedule(&self, intersection_id: IntersectionId) -> Vec<(StreetId, Tick)> {
        self.scheduled_streets(intersection_id)
            .into_iter()
            .map(|street| (street, 1))
            .collect()
    }

    pub fn compute_cost_matrix(
        &self,
        intersection_id: IntersectionId,
        stats: &WaitStatistics,
        mode: CostMode,
    ) -> CostMatrix {
        let streets = self.scheduled_streets(intersection_id);
        let k = streets.len();
        let mut costs = Matrix::new(k, k, 0i64);

        match mode {
            CostMode::Approximate => {
                for (row, street) in streets.iter().enumerate() {
                    for offset in 0..k {
                        costs[(row, offset)] = stats
                            .arrival_ticks(*street)
                            .map(|arrival| cyclic_wait(arrival as usize, offset, k))
                            .sum();
                    }
                }
            }
            CostMode::Exact => {
                let horizon = self.network.horizon();
                for (row, street) in streets.iter().enumerate() {
                    let arrivals = stats.arrivals_per_tick(*street, horizon);
                    for offset in 0..k {
                        costs[(row, offset)] = replay_queue(&arrivals, offset, k);
                    }
                }
            }
        }

        CostMatrix { streets, costs }
    }

    /// Recomputes the cost matrix of one intersection and installs the
    /// cheapest schedule; returns the predicted total wait
    pub fn optimize_intersection(
        &self,
        intersection_id: IntersectionId,
        stats: &WaitStatistics,
        mode: CostMode,
        store: &mut ScheduleStore,
    ) -> Result<i64> {
        let matrix = self.compute_cost_matrix(intersection_id, stats, mode);
        let offsets = solve(&matrix);
        store.set_schedule(intersection_id, schedule_from_offsets(&matrix.streets, &offsets))?;
        Ok(matrix.total(&offsets))
    }
}

/// Ticks from `arrival` until the next tick congruent to `offset` mod `k`
fn cyclic_wait(arrival: usize, offset: usize, k: usize) -> i64 {
    ((offset + k - arrival % k) % k) as i64
}

/// Queue-length integral of one street green on ticks `offset` mod `k`
///
/// For FIFO service the sum of queue lengths over time equals the sum of
/// the individual waits.
fn replay_queue(arrivals: &[u32], offset: usize, k: usize) -> i64 {
    let mut waiting: i64 = 0;
    let mut total: i64 = 0;
    for (tick, count) in arrivals.iter().enumerate() {
        waiting += i64::from(*count);
        if tick % k == offset && waiting > 0 {
            waiting -= 1;
        }
        total += waiting;
    }
    total
}

/// Finds the minimum-cost bijection; `result[i]` is the offset of row i
pub fn solve(matrix: &CostMatrix) -> Vec<usize> {
    match matrix.size() {
        0 => Vec::new(),
        1 => vec![0],
        _ => kuhn_munkres_min(&matrix.costs).1,
    }
}

/// One tick of green per street, ordered by offset
pub fn schedule_from_offsets(streets: &[StreetId], offsets: &[usize]) -> Vec<(StreetId, Tick)> {
    let mut by_offset: Vec<(usize, StreetId)> = offsets
        .iter()
        .copied()
        .zip(streets.iter().copied())
        .collect();
    by_offset.sort_unstable();
    by_offset.into_iter().map(|(_, street)| (street, 1)).collect()
}
