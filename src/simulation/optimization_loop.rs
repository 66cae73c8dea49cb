//! Alternating simulate / optimize rounds
//!
//! Every round first simulates the current schedules, then reassigns each
//! intersection from the statistics of that run. Reassignments are computed
//! from the previous global schedule, so the score may go down between
//! rounds.

use anyhow::Result;
use log::{debug, info};

use super::engine::{RunSummary, SimulationEngine};
use super::network::NetworkModel;
use super::optimizer::{CostMode, ScheduleOptimizer};
use super::schedule::ScheduleStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopConfig {
    pub rounds: usize,
    pub mode: CostMode,
    /// Restore the best scoring schedule seen once the rounds are done
    pub keep_best: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            rounds: 10,
            mode: CostMode::Approximate,
            keep_best: false,
        }
    }
}

/// Score of the schedule simulated at the start of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundReport {
    pub round: usize,
    pub score: u64,
    pub arrived: usize,
    /// Sum of the optimizer's predicted waits after reassignment
    pub predicted_wait: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopOutcome {
    pub rounds: Vec<RoundReport>,
    /// Simulation of the schedule left after the last round
    pub final_summary: RunSummary,
    /// Highest score observed, with the round index (`rounds.len()` for the
    /// final simulation)
    pub best_score: u64,
    pub best_round: usize,
}

pub struct OptimizationLoop<'a> {
    network: &'a NetworkModel,
    engine: SimulationEngine<'a>,
    optimizer: ScheduleOptimizer<'a>,
    store: ScheduleStore,
}

impl<'a> OptimizationLoop<'a> {
    pub fn new(network: &'a NetworkModel) -> Self {
        Self {
            network,
            engine: SimulationEngine::new(network),
            optimizer: ScheduleOptimizer::new(network),
            store: ScheduleStore::new(network.intersection_count()),
        }
    }

    /// One tick of green per traffic-carrying street at every intersection
    pub fn initialize(&mut self) -> Result<()> {
        for intersection in self.network.intersections() {
            let entries = self.optimizer.initial_schedule(intersection);
            self.store.set_schedule(intersection, entries)?;
        }
        Ok(())
    }

    pub fn run(&mut self, config: LoopConfig) -> Result<LoopOutcome> {
        self.initialize()?;

        let mut rounds = Vec::with_capacity(config.rounds);
        let mut best = (0, 0, self.store.clone());

        for round in 0..config.rounds {
            let summary = self.engine.run(&self.store);
            if round == 0 || summary.score > best.0 {
                best = (summary.score, round, self.store.clone());
            }

            let mut predicted_wait = 0;
            for intersection in self.network.intersections() {
                predicted_wait += self.optimizer.optimize_intersection(
                    intersection,
                    self.engine.stats(),
                    config.mode,
                    &mut self.store,
                )?;
            }
            debug!("Round {}: predicted wait after reassignment {}", round + 1, predicted_wait);

            info!(
                "Round {}: score {} before reassignment ({}/{} vehicles arrived)",
                round + 1,
                summary.score,
                summary.arrived,
                self.network.vehicle_count()
            );
            rounds.push(RoundReport {
                round,
                score: summary.score,
                arrived: summary.arrived,
                predicted_wait,
            });
        }

        let final_summary = self.engine.run(&self.store);
        info!(
            "Final schedule: score {} ({}/{} vehicles arrived)",
            final_summary.score,
            final_summary.arrived,
            self.network.vehicle_count()
        );
        if rounds.is_empty() || final_summary.score > best.0 {
            best = (final_summary.score, rounds.len(), self.store.clone());
        }

        let (best_score, best_round, best_store) = best;
        if config.keep_best && best_round != rounds.len() {
            info!("Restoring schedule of round {} with score {}", best_round + 1, best_score);
            self.store = best_store;
        }

        Ok(LoopOutcome {
            rounds,
            final_summary,
            best_score,
            best_round,
        })
    }

    /// Simulates the current schedules once more
    pub fn evaluate(&mut self) -> RunSummary {
        self.engine.run(&self.store)
    }

    pub fn schedules(&self) -> &ScheduleStore {
        &self.store
    }
}
