//! Traffic light simulation core
//!
//! This module contains the network model, the light schedules, the
//! tick-stepped simulation engine and the schedule optimizer. It performs no
//! I/O; loading and writing scenarios lives in [`crate::hashcode`].

mod engine;
mod network;
mod optimization_loop;
mod optimizer;
mod schedule;
mod stats;
mod types;

pub use engine::{
    EngineConfig, LegRecord, LightPolicy, RunSummary, SimulationEngine, StatsGranularity,
    VehicleState,
};
pub use network::NetworkModel;
pub use optimization_loop::{LoopConfig, LoopOutcome, OptimizationLoop, RoundReport};
pub use optimizer::{schedule_from_offsets, solve, CostMatrix, CostMode, ScheduleOptimizer};
pub use schedule::{GreenPhase, Schedule, ScheduleStore};
pub use stats::{QueueVisit, WaitStatistics};
pub use types::{IntersectionId, Street, StreetId, Tick, VehicleId, VehiclePath};
