//! Traffic Light Schedule Library
//!
//! Simulates vehicles moving through a street network controlled by
//! per-intersection light cycles, and searches for cycles that let more
//! vehicles arrive earlier.

pub mod generator;
pub mod hashcode;
pub mod simulation;
