//! Random scenarios for headless runs
//!
//! Intersections sit on a ring so every intersection can reach every other;
//! extra chord streets add crossing traffic. Vehicle paths are random walks.

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::simulation::{IntersectionId, NetworkModel, StreetId, Tick};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub intersections: usize,
    /// Chord streets leaving each intersection besides its ring street
    pub extra_streets_per_intersection: usize,
    pub vehicles: usize,
    pub horizon: Tick,
    pub bonus: u64,
    pub max_street_duration: Tick,
    pub max_path_len: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            intersections: 20,
            extra_streets_per_intersection: 2,
            vehicles: 200,
            horizon: 200,
            bonus: 100,
            max_street_duration: 5,
            max_path_len: 12,
        }
    }
}

/// Builds a random scenario; the same seed always gives the same network
pub fn generate(config: &GeneratorConfig, seed: u64) -> Result<NetworkModel> {
    if config.intersections < 2 {
        bail!("Need at least two intersections, got {}", config.intersections);
    }
    if config.max_street_duration == 0 || config.max_path_len == 0 {
        bail!("Street durations and path lengths must be at least 1");
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut network = NetworkModel::new(config.horizon, config.bonus);
    network.add_intersections(config.intersections);

    let mut street_index = 0;
    let mut add_street = |network: &mut NetworkModel, rng: &mut StdRng, from: usize, to: usize| {
        let duration = rng.random_range(1..=config.max_street_duration);
        let name = format!("s{street_index}");
        street_index += 1;
        network.add_street(IntersectionId(from), IntersectionId(to), name, duration)
    };

    for from in 0..config.intersections {
        add_street(&mut network, &mut rng, from, (from + 1) % config.intersections)?;
        for _ in 0..config.extra_streets_per_intersection {
            // Shift by 1..n so the chord never loops back to its origin
            let shift = rng.random_range(1..config.intersections);
            add_street(
                &mut network,
                &mut rng,
                from,
                (from + shift) % config.intersections,
            )?;
        }
    }

    let all_streets: Vec<StreetId> = network.streets().iter().map(|street| street.id).collect();
    for _ in 0..config.vehicles {
        let len = rng.random_range(1..=config.max_path_len);
        let mut path = vec![*all_streets
            .choose(&mut rng)
            .context("Generated network has no streets")?];
        while path.len() < len {
            let end = network.street(path[path.len() - 1]).destination;
            let next = *network
                .outgoing_streets(end)
                .choose(&mut rng)
                .context("Ring intersection without outgoing street")?;
            path.push(next);
        }
        network.add_vehicle(path)?;
    }

    Ok(network)
}
