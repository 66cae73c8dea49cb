//! Shared scenarios for the integration tests

#![allow(dead_code)]

use traffic_schedule::simulation::{IntersectionId, NetworkModel, StreetId};

pub const A: StreetId = StreetId(0);
pub const B: StreetId = StreetId(1);
pub const C: StreetId = StreetId(2);

/// Two intersections, three streets, two vehicles
///
/// Street `a` (0 -> 1, 2 ticks), `b` (1 -> 0, 3 ticks), `c` (0 -> 1, 1 tick).
/// Vehicle 0 drives `a, b`, vehicle 1 drives `c, b`.
pub fn two_intersection_network(horizon: u32, bonus: u64) -> NetworkModel {
    let mut network = NetworkModel::new(horizon, bonus);
    network.add_intersections(2);
    network
        .add_street(IntersectionId(0), IntersectionId(1), "a", 2)
        .unwrap();
    network
        .add_street(IntersectionId(1), IntersectionId(0), "b", 3)
        .unwrap();
    network
        .add_street(IntersectionId(0), IntersectionId(1), "c", 1)
        .unwrap();
    network.add_vehicle(vec![A, B]).unwrap();
    network.add_vehicle(vec![C, B]).unwrap();
    network
}

/// Every permutation of `0..n`
pub fn permutations(n: usize) -> Vec<Vec<usize>> {
    if n == 0 {
        return vec![Vec::new()];
    }
    let mut result = Vec::new();
    for rest in permutations(n - 1) {
        for position in 0..=rest.len() {
            let mut permutation = rest.clone();
            permutation.insert(position, n - 1);
            result.push(permutation);
        }
    }
    result
}
