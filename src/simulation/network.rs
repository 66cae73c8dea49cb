//! Street network and vehicle roster
//!
//! Built once by a loader and never mutated while simulating. Streets and
//! intersections live in flat id-indexed arrays; the petgraph graph mirrors
//! them for adjacency queries.

use anyhow::{bail, Context, Result};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{BTreeSet, HashMap};

use super::types::{IntersectionId, Street, StreetId, Tick, VehicleId, VehiclePath};

/// Immutable description of one simulation scenario
#[derive(Debug, Clone)]
pub struct NetworkModel {
    /// Number of ticks simulated per run
    horizon: Tick,

    /// Points awarded on top of the early-arrival points for each arrival
    bonus: u64,

    /// Directed graph with one node per intersection and one edge per street
    graph: DiGraph<IntersectionId, StreetId>,

    /// Maps intersection IDs to their node indices in the graph
    intersection_to_node: Vec<NodeIndex>,

    /// Storage for street data, indexed by street id
    streets: Vec<Street>,

    /// Street lookup by display name
    street_names: HashMap<String, StreetId>,

    /// Vehicle routes, indexed by vehicle id
    vehicles: Vec<VehiclePath>,
}

impl NetworkModel {
    pub fn new(horizon: Tick, bonus: u64) -> Self {
        Self {
            horizon,
            bonus,
            graph: DiGraph::new(),
            intersection_to_node: Vec::new(),
            streets: Vec::new(),
            street_names: HashMap::new(),
            vehicles: Vec::new(),
        }
    }

    pub fn horizon(&self) -> Tick {
        self.horizon
    }

    pub fn bonus(&self) -> u64 {
        self.bonus
    }

    /// Adds an intersection and returns its id
    pub fn add_intersection(&mut self) -> IntersectionId {
        let id = IntersectionId(self.intersection_to_node.len());
        let node_index = self.graph.add_node(id);
        self.intersection_to_node.push(node_index);
        id
    }

    /// Adds `count` intersections with consecutive ids
    pub fn add_intersections(&mut self, count: usize) {
        for _ in 0..count {
            self.add_intersection();
        }
    }

    /// Adds a one-way street between two existing intersections
    pub fn add_street(
        &mut self,
        origin: IntersectionId,
        destination: IntersectionId,
        name: impl Into<String>,
        duration: Tick,
    ) -> Result<StreetId> {
        let name = name.into();
        if duration == 0 {
            bail!("Street {name} must take at least one tick to traverse");
        }
        if self.street_names.contains_key(&name) {
            bail!("Duplicate street name {name}");
        }

        let start_node = *self
            .intersection_to_node
            .get(origin.0)
            .with_context(|| format!("Origin intersection {origin} of street {name} not found"))?;
        let end_node = *self
            .intersection_to_node
            .get(destination.0)
            .with_context(|| {
                format!("Destination intersection {destination} of street {name} not found")
            })?;

        let id = StreetId(self.streets.len());
        self.graph.add_edge(start_node, end_node, id);
        self.street_names.insert(name.clone(), id);
        self.streets.push(Street {
            id,
            name,
            origin,
            destination,
            duration,
        });
        Ok(id)
    }

    /// Adds a vehicle travelling along the given streets
    pub fn add_vehicle(&mut self, streets: Vec<StreetId>) -> Result<VehicleId> {
        let id = VehicleId(self.vehicles.len());
        if streets.is_empty() {
            bail!("Vehicle {id} has an empty path");
        }
        if let Some(unknown) = streets.iter().find(|street| street.0 >= self.streets.len()) {
            bail!("Vehicle {id} references unknown street {unknown}");
        }
        self.vehicles.push(VehiclePath { id, streets });
        Ok(id)
    }

    /// Gets a street by ID
    pub fn street(&self, street_id: StreetId) -> &Street {
        &self.streets[street_id.0]
    }

    /// Finds a street by its display name
    pub fn street_by_name(&self, name: &str) -> Option<StreetId> {
        self.street_names.get(name).copied()
    }

    pub fn streets(&self) -> &[Street] {
        &self.streets
    }

    pub fn vehicles(&self) -> &[VehiclePath] {
        &self.vehicles
    }

    pub fn vehicle(&self, vehicle_id: VehicleId) -> &VehiclePath {
        &self.vehicles[vehicle_id.0]
    }

    /// Get number of intersections
    pub fn intersection_count(&self) -> usize {
        self.intersection_to_node.len()
    }

    /// Get number of streets
    pub fn street_count(&self) -> usize {
        self.streets.len()
    }

    /// Get number of vehicles
    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    /// All intersection ids in ascending order
    pub fn intersections(&self) -> impl Iterator<Item = IntersectionId> {
        (0..self.intersection_to_node.len()).map(IntersectionId)
    }

    /// Streets ending at the intersection, in ascending street id order
    pub fn incoming_streets(&self, intersection_id: IntersectionId) -> Vec<StreetId> {
        self.adjacent_streets(intersection_id, Direction::Incoming)
    }

    /// Streets leaving the intersection, in ascending street id order
    pub fn outgoing_streets(&self, intersection_id: IntersectionId) -> Vec<StreetId> {
        self.adjacent_streets(intersection_id, Direction::Outgoing)
    }

    fn adjacent_streets(&self, intersection_id: IntersectionId, dir: Direction) -> Vec<StreetId> {
        let Some(node_index) = self.intersection_to_node.get(intersection_id.0) else {
            return Vec::new();
        };
        let mut streets: Vec<StreetId> = self
            .graph
            .edges_directed(*node_index, dir)
            .map(|edge| *edge.weight())
            .collect();
        streets.sort_unstable();
        streets
    }

    /// Streets on which some vehicle has to wait at a light
    ///
    /// A vehicle's final street ends at its destination, so only the
    /// non-final legs of each path count.
    pub fn traffic_carrying_streets(&self) -> BTreeSet<StreetId> {
        self.vehicles
            .iter()
            .flat_map(|path| path.streets[..path.streets.len() - 1].iter().copied())
            .collect()
    }

    /// Incoming streets of the intersection that carry traffic, ascending
    pub fn scheduled_streets(
        &self,
        intersection_id: IntersectionId,
        traffic: &BTreeSet<StreetId>,
    ) -> Vec<StreetId> {
        self.incoming_streets(intersection_id)
            .into_iter()
            .filter(|street| traffic.contains(street))
            .collect()
    }
}
