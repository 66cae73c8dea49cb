//! Core types for the traffic light simulation
//!
//! Plain index wrappers into the flat arrays owned by the network model.

use std::fmt;

/// One discrete unit of simulated time
pub type Tick = u32;

/// A wrapper type for intersection IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IntersectionId(pub usize);

/// A wrapper type for street IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreetId(pub usize);

/// A wrapper type for vehicle IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VehicleId(pub usize);

impl fmt::Display for IntersectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for StreetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A one-way street connecting two intersections
#[derive(Debug, Clone)]
pub struct Street {
    pub id: StreetId,
    pub name: String,
    pub origin: IntersectionId,
    pub destination: IntersectionId,
    /// Ticks needed to drive from one end to the other, at least 1
    pub duration: Tick,
}

/// A vehicle's fixed route through the network
///
/// The vehicle starts at the end of the first street, so that street's
/// duration is never driven.
#[derive(Debug, Clone)]
pub struct VehiclePath {
    pub id: VehicleId,
    pub streets: Vec<StreetId>,
}

impl VehiclePath {
    /// Number of streets on the route
    pub fn len(&self) -> usize {
        self.streets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streets.is_empty()
    }

    /// Whether `leg` is the final street of the route
    pub fn is_last_leg(&self, leg: usize) -> bool {
        leg + 1 == self.streets.len()
    }
}
