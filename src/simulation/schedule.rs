//! Per-intersection traffic light schedules
//!
//! Each intersection cycles through an ordered list of (street, green
//! duration) entries. Exactly one street is green at any tick of a nonempty
//! schedule; an empty schedule keeps every street red.

use anyhow::{bail, Result};

use super::types::{IntersectionId, StreetId, Tick};

/// A single green phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GreenPhase {
    pub street: StreetId,
    pub duration: Tick,
}

/// The light cycle of one intersection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    phases: Vec<GreenPhase>,
    /// Cycle offset at which each phase ends, ascending
    ends: Vec<u64>,
}

impl Schedule {
    fn from_phases(phases: Vec<GreenPhase>) -> Self {
        let ends = phases
            .iter()
            .scan(0u64, |end, phase| {
                *end += u64::from(phase.duration);
                Some(*end)
            })
            .collect();
        Self { phases, ends }
    }

    pub fn phases(&self) -> &[GreenPhase] {
        &self.phases
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Sum of all green durations
    pub fn cycle_length(&self) -> u64 {
        self.ends.last().copied().unwrap_or(0)
    }

    /// The street that is green at `tick`, if any
    pub fn active_street_at(&self, tick: Tick) -> Option<StreetId> {
        let cycle = self.cycle_length();
        if cycle == 0 {
            return None;
        }
        let offset = u64::from(tick) % cycle;
        let phase = self.ends.partition_point(|end| *end <= offset);
        self.phases.get(phase).map(|phase| phase.street)
    }

    /// Tiles the cycle over the horizon; a trailing partial cycle is cut off
    pub fn materialize(&self, horizon: Tick) -> Vec<Option<StreetId>> {
        (0..horizon).map(|tick| self.active_street_at(tick)).collect()
    }
}

/// Schedules for every intersection of a network
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleStore {
    schedules: Vec<Schedule>,
}

impl ScheduleStore {
    /// Creates a store where every intersection is permanently red
    pub fn new(intersection_count: usize) -> Self {
        Self {
            schedules: vec![Schedule::default(); intersection_count],
        }
    }

    /// Replaces the schedule of one intersection
    pub fn set_schedule(
        &mut self,
        intersection_id: IntersectionId,
        entries: Vec<(StreetId, Tick)>,
    ) -> Result<()> {
        if let Some((street, _)) = entries.iter().find(|(_, duration)| *duration == 0) {
            bail!("Street {street} at intersection {intersection_id} has a zero green duration");
        }
        let Some(slot) = self.schedules.get_mut(intersection_id.0) else {
            bail!("Intersection {intersection_id} not found");
        };
        *slot = Schedule::from_phases(
            entries
                .into_iter()
                .map(|(street, duration)| GreenPhase { street, duration })
                .collect(),
        );
        Ok(())
    }

    pub fn schedule(&self, intersection_id: IntersectionId) -> &Schedule {
        &self.schedules[intersection_id.0]
    }

    pub fn active_street_at(&self, intersection_id: IntersectionId, tick: Tick) -> Option<StreetId> {
        self.schedules
            .get(intersection_id.0)
            .and_then(|schedule| schedule.active_street_at(tick))
    }

    pub fn cycle_length(&self, intersection_id: IntersectionId) -> u64 {
        self.schedule(intersection_id).cycle_length()
    }

    pub fn materialize(&self, intersection_id: IntersectionId, horizon: Tick) -> Vec<Option<StreetId>> {
        self.schedule(intersection_id).materialize(horizon)
    }

    /// Intersections with at least one green phase, ascending by id
    pub fn iter_nonempty(&self) -> impl Iterator<Item = (IntersectionId, &Schedule)> {
        self.schedules
            .iter()
            .enumerate()
            .filter(|(_, schedule)| !schedule.is_empty())
            .map(|(index, schedule)| (IntersectionId(index), schedule))
    }
}
