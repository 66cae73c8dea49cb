//! Plain-text scenario and schedule formats
//!
//! Scenario:
//!
//! ```text
//! <horizon> <intersections> <streets> <vehicles> <bonus>
//! <origin> <destination> <name> <duration>     (one line per street)
//! <count> <name> <name> ...                    (one line per vehicle)
//! ```
//!
//! Schedule: the number of scheduled intersections, then for each one its
//! id, its number of phases and one `<street name> <duration>` line per phase.

use anyhow::{bail, Context, Result};
use std::str::FromStr;

use crate::simulation::{IntersectionId, NetworkModel, ScheduleStore};

struct Lines<'s> {
    lines: std::iter::Enumerate<std::str::Lines<'s>>,
}

impl<'s> Lines<'s> {
    fn next_tokens(&mut self, what: &str) -> Result<(usize, Vec<&'s str>)> {
        for (index, line) in self.lines.by_ref() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if !tokens.is_empty() {
                return Ok((index + 1, tokens));
            }
        }
        bail!("Unexpected end of input while reading {what}")
    }
}

fn number<T: FromStr>(token: Option<&&str>, line: usize, what: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let token = token.with_context(|| format!("Line {line}: missing {what}"))?;
    token
        .parse()
        .with_context(|| format!("Line {line}: invalid {what} {token:?}"))
}

/// Parses a scenario into a network model
pub fn parse(input: &str) -> Result<NetworkModel> {
    let mut lines = Lines {
        lines: input.lines().enumerate(),
    };

    let (line, header) = lines.next_tokens("header")?;
    let horizon = number(header.first(), line, "horizon")?;
    let intersections: usize = number(header.get(1), line, "intersection count")?;
    let streets: usize = number(header.get(2), line, "street count")?;
    let vehicles: usize = number(header.get(3), line, "vehicle count")?;
    let bonus = number(header.get(4), line, "bonus")?;

    let mut network = NetworkModel::new(horizon, bonus);
    network.add_intersections(intersections);

    for _ in 0..streets {
        let (line, tokens) = lines.next_tokens("streets")?;
        let origin = number(tokens.first(), line, "origin intersection")?;
        let destination = number(tokens.get(1), line, "destination intersection")?;
        let name = *tokens
            .get(2)
            .with_context(|| format!("Line {line}: missing street name"))?;
        let duration = number(tokens.get(3), line, "street duration")?;
        network
            .add_street(IntersectionId(origin), IntersectionId(destination), name, duration)
            .with_context(|| format!("Line {line}: invalid street"))?;
    }

    for _ in 0..vehicles {
        let (line, tokens) = lines.next_tokens("vehicles")?;
        let count: usize = number(tokens.first(), line, "path length")?;
        if tokens.len() != count + 1 {
            bail!(
                "Line {line}: path declares {count} streets but lists {}",
                tokens.len() - 1
            );
        }
        let path = tokens[1..]
            .iter()
            .map(|name| {
                network
                    .street_by_name(name)
                    .with_context(|| format!("Line {line}: unknown street {name}"))
            })
            .collect::<Result<Vec<_>>>()?;
        network
            .add_vehicle(path)
            .with_context(|| format!("Line {line}: invalid vehicle"))?;
    }

    Ok(network)
}

/// Renders every nonempty schedule using street names
pub fn write_schedule(network: &NetworkModel, store: &ScheduleStore) -> String {
    let scheduled: Vec<_> = store.iter_nonempty().collect();
    let mut out = format!("{}\n", scheduled.len());
    for (intersection, schedule) in scheduled {
        out.push_str(&format!("{intersection}\n{}\n", schedule.phases().len()));
        for phase in schedule.phases() {
            out.push_str(&format!("{} {}\n", network.street(phase.street).name, phase.duration));
        }
    }
    out
}
