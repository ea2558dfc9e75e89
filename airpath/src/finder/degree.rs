use std::collections::HashMap;

use tracing::debug;

use crate::finder::{Airport, Error, Flight, Path, PathFinder};

/// Finds the endpoints of an itinerary from the degree balance of each airport.
///
/// The start is the only airport with exactly one more departure than arrivals,
/// and the finish is the only airport with exactly one more arrival than departures.
/// Airports with any other imbalance (e.g. two departures and no arrivals) are
/// never candidates.
///
/// Only degrees are inspected. Legs that don't chain into a single walk from
/// the start to the finish are accepted as long as their degrees balance out,
/// e.g. a valid path next to a disjoint round trip.
#[derive(Debug, Clone, Copy, Default)]
pub struct DegreeFinder;

impl PathFinder for DegreeFinder {
    fn find_path(&self, flights: &[Flight]) -> Result<Path, Error> {
        let mut departures: HashMap<&Airport, usize> = HashMap::new();
        let mut arrivals: HashMap<&Airport, usize> = HashMap::new();
        for flight in flights {
            *departures.entry(&flight.source).or_default() += 1;
            *arrivals.entry(&flight.destination).or_default() += 1;
        }
        debug!(
            "tallied {} flights: {} departure airports, {} arrival airports",
            flights.len(),
            departures.len(),
            arrivals.len()
        );

        // The start must be resolved before the finish.
        let start = single_surplus(&departures, &arrivals)?;
        let finish = single_surplus(&arrivals, &departures)?;

        match (start, finish) {
            (Some(start), Some(finish)) => Ok(Path {
                start: start.clone(),
                finish: finish.clone(),
            }),
            _ => Err(Error::NoPath),
        }
    }
}

/// Returns the only airport counted exactly once more in `tally` than in `opposite`.
fn single_surplus<'a>(
    tally: &HashMap<&'a Airport, usize>,
    opposite: &HashMap<&'a Airport, usize>,
) -> Result<Option<&'a Airport>, Error> {
    let mut candidate = None;
    for (&airport, &count) in tally {
        let other = opposite.get(airport).copied().unwrap_or_default();
        if count != other + 1 {
            continue;
        }
        if let Some(previous) = candidate.replace(airport) {
            debug!("both {previous} and {airport} qualify as an endpoint");
            return Err(Error::MultiplePaths);
        }
    }
    Ok(candidate)
}
