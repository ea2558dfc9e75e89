mod degree;
mod error;

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

pub use crate::finder::{degree::DegreeFinder, error::Error};

/// Resolves the overall origin and final destination of a set of flights.
///
/// The flights may be listed in any order.
pub trait PathFinder: Send + Sync {
    fn find_path(&self, flights: &[Flight]) -> Result<Path, Error>;
}

/// Shorthand for [`DegreeFinder::find_path`].
pub fn find_path(flights: &[Flight]) -> Result<Path, Error> {
    DegreeFinder.find_path(flights)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Airport(String);

impl From<String> for Airport {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl From<&str> for Airport {
    fn from(code: &str) -> Self {
        code.to_string().into()
    }
}

impl From<Airport> for String {
    fn from(airport: Airport) -> Self {
        airport.0
    }
}

impl PartialEq<&str> for Airport {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Display for Airport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Airport {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A single directed leg of an itinerary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flight {
    pub source: Airport,
    pub destination: Airport,
}

impl Flight {
    pub fn new(source: impl Into<Airport>, destination: impl Into<Airport>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Path {
    pub start: Airport,
    pub finish: Airport,
}
