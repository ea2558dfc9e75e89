use serde::{Deserialize, Serialize};

use crate::finder::{Flight, Path};

/// Request body of the `/calculate` endpoint: `[["SFO", "ATL"], ["ATL", "EWR"]]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FindPathRequest(pub Vec<Vec<String>>);

/// Response body of the `/calculate` endpoint: `["SFO", "EWR"]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FindPathResponse(pub [String; 2]);

impl TryFrom<FindPathRequest> for Vec<Flight> {
    type Error = Error;

    fn try_from(request: FindPathRequest) -> Result<Self, Self::Error> {
        request
            .0
            .into_iter()
            .enumerate()
            .map(|(index, record)| match <[String; 2]>::try_from(record) {
                Ok([source, destination]) => Ok(Flight::new(source, destination)),
                Err(record) => Err(Error::InvalidRecord {
                    index,
                    len: record.len(),
                }),
            })
            .collect()
    }
}

impl From<Path> for FindPathResponse {
    fn from(path: Path) -> Self {
        Self([path.start.into(), path.finish.into()])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("each flight record should have two airports: record {index} has {len}")]
    InvalidRecord { index: usize, len: usize },
}
