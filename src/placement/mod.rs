pub mod allocation;
pub mod coordinator;
pub mod session;
#[cfg(test)]
pub(crate) mod test_host;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::settings::PostPlacementAction;
use crate::geo::GeoError;
use crate::host::HostError;
use crate::registry::RegistryError;
use crate::WorldCoordinate;

#[derive(Debug, Error)]
pub enum PlacementError {
    #[error(transparent)]
    Geo(#[from] GeoError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("unknown location {0}")]
    UnknownLocation(String),
    #[error("unable to place {character}: {source}")]
    HostEntityCreation {
        character: String,
        #[source]
        source: HostError,
    },
    #[error("the host reports no active actor")]
    ActorUnavailable,
}

/// A finished selection from the placement picker.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlacementRequest {
    pub character: String,
    pub location: String,
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct PlacementReport {
    pub character: String,
    pub location: String,
    pub coordinate: WorldCoordinate,
    pub items: Vec<String>,
    /// What the host should do next, from settings.
    pub post_placement_action: PostPlacementAction,
    /// True when re-ranking succeeded in memory but a backing file could not
    /// be written; the next save retries it.
    pub files_pending: bool,
}
