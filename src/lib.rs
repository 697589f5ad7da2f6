pub mod data;
pub mod geo;
pub mod host;
pub mod placement;
pub mod registry;

use serde::{Deserialize, Serialize};

use crate::geo::great_circle::GreatCircleRoute;
use crate::geo::GeoError;

/// A point on (or above) a spherical body.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorldCoordinate {
    /// Degrees, positive north.
    pub latitude: f64,
    /// Degrees, positive east.
    pub longitude: f64,
    /// Metres above sea level.
    pub altitude: f64,
    /// Sea-level radius of the body in metres.
    pub radius: f64,
}

impl WorldCoordinate {
    pub fn new(latitude: f64, longitude: f64, altitude: f64, radius: f64) -> Self {
        WorldCoordinate {
            latitude,
            longitude,
            altitude,
            radius,
        }
    }

    pub fn route_to(&self, destination: &WorldCoordinate) -> Result<GreatCircleRoute, GeoError> {
        GreatCircleRoute::between(*self, *destination)
    }

    /// Point reached by travelling `distance` metres along `bearing` at this
    /// point's altitude, then climbing `altitude_delta` metres.
    pub fn project(&self, bearing: f64, distance: f64, altitude_delta: f64) -> WorldCoordinate {
        geo::great_circle::project(self, bearing, distance, altitude_delta)
    }
}
