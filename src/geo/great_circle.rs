use serde::{Deserialize, Serialize};

use crate::geo::{normalize_bearing, normalize_longitude, GeoError};
use crate::WorldCoordinate;

/// Great circle route between two points on the same spherical body.
///
/// Formulas follow the haversine / initial-bearing forms described at
/// <http://www.movable-type.co.uk/scripts/latlong.html>.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct GreatCircleRoute {
    pub origin: WorldCoordinate,
    pub destination: WorldCoordinate,
    /// Destination altitude minus origin altitude.
    pub delta_asl: f64,
    pub distance_at_sea_level: f64,
    pub distance_at_origin_altitude: f64,
    pub distance_at_destination_altitude: f64,
    /// Mean of the origin- and destination-altitude distances.
    pub distance_with_altitude_change: f64,
    /// Initial bearing in degrees, [0, 360).
    pub forward_azimuth: f64,
}

impl GreatCircleRoute {
    pub fn between(
        origin: WorldCoordinate,
        destination: WorldCoordinate,
    ) -> Result<Self, GeoError> {
        if origin.radius <= 0.0 {
            return Err(GeoError::InvalidRadius(origin.radius));
        }
        if origin.radius != destination.radius {
            return Err(GeoError::CoordinateMismatch {
                origin: origin.radius,
                destination: destination.radius,
            });
        }

        let radius = origin.radius;
        let start_lat = origin.latitude.to_radians();
        let start_long = origin.longitude.to_radians();
        let end_lat = destination.latitude.to_radians();
        let end_long = destination.longitude.to_radians();
        let delta_lat = end_lat - start_lat;
        let delta_long = end_long - start_long;

        // a = sin²(Δφ/2) + cos φ1 ⋅ cos φ2 ⋅ sin²(Δλ/2)
        let a = (delta_lat / 2.0).sin().powi(2)
            + start_lat.cos() * end_lat.cos() * (delta_long / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        let distance_at_origin_altitude = ((radius + origin.altitude) * c).abs();
        let distance_at_destination_altitude = ((radius + destination.altitude) * c).abs();

        let forward_azimuth = if c == 0.0 {
            0.0
        } else {
            // θ = atan2(sin Δλ ⋅ cos φ2, cos φ1 ⋅ sin φ2 − sin φ1 ⋅ cos φ2 ⋅ cos Δλ)
            let y = delta_long.sin() * end_lat.cos();
            let x = start_lat.cos() * end_lat.sin()
                - start_lat.sin() * end_lat.cos() * delta_long.cos();
            normalize_bearing(y.atan2(x).to_degrees())
        };

        Ok(GreatCircleRoute {
            origin,
            destination,
            delta_asl: destination.altitude - origin.altitude,
            distance_at_sea_level: radius * c,
            distance_at_origin_altitude,
            distance_at_destination_altitude,
            distance_with_altitude_change: (distance_at_origin_altitude
                + distance_at_destination_altitude)
                / 2.0,
            forward_azimuth,
        })
    }

    pub fn radius(&self) -> f64 {
        self.origin.radius
    }
}

/// Direct geodesic on a sphere: the point `distance` metres from `origin` along
/// `bearing` degrees, measured on the sphere through the origin's altitude.
pub fn project(
    origin: &WorldCoordinate,
    bearing: f64,
    distance: f64,
    altitude_delta: f64,
) -> WorldCoordinate {
    let start_lat = origin.latitude.to_radians();
    let start_long = origin.longitude.to_radians();
    let angular_distance = distance / (origin.radius + origin.altitude);
    let theta = bearing.to_radians();

    // φ2 = asin(sin φ1 ⋅ cos δ + cos φ1 ⋅ sin δ ⋅ cos θ)
    let end_lat = (start_lat.sin() * angular_distance.cos()
        + start_lat.cos() * angular_distance.sin() * theta.cos())
    .clamp(-1.0, 1.0)
    .asin();

    // λ2 = λ1 + atan2(sin θ ⋅ sin δ ⋅ cos φ1, cos δ − sin φ1 ⋅ sin φ2)
    let y = theta.sin() * angular_distance.sin() * start_lat.cos();
    let x = angular_distance.cos() - start_lat.sin() * end_lat.sin();
    let end_long = start_long + y.atan2(x);

    WorldCoordinate {
        latitude: end_lat.to_degrees(),
        longitude: normalize_longitude(end_long.to_degrees()),
        altitude: origin.altitude + altitude_delta,
        radius: origin.radius,
    }
}
