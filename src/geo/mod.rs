pub mod centrum;
pub mod great_circle;

use thiserror::Error;

use crate::geo::centrum::Landmark;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeoError {
    #[error("great circle endpoints lie on different bodies (radius {origin} vs {destination})")]
    CoordinateMismatch { origin: f64, destination: f64 },
    #[error("great circle calculations require a positive radius, got {0}")]
    InvalidRadius(f64),
    #[error("landmark {0} could not be located")]
    LandmarkNotFound(Landmark),
    #[error("reference frame has a zero {axis} scale")]
    DegenerateScale { axis: &'static str },
}

/// Folds any angle in degrees into [0, 360).
pub fn normalize_bearing(degrees: f64) -> f64 {
    let folded = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if folded >= 360.0 {
        0.0
    } else {
        folded
    }
}

/// Folds a longitude in degrees into [-180, 180).
pub fn normalize_longitude(degrees: f64) -> f64 {
    let folded = (degrees + 180.0).rem_euclid(360.0) - 180.0;
    if folded >= 180.0 {
        -180.0
    } else {
        folded
    }
}

/// Rounds to `digits` decimal places, halves away from zero.
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}
