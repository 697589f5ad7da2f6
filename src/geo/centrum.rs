use std::fmt;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::geo::great_circle::GreatCircleRoute;
use crate::geo::{normalize_bearing, round_to, GeoError};
use crate::host::LandmarkLocator;
use crate::WorldCoordinate;

/// Decimal places kept on every calibration factor.
pub const ROUNDING_ACCURACY: i32 = 7;

/// Space-center structures used to calibrate the reference frame.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Landmark {
    FlagPole,
    VehicleAssemblyBuilding,
}

impl fmt::Display for Landmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Landmark::FlagPole => write!(f, "flag pole"),
            Landmark::VehicleAssemblyBuilding => write!(f, "vehicle assembly building"),
        }
    }
}

/// Bearing, distance and climb from one landmark to another.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Baseline {
    pub bearing: f64,
    pub distance: f64,
    pub altitude_delta: f64,
}

impl Baseline {
    /// Flag pole to VAB as measured on a stock install.
    pub const FLAG_TO_VAB: Baseline = Baseline {
        bearing: 94.3833870273274,
        distance: 357.331095037448,
        altitude_delta: 3.16247489920352,
    };

    pub fn of_route(route: &GreatCircleRoute) -> Self {
        Baseline {
            bearing: route.forward_azimuth,
            distance: route.distance_at_origin_altitude,
            altitude_delta: route.delta_asl,
        }
    }
}

/// A stored offset from the centrum, in baseline units.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct PolarOffset {
    pub forward_azimuth: f64,
    pub distance: f64,
    pub altitude_delta: f64,
}

/// The "centrum": landmark A plus the rotation and scaling that map stored
/// offsets onto the currently loaded world.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct ReferenceFrame {
    pub coordinates: WorldCoordinate,
    pub angular_offset: f64,
    pub horizontal_scale: f64,
    pub vertical_scale: f64,
}

impl ReferenceFrame {
    pub fn build(
        landmark_a: WorldCoordinate,
        landmark_b: WorldCoordinate,
        baseline: Baseline,
    ) -> Result<Self, GeoError> {
        debug!(
            "centrum = lat:{} long:{} alt:{} radius:{}",
            landmark_a.latitude, landmark_a.longitude, landmark_a.altitude, landmark_a.radius
        );
        let route = GreatCircleRoute::between(landmark_a, landmark_b)?;
        debug!(
            "calibration route bearing:{} dist:{} alt:{}",
            route.forward_azimuth, route.distance_at_origin_altitude, route.delta_asl
        );
        let frame = Self::from_measurements(landmark_a, Baseline::of_route(&route), baseline);
        info!(
            "reference frame offset:{} degrees, scaling:{}(h) x {}(v)",
            frame.angular_offset, frame.horizontal_scale, frame.vertical_scale
        );
        Ok(frame)
    }

    pub fn from_measurements(
        coordinates: WorldCoordinate,
        measured: Baseline,
        baseline: Baseline,
    ) -> Self {
        ReferenceFrame {
            coordinates,
            angular_offset: round_to(measured.bearing - baseline.bearing, ROUNDING_ACCURACY),
            horizontal_scale: round_to(measured.distance / baseline.distance, ROUNDING_ACCURACY),
            vertical_scale: round_to(
                measured.altitude_delta / baseline.altitude_delta,
                ROUNDING_ACCURACY,
            ),
        }
    }

    /// Calibrates against the host's flag pole and VAB.
    pub fn from_host<L: LandmarkLocator + ?Sized>(host: &L) -> Result<Self, GeoError> {
        let flag = host
            .landmark_position(Landmark::FlagPole)
            .ok_or(GeoError::LandmarkNotFound(Landmark::FlagPole))?;
        let vab = host
            .landmark_position(Landmark::VehicleAssemblyBuilding)
            .ok_or(GeoError::LandmarkNotFound(Landmark::VehicleAssemblyBuilding))?;
        Self::build(flag, vab, Baseline::FLAG_TO_VAB)
    }

    /// Absolute position of a stored offset.
    pub fn locate(&self, offset: &PolarOffset) -> WorldCoordinate {
        self.coordinates.project(
            offset.forward_azimuth + self.angular_offset,
            offset.distance * self.horizontal_scale,
            offset.altitude_delta * self.vertical_scale,
        )
    }

    /// Inverse of [`ReferenceFrame::locate`].
    pub fn offset_of(&self, position: &WorldCoordinate) -> Result<PolarOffset, GeoError> {
        if self.horizontal_scale == 0.0 {
            return Err(GeoError::DegenerateScale { axis: "horizontal" });
        }
        if self.vertical_scale == 0.0 {
            return Err(GeoError::DegenerateScale { axis: "vertical" });
        }
        let route = GreatCircleRoute::between(self.coordinates, *position)?;
        Ok(PolarOffset {
            forward_azimuth: normalize_bearing(route.forward_azimuth - self.angular_offset),
            distance: route.distance_at_origin_altitude / self.horizontal_scale,
            altitude_delta: route.delta_asl / self.vertical_scale,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn flag() -> WorldCoordinate {
        WorldCoordinate::new(-0.0941, -74.6538, 65.76, 600_000.0)
    }

    #[test]
    fn identical_measurements_give_identity_frame() {
        let frame =
            ReferenceFrame::from_measurements(flag(), Baseline::FLAG_TO_VAB, Baseline::FLAG_TO_VAB);
        assert_eq!(frame.angular_offset, 0.0);
        assert_eq!(frame.horizontal_scale, 1.0);
        assert_eq!(frame.vertical_scale, 1.0);
    }

    #[test]
    fn stock_layout_calibrates_to_identity() {
        let base = Baseline::FLAG_TO_VAB;
        let vab = flag().project(base.bearing, base.distance, base.altitude_delta);
        let frame = ReferenceFrame::build(flag(), vab, base).unwrap();
        assert_eq!(frame.angular_offset, 0.0);
        assert_eq!(frame.horizontal_scale, 1.0);
        assert_eq!(frame.vertical_scale, 1.0);
    }

    #[test]
    fn shifted_layout_is_measured() {
        let base = Baseline::FLAG_TO_VAB;
        let vab = flag().project(
            base.bearing + 2.5,
            base.distance * 1.1,
            base.altitude_delta * 2.0,
        );
        let frame = ReferenceFrame::build(flag(), vab, base).unwrap();
        assert_approx_eq!(frame.angular_offset, 2.5, 1e-6);
        assert_approx_eq!(frame.horizontal_scale, 1.1, 1e-6);
        assert_approx_eq!(frame.vertical_scale, 2.0, 1e-6);
    }

    #[test]
    fn offsets_survive_locate_and_back() {
        let base = Baseline::FLAG_TO_VAB;
        let vab = flag().project(base.bearing - 1.0, base.distance * 0.9, base.altitude_delta);
        let frame = ReferenceFrame::build(flag(), vab, base).unwrap();
        let offset = PolarOffset {
            forward_azimuth: 210.0,
            distance: 800.0,
            altitude_delta: -12.0,
        };
        let absolute = frame.locate(&offset);
        let back = frame.offset_of(&absolute).unwrap();
        assert_approx_eq!(back.forward_azimuth, offset.forward_azimuth, 1e-6);
        assert_approx_eq!(back.distance, offset.distance, 1e-6);
        assert_approx_eq!(back.altitude_delta, offset.altitude_delta, 1e-6);
    }

    #[test]
    fn flat_frame_cannot_be_inverted() {
        let frame = ReferenceFrame {
            coordinates: flag(),
            angular_offset: 0.0,
            horizontal_scale: 1.0,
            vertical_scale: 0.0,
        };
        assert_eq!(
            frame.offset_of(&flag()).unwrap_err(),
            GeoError::DegenerateScale { axis: "vertical" }
        );
    }
}
