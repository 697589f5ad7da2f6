use std::collections::HashMap;
use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use walkabout::data::LOCATION_SUBDIRECTORY;
use walkabout::geo::centrum::{Landmark, ReferenceFrame};
use walkabout::geo::great_circle::GreatCircleRoute;
use walkabout::host::LandmarkLocator;
use walkabout::registry::levels::FacilityLevels;
use walkabout::registry::locations::{ClosestLocales, LocationRegistry};
use walkabout::WorldCoordinate;

/// Landmark positions measured in the world being inspected.
#[derive(Debug, Deserialize)]
struct Landmarks {
    flag_pole: WorldCoordinate,
    vehicle_assembly_building: WorldCoordinate,
}

impl LandmarkLocator for Landmarks {
    fn landmark_position(&self, landmark: Landmark) -> Option<WorldCoordinate> {
        Some(match landmark {
            Landmark::FlagPole => self.flag_pole,
            Landmark::VehicleAssemblyBuilding => self.vehicle_assembly_building,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum InspectRequest {
    Available {
        levels: HashMap<String, FacilityLevels>,
        #[serde(default)]
        facility: Option<String>,
        #[serde(default)]
        top_few: Option<usize>,
    },
    Closest {
        landmarks: Landmarks,
        position: WorldCoordinate,
    },
    Locate {
        landmarks: Landmarks,
        location: String,
    },
    Route {
        origin: WorldCoordinate,
        destination: WorldCoordinate,
    },
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum InspectResponse {
    Available { locations: Vec<ListedLocation> },
    Closest { tiers: ClosestLocales },
    Locate { location: String, coordinate: WorldCoordinate },
    Route { route: GreatCircleRoute },
    Error { message: String },
}

#[derive(Debug, Serialize)]
struct ListedLocation {
    name: String,
    facility: String,
    queueing: u32,
}

fn handle(registry: &mut LocationRegistry, request: InspectRequest) -> Result<InspectResponse> {
    match request {
        InspectRequest::Available {
            levels,
            facility,
            top_few,
        } => {
            registry.refresh(&levels);
            let locations = registry
                .listed(facility.as_deref(), top_few)
                .into_iter()
                .map(|l| ListedLocation {
                    name: l.name.clone(),
                    facility: l.facility.clone(),
                    queueing: l.queueing,
                })
                .collect();
            Ok(InspectResponse::Available { locations })
        }
        InspectRequest::Closest {
            landmarks,
            position,
        } => {
            let frame = ReferenceFrame::from_host(&landmarks)?;
            let tiers = registry.find_closest(&position, &frame)?;
            Ok(InspectResponse::Closest { tiers })
        }
        InspectRequest::Locate {
            landmarks,
            location,
        } => {
            let frame = ReferenceFrame::from_host(&landmarks)?;
            let Some(found) = registry.get(&location) else {
                return Ok(InspectResponse::Error {
                    message: format!("Unknown location {location}"),
                });
            };
            Ok(InspectResponse::Locate {
                location: found.name.clone(),
                coordinate: found.coordinates(&frame),
            })
        }
        InspectRequest::Route {
            origin,
            destination,
        } => Ok(InspectResponse::Route {
            route: origin.route_to(&destination)?,
        }),
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let mod_directory = env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("usage: walkabout_inspect <mod directory>"))?;
    let mut registry = LocationRegistry::new(mod_directory.join(LOCATION_SUBDIRECTORY));
    registry.refresh(&HashMap::<String, FacilityLevels>::new());
    info!(
        "inspecting {} locations from {}",
        registry.len(),
        mod_directory.display()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read request")?;
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<InspectRequest>(&line) {
            Ok(request) => {
                debug!("request {:?}", request);
                handle(&mut registry, request).unwrap_or_else(|err| InspectResponse::Error {
                    message: format!("{err:#}"),
                })
            }
            Err(err) => InspectResponse::Error {
                message: format!("invalid request: {err}"),
            },
        };
        serde_json::to_writer(&mut stdout, &response).context("failed to write response")?;
        writeln!(stdout).context("failed to write response")?;
    }
    Ok(())
}
