use log::{debug, info, warn};

use crate::host::{SpaceCenterHost, SpawnRequest};
use crate::placement::session::Session;
use crate::placement::{PlacementError, PlacementReport, PlacementRequest};
use crate::registry::locations::{LocationKey, LocationRequest};
use crate::registry::RegistryError;

/// Turns picker selections into host spawn requests and feeds the choices
/// back into the rankings.
pub struct PlacementCoordinator<'s> {
    session: &'s mut Session,
}

impl<'s> PlacementCoordinator<'s> {
    pub fn new(session: &'s mut Session) -> Self {
        PlacementCoordinator { session }
    }

    pub fn session(&self) -> &Session {
        self.session
    }

    /// Puts `request.character` down at the chosen location. Rankings are
    /// only touched once the host has accepted the spawn.
    pub fn place<H: SpaceCenterHost + ?Sized>(
        &mut self,
        host: &mut H,
        request: &PlacementRequest,
    ) -> Result<PlacementReport, PlacementError> {
        let frame = *self.session.frame(&*host)?;
        let location = self
            .session
            .locations
            .get(&request.location)
            .ok_or_else(|| PlacementError::UnknownLocation(request.location.clone()))?;
        let coordinate = location.coordinates(&frame);

        let settings = &self.session.settings.settings;
        let item_cost = if request.items.is_empty() {
            0.0
        } else {
            self.session
                .items
                .check_selection(
                    request.items.as_slice(),
                    settings.max_inventory_items as usize,
                    settings.max_inventory_volume,
                )?
                .cost
        };

        let spawn = SpawnRequest {
            character: request.character.clone(),
            location: location.name.clone(),
            coordinate,
            normal: location.normal,
            rotation: location.rotation,
            item_cost,
        };
        debug!(
            "placing {} at {} lat:{} long:{} alt:{}",
            spawn.character,
            spawn.location,
            coordinate.latitude,
            coordinate.longitude,
            coordinate.altitude
        );
        host.spawn(&spawn)
            .map_err(|source| PlacementError::HostEntityCreation {
                character: request.character.clone(),
                source,
            })?;
        info!("{} placed at {}", spawn.character, spawn.location);

        self.session
            .allocations
            .assign(&request.character, request.items.as_slice());

        let mut files_pending = false;
        if !request.items.is_empty() {
            let ranked = self.session.items.update_queueing(request.items.as_slice());
            files_pending |= pending_write(ranked)?;
        }
        let ranked = self.session.locations.update_queuing(&spawn.location);
        files_pending |= pending_write(ranked)?;

        Ok(PlacementReport {
            character: spawn.character,
            location: spawn.location,
            coordinate,
            items: request.items.clone(),
            post_placement_action: self.session.settings.settings.post_placement_action,
            files_pending,
        })
    }

    /// Records where the actor stands as a new location.
    pub fn add_location<H: SpaceCenterHost + ?Sized>(
        &mut self,
        host: &H,
        request: &LocationRequest,
    ) -> Result<LocationKey, PlacementError> {
        let actor = host
            .actor_position()
            .ok_or(PlacementError::ActorUnavailable)?;
        let frame = *self.session.frame(host)?;
        Ok(self
            .session
            .locations
            .add_location(request, &actor, &frame, host)?)
    }
}

/// A failed write leaves the ranks changed in memory and the file marked for
/// the next save.
fn pending_write<T>(result: Result<T, RegistryError>) -> Result<bool, PlacementError> {
    match result {
        Ok(_) => Ok(false),
        Err(RegistryError::Data(err)) => {
            warn!("unable to save rankings: {err}");
            Ok(true)
        }
        Err(err) => Err(err.into()),
    }
}
