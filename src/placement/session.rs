use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use once_cell::unsync::OnceCell;

use crate::data::settings::SettingsFile;
use crate::data::{DataError, ITEMS_FILENAME, LOCATION_SUBDIRECTORY, SETTINGS_FILENAME};
use crate::geo::centrum::ReferenceFrame;
use crate::geo::GeoError;
use crate::host::{
    ActorTracker, FacilityLevelSource, InventoryCapability, InventoryCatalog, LandmarkLocator,
};
use crate::placement::allocation::Allocations;
use crate::placement::PlacementError;
use crate::registry::items::ItemRegistry;
use crate::registry::locations::{ClosestLocales, LocationRegistry};

/// Everything that belongs to one loaded world. Build a fresh one on every
/// world load and drop it on unload; nothing here survives into a different
/// save.
pub struct Session {
    mod_directory: PathBuf,
    pub settings: SettingsFile,
    pub locations: LocationRegistry,
    pub items: ItemRegistry,
    pub allocations: Allocations,
    frame: OnceCell<ReferenceFrame>,
    inventory: Option<Box<dyn InventoryCapability>>,
}

impl Session {
    /// Loads settings, location files and item ranks from `mod_directory`.
    /// `inventory` is the result of probing for the companion inventory
    /// plugin; without it no items are offered.
    pub fn open<P, H>(
        mod_directory: P,
        host: &H,
        inventory: Option<Box<dyn InventoryCapability>>,
    ) -> Self
    where
        P: AsRef<Path>,
        H: FacilityLevelSource + InventoryCatalog + ?Sized,
    {
        let mod_directory = mod_directory.as_ref().to_path_buf();
        let settings = SettingsFile::load(mod_directory.join(SETTINGS_FILENAME));

        let mut locations = LocationRegistry::new(mod_directory.join(LOCATION_SUBDIRECTORY));
        locations.refresh(host);

        let mut items = ItemRegistry::new(
            mod_directory.join(ITEMS_FILENAME),
            settings.settings.max_inventory_volume,
        );
        if inventory.is_some() {
            items.refresh(host);
        } else {
            info!("inventory plugin not detected, items disabled");
        }

        info!(
            "session opened in {} with {} locations ({} available), {} items",
            mod_directory.display(),
            locations.len(),
            locations.available_count(),
            items.len()
        );
        Session {
            mod_directory,
            settings,
            locations,
            items,
            allocations: Allocations::default(),
            frame: OnceCell::new(),
            inventory,
        }
    }

    pub fn mod_directory(&self) -> &Path {
        &self.mod_directory
    }

    pub fn has_inventory(&self) -> bool {
        self.inventory.is_some()
    }

    /// The reference frame for this world, calibrated on first use.
    pub fn frame<L: LandmarkLocator + ?Sized>(
        &self,
        host: &L,
    ) -> Result<&ReferenceFrame, GeoError> {
        self.frame.get_or_try_init(|| ReferenceFrame::from_host(host))
    }

    /// Call after a facility upgrade.
    pub fn refresh_locations<L: FacilityLevelSource + ?Sized>(&mut self, host: &L) {
        debug!("refreshing locations");
        self.locations.refresh(host);
    }

    /// Call after new research completes.
    pub fn refresh_items<C: InventoryCatalog + ?Sized>(&mut self, host: &C) {
        if self.inventory.is_some() {
            debug!("refreshing items");
            self.items.refresh(host);
        }
    }

    /// Nearest known location per facility tier, measured from the actor.
    pub fn closest_to_actor<H>(&self, host: &H) -> Result<ClosestLocales, PlacementError>
    where
        H: ActorTracker + LandmarkLocator + ?Sized,
    {
        let actor = host
            .actor_position()
            .ok_or(PlacementError::ActorUnavailable)?;
        let frame = self.frame(host)?;
        Ok(self.locations.find_closest(&actor.coordinate, frame)?)
    }

    /// Hands a freshly instantiated character the items allocated to it.
    /// Returns the ids the inventory plugin assigned.
    pub fn stock_inventory(&mut self, character: &str) -> Vec<u64> {
        let Some(inventory) = self.inventory.as_mut() else {
            debug!("inventory plugin not installed");
            return Vec::new();
        };
        let Some(items) = self.allocations.take(character) else {
            debug!("{character} has no items to add to inventory");
            return Vec::new();
        };

        let mut ids = Vec::with_capacity(items.len());
        for item in &items {
            match inventory.try_add_item(character, item, 1) {
                Some(id) => ids.push(id),
                None => warn!("unable to add {item} to {character}'s inventory"),
            }
        }
        ids
    }

    /// Writes every file with unsaved changes.
    pub fn save_pending(&mut self) -> Result<(), DataError> {
        if self.settings.is_changed() {
            self.settings.save()?;
        }
        if self.locations.is_changed() {
            self.locations.save()?;
        }
        if self.items.is_changed() {
            self.items.save()?;
        }
        Ok(())
    }

    /// Flushes pending writes before the world goes away.
    pub fn close(mut self) -> Result<(), DataError> {
        let result = self.save_pending();
        info!("session closed for {}", self.mod_directory.display());
        result
    }
}
