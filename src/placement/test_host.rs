//! In-memory host used by the placement unit tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::geo::centrum::{Baseline, Landmark};
use crate::host::{
    ActorPosition, ActorTracker, EntitySpawner, FacilityLevelSource, HostError,
    InventoryCapability, InventoryCatalog, ItemDefinition, LandmarkLocator, SpawnRequest, TechGate,
};
use crate::registry::levels::FacilityLevels;
use crate::WorldCoordinate;

pub(crate) fn flag_pole() -> WorldCoordinate {
    WorldCoordinate::new(-0.0941, -74.6538, 65.76, 600_000.0)
}

pub(crate) struct FakeHost {
    pub levels: HashMap<String, FacilityLevels>,
    pub landmarks: HashMap<Landmark, WorldCoordinate>,
    pub actor: Option<ActorPosition>,
    pub catalog: Vec<ItemDefinition>,
    pub spawned: Vec<SpawnRequest>,
    pub refuse_spawn: bool,
}

impl FakeHost {
    /// Stock landmark layout, every facility at level 1.
    pub fn stock() -> Self {
        let base = Baseline::FLAG_TO_VAB;
        let flag = flag_pole();
        let vab = flag.project(base.bearing, base.distance, base.altitude_delta);
        let landmarks = HashMap::from([
            (Landmark::FlagPole, flag),
            (Landmark::VehicleAssemblyBuilding, vab),
        ]);
        let levels = ["LaunchPad", "Runway", "VAB"]
            .into_iter()
            .map(|f| (f.to_string(), FacilityLevels::LEVEL_1))
            .collect();
        let item = |name: &str, volume: f32| ItemDefinition {
            name: name.to_string(),
            title: name.to_uppercase(),
            cost: 25.0,
            volume,
            tech: TechGate::Researched,
        };
        FakeHost {
            levels,
            landmarks,
            actor: None,
            catalog: vec![item("wrench", 2.0), item("drill", 12.0)],
            spawned: Vec::new(),
            refuse_spawn: false,
        }
    }

    pub fn stand_at(&mut self, coordinate: WorldCoordinate) {
        self.actor = Some(ActorPosition {
            coordinate,
            normal: [0.0, 1.0, 0.0],
            rotation: [0.0, 0.0, 0.0, 1.0],
        });
    }
}

impl FacilityLevelSource for FakeHost {
    fn facility_level(&self, facility: &str) -> FacilityLevels {
        self.levels.facility_level(facility)
    }
}

impl LandmarkLocator for FakeHost {
    fn landmark_position(&self, landmark: Landmark) -> Option<WorldCoordinate> {
        self.landmarks.get(&landmark).copied()
    }
}

impl ActorTracker for FakeHost {
    fn actor_position(&self) -> Option<ActorPosition> {
        self.actor
    }
}

impl EntitySpawner for FakeHost {
    fn spawn(&mut self, request: &SpawnRequest) -> Result<(), HostError> {
        if self.refuse_spawn {
            return Err(HostError::Refused("no room on the pad".into()));
        }
        self.spawned.push(request.clone());
        Ok(())
    }
}

impl InventoryCatalog for FakeHost {
    fn inventory_definitions(&self) -> Vec<ItemDefinition> {
        self.catalog.clone()
    }
}

/// Inventory plugin that records what it was asked to add.
#[derive(Clone, Default)]
pub(crate) struct RecordingInventory {
    pub added: Rc<RefCell<Vec<(String, String)>>>,
}

impl InventoryCapability for RecordingInventory {
    fn try_add_item(&mut self, character: &str, item: &str, _quantity: u32) -> Option<u64> {
        if item == "unobtainium" {
            return None;
        }
        let mut added = self.added.borrow_mut();
        added.push((character.to_string(), item.to_string()));
        Some(added.len() as u64)
    }
}
