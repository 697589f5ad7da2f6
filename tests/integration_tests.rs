use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use serde_json::json;
use walkabout::data::{ITEMS_FILENAME, LOCATION_SUBDIRECTORY, USER_LOCATION_FILENAME};
use walkabout::geo::centrum::{Baseline, Landmark};
use walkabout::host::{
    ActorPosition, ActorTracker, EntitySpawner, FacilityLevelSource, HostError,
    InventoryCapability, InventoryCatalog, ItemDefinition, LandmarkLocator, SpawnRequest, TechGate,
};
use walkabout::placement::coordinator::PlacementCoordinator;
use walkabout::placement::session::Session;
use walkabout::placement::PlacementRequest;
use walkabout::registry::levels::FacilityLevels;
use walkabout::registry::locations::LocationRequest;
use walkabout::WorldCoordinate;

struct Host {
    flag: WorldCoordinate,
    vab: WorldCoordinate,
    levels: HashMap<String, FacilityLevels>,
    actor: Option<ActorPosition>,
    spawned: Vec<SpawnRequest>,
}

impl Host {
    fn new() -> Self {
        let base = Baseline::FLAG_TO_VAB;
        let flag = WorldCoordinate::new(-0.0941, -74.6538, 65.76, 600_000.0);
        let levels = [
            ("LaunchPad", FacilityLevels::LEVEL_2),
            ("VAB", FacilityLevels::LEVEL_1),
            ("Runway", FacilityLevels::LEVEL_1),
        ]
        .into_iter()
        .map(|(f, l)| (f.to_string(), l))
        .collect();
        Host {
            flag,
            vab: flag.project(base.bearing, base.distance, base.altitude_delta),
            levels,
            actor: None,
            spawned: Vec::new(),
        }
    }
}

impl FacilityLevelSource for Host {
    fn facility_level(&self, facility: &str) -> FacilityLevels {
        self.levels.facility_level(facility)
    }
}

impl LandmarkLocator for Host {
    fn landmark_position(&self, landmark: Landmark) -> Option<WorldCoordinate> {
        match landmark {
            Landmark::FlagPole => Some(self.flag),
            Landmark::VehicleAssemblyBuilding => Some(self.vab),
        }
    }
}

impl ActorTracker for Host {
    fn actor_position(&self) -> Option<ActorPosition> {
        self.actor
    }
}

impl EntitySpawner for Host {
    fn spawn(&mut self, request: &SpawnRequest) -> Result<(), HostError> {
        self.spawned.push(request.clone());
        Ok(())
    }
}

impl InventoryCatalog for Host {
    fn inventory_definitions(&self) -> Vec<ItemDefinition> {
        vec![
            ItemDefinition {
                name: "evaRepairKit".into(),
                title: "Repair Kit".into(),
                cost: 50.0,
                volume: 5.0,
                tech: TechGate::Researched,
            },
            ItemDefinition {
                name: "evaScienceKit".into(),
                title: "Science Kit".into(),
                cost: 150.0,
                volume: 20.0,
                tech: TechGate::Researched,
            },
        ]
    }
}

struct Inventory;

impl InventoryCapability for Inventory {
    fn try_add_item(&mut self, _character: &str, _item: &str, _quantity: u32) -> Option<u64> {
        Some(7)
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn write_stock_locations(mod_directory: &Path) {
    let location = |name: &str, facility: &str, levels: u8, queueing: u32, bearing: f64| {
        json!({
            "name": name,
            "facility": facility,
            "available_at_levels": levels,
            "queueing": queueing,
            "forward_azimuth": bearing,
            "distance": 400.0,
            "delta_altitude": 2.0,
            "normal": [0.0, 1.0, 0.0],
            "rotation": [0.0, 0.0, 0.0, 1.0]
        })
    };
    let records = json!({
        "locations": [
            location("Pad Stairs", "LaunchPad", 7, 2, 10.0),
            location("Pad Tower", "LaunchPad", 6, 0, 20.0),
            location("VAB Door", "VAB", 7, 1, 120.0),
            location("Runway End", "Runway", 4, 0, 250.0),
            location("Hangar", "Runway", 7, 0, 300.0),
        ]
    });
    let directory = mod_directory.join(LOCATION_SUBDIRECTORY);
    fs::create_dir_all(&directory).unwrap();
    fs::write(
        directory.join("stock.loc"),
        serde_json::to_vec_pretty(&records).unwrap(),
    )
    .unwrap();
}

fn ranks(session: &Session) -> Vec<(String, u32)> {
    session
        .locations
        .iter()
        .map(|l| (l.name.clone(), l.queueing))
        .collect()
}

fn assert_dense(session: &Session) {
    let nonzero: Vec<u32> = session
        .locations
        .iter()
        .map(|l| l.queueing)
        .filter(|&q| q > 0)
        .collect();
    let distinct: BTreeSet<u32> = nonzero.iter().copied().collect();
    assert_eq!(distinct.len(), nonzero.len(), "ranks repeat: {:?}", ranks(session));
    assert_eq!(
        distinct.into_iter().collect::<Vec<_>>(),
        (1..=nonzero.len() as u32).collect::<Vec<_>>()
    );
}

fn place(session: &mut Session, host: &mut Host, location: &str, items: &[&str]) {
    let request = PlacementRequest {
        character: "Valentina".into(),
        location: location.into(),
        items: items.iter().map(|i| i.to_string()).collect(),
    };
    PlacementCoordinator::new(session)
        .place(host, &request)
        .unwrap();
}

#[test]
fn integration_session_lifecycle() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    write_stock_locations(dir.path());
    let mut host = Host::new();

    let mut session = Session::open(dir.path(), &host, Some(Box::new(Inventory)));
    let listed: Vec<&str> = session
        .locations
        .available()
        .map(|l| l.name.as_str())
        .collect();
    assert_eq!(
        listed,
        vec!["Pad Stairs", "VAB Door", "Pad Tower", "Hangar"]
    );

    // First choice lands just above the never-chosen entries.
    place(&mut session, &mut host, "Hangar", &["evaRepairKit"]);
    assert_eq!(session.locations.get("Hangar").unwrap().queueing, 1);
    assert_eq!(session.locations.get("VAB Door").unwrap().queueing, 2);
    assert_eq!(session.locations.get("Pad Stairs").unwrap().queueing, 3);
    assert_dense(&session);
    assert_eq!(host.spawned[0].item_cost, 50.0);
    assert_eq!(session.stock_inventory("Valentina"), vec![7]);

    // Repeated choices climb monotonically to the top and stay there.
    let mut previous = 1;
    for _ in 0..4 {
        place(&mut session, &mut host, "hangar", &[]);
        let rank = session.locations.get("Hangar").unwrap().queueing;
        assert!(rank >= previous);
        assert_dense(&session);
        previous = rank;
    }
    assert_eq!(session.locations.available().next().unwrap().name, "Hangar");

    // Record a new location where the actor stands.
    let spot = host.flag.project(75.0, 60.0, 0.5);
    host.actor = Some(ActorPosition {
        coordinate: spot,
        normal: [0.0, 1.0, 0.0],
        rotation: [0.0, 0.0, 0.0, 1.0],
    });
    PlacementCoordinator::new(&mut session)
        .add_location(
            &host,
            &LocationRequest {
                name: "Flag".into(),
                facility: "VAB".into(),
            },
        )
        .unwrap();
    let closest = session.closest_to_actor(&host).unwrap();
    assert_eq!(closest.tier(1).unwrap().name, "Flag");
    assert!(closest.tier(1).unwrap().distance < 1e-3);

    let before = ranks(&session);
    session.close().unwrap();
    assert!(dir.path().join(ITEMS_FILENAME).exists());
    assert!(dir
        .path()
        .join(LOCATION_SUBDIRECTORY)
        .join(USER_LOCATION_FILENAME)
        .exists());

    let reopened = Session::open(dir.path(), &host, Some(Box::new(Inventory)));
    let mut after = ranks(&reopened);
    let mut expected = before;
    after.sort();
    expected.sort();
    assert_eq!(after, expected);
    assert_eq!(reopened.items.get("evaRepairKit").unwrap().queueing, 1);
    assert!(reopened.settings.status.is_loaded());
}

#[test]
fn integration_missing_files_fall_back_to_defaults() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let host = Host::new();
    let session = Session::open(dir.path().join("not-there"), &host, None);
    assert!(session.locations.is_empty());
    assert!(!session.settings.status.is_loaded());
    assert_eq!(session.settings.settings.max_inventory_items, 6);
}
