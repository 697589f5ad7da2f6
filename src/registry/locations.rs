use std::cell::Cell;
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::data::{
    read_records, write_records, DataError, LOCATION_FILE_EXTENSION, UNREADABLE_BACKUP_EXTENSION,
    USER_LOCATION_FILENAME,
};
use crate::geo::centrum::{PolarOffset, ReferenceFrame};
use crate::geo::great_circle::GreatCircleRoute;
use crate::geo::GeoError;
use crate::host::{ActorPosition, FacilityLevelSource};
use crate::registry::levels::FacilityLevels;
use crate::registry::{requeue, Ranked, RegistryError, Requeue};
use crate::WorldCoordinate;

/// Case-insensitive location name, used as the registry key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationKey(String);

impl LocationKey {
    pub fn new(name: &str) -> Self {
        LocationKey(name.to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LocationKey {
    fn from(name: &str) -> Self {
        LocationKey::new(name)
    }
}

/// Index of a location file within its registry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FileId(usize);

/// A place where a character can be put down, stored as an offset from the
/// reference frame's centrum.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub facility: String,
    pub available_at_levels: FacilityLevels,
    #[serde(default)]
    pub queueing: u32,
    pub forward_azimuth: f64,
    pub distance: f64,
    pub delta_altitude: f64,
    /// Local "up" at the location.
    #[serde(default)]
    pub normal: [f64; 3],
    /// Orientation given to anyone placed here.
    #[serde(default)]
    pub rotation: [f64; 4],
    #[serde(skip)]
    file: FileId,
    /// Last position worked out, with the frame it was worked out for.
    #[serde(skip)]
    coordinates: Cell<Option<(ReferenceFrame, WorldCoordinate)>>,
}

impl Location {
    pub fn new(
        name: &str,
        facility: &str,
        available_at_levels: FacilityLevels,
        offset: PolarOffset,
    ) -> Self {
        Location {
            name: name.to_string(),
            facility: facility.to_string(),
            available_at_levels,
            queueing: 0,
            forward_azimuth: offset.forward_azimuth,
            distance: offset.distance,
            delta_altitude: offset.altitude_delta,
            normal: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
            file: FileId::default(),
            coordinates: Cell::new(None),
        }
    }

    pub fn key(&self) -> LocationKey {
        LocationKey::new(&self.name)
    }

    pub fn file(&self) -> FileId {
        self.file
    }

    pub fn offset(&self) -> PolarOffset {
        PolarOffset {
            forward_azimuth: self.forward_azimuth,
            distance: self.distance,
            altitude_delta: self.delta_altitude,
        }
    }

    /// Absolute position in the world `frame` was calibrated in. Kept until a
    /// different frame asks.
    pub fn coordinates(&self, frame: &ReferenceFrame) -> WorldCoordinate {
        if let Some((cached_for, position)) = self.coordinates.get() {
            if cached_for == *frame {
                return position;
            }
        }
        let position = frame.locate(&self.offset());
        debug!(
            "set location {} to lat:{} long:{} alt:{}",
            self.name, position.latitude, position.longitude, position.altitude
        );
        self.coordinates.set(Some((*frame, position)));
        position
    }
}

impl Ranked for Location {
    fn queueing(&self) -> u32 {
        self.queueing
    }

    fn set_queueing(&mut self, queueing: u32) {
        self.queueing = queueing;
    }
}

/// Listing order: most preferred first, then facility and name.
pub fn display_order(a: &Location, b: &Location) -> Ordering {
    b.queueing.cmp(&a.queueing).then_with(|| {
        a.facility
            .bytes()
            .chain(a.name.bytes())
            .cmp(b.facility.bytes().chain(b.name.bytes()))
    })
}

/// One backing file of locations.
#[derive(Clone, Debug)]
pub struct LocationFile {
    pub path: PathBuf,
    changed: bool,
}

impl LocationFile {
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    fn is_user_file(&self) -> bool {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.eq_ignore_ascii_case(USER_LOCATION_FILENAME))
    }
}

#[derive(Debug, Default, Deserialize)]
struct LocationRecords {
    #[serde(default)]
    locations: Vec<Location>,
}

#[derive(Serialize)]
struct LocationRecordsRef<'a> {
    locations: Vec<&'a Location>,
}

/// What the user asked for when recording a new location.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocationRequest {
    pub name: String,
    pub facility: String,
}

/// Nearby location as reported to the add-location utility.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Locale {
    pub name: String,
    /// Great circle distance at the location's altitude.
    pub horizontal: f64,
    /// Location altitude minus query altitude.
    pub vertical: f64,
    /// Distance with altitude change.
    pub distance: f64,
}

/// Nearest location unlockable at each facility tier.
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct ClosestLocales([Option<Locale>; FacilityLevels::TIERS]);

impl ClosestLocales {
    /// `tier` is 1-based.
    pub fn tier(&self, tier: usize) -> Option<&Locale> {
        self.0.get(tier.checked_sub(1)?)?.as_ref()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Option<&Locale>)> {
        self.0.iter().enumerate().map(|(i, l)| (i + 1, l.as_ref()))
    }
}

/// All known locations, grouped by the files they live in.
#[derive(Debug)]
pub struct LocationRegistry {
    directory: PathBuf,
    files: Vec<LocationFile>,
    locations: IndexMap<LocationKey, Location>,
    available: Vec<LocationKey>,
    available_facilities: IndexMap<String, FacilityLevels>,
    /// Files that failed to load; never overwritten in place.
    unreadable: Vec<PathBuf>,
}

impl LocationRegistry {
    /// An empty registry that loads `*.loc` files from `directory` on first
    /// refresh.
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        LocationRegistry {
            directory: directory.as_ref().to_path_buf(),
            files: Vec::new(),
            locations: IndexMap::new(),
            available: Vec::new(),
            available_facilities: IndexMap::new(),
            unreadable: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn files(&self) -> &[LocationFile] {
        &self.files
    }

    pub fn is_changed(&self) -> bool {
        self.files.iter().any(LocationFile::is_changed)
    }

    pub fn get(&self, name: &str) -> Option<&Location> {
        self.locations.get(&LocationKey::new(name))
    }

    pub fn has_location(&self, name: &str) -> bool {
        self.locations.contains_key(&LocationKey::new(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.locations.values()
    }

    /// Locations unlocked at current facility levels, in listing order.
    pub fn available(&self) -> impl Iterator<Item = &Location> {
        self.available.iter().map(move |key| &self.locations[key])
    }

    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    /// Facilities with at least one available location, with their level.
    pub fn available_facilities(&self) -> &IndexMap<String, FacilityLevels> {
        &self.available_facilities
    }

    /// Registers the contents of one backing file. Names already known are
    /// skipped.
    pub fn insert_file<P: AsRef<Path>>(&mut self, path: P, locations: Vec<Location>) -> FileId {
        let id = FileId(self.files.len());
        self.files.push(LocationFile {
            path: path.as_ref().to_path_buf(),
            changed: false,
        });
        for mut location in locations {
            let key = location.key();
            if self.locations.contains_key(&key) {
                warn!(
                    "duplicate location {} in {} ignored",
                    location.name,
                    path.as_ref().display()
                );
                continue;
            }
            location.file = id;
            self.locations.insert(key, location);
        }
        id
    }

    /// Re-evaluates which locations are unlocked. Loads the location files
    /// first if none have been registered yet.
    pub fn refresh<L: FacilityLevelSource + ?Sized>(&mut self, levels: &L) {
        if self.files.is_empty() {
            self.load_location_files();
        }

        self.available.clear();
        self.available_facilities.clear();
        for (key, location) in &self.locations {
            let current = levels.facility_level(&location.facility);
            if location.available_at_levels.intersects(current) {
                self.available.push(key.clone());
                self.available_facilities
                    .entry(location.facility.clone())
                    .or_insert(current);
            }
        }
        self.sort_available();
        debug!(
            "available = {} of {} locations",
            self.available.len(),
            self.locations.len()
        );
    }

    /// The listing a location picker shows. The "top few" cut only applies
    /// once more than `top_few` locations are available.
    pub fn listed(&self, facility: Option<&str>, top_few: Option<usize>) -> Vec<&Location> {
        let limit = top_few
            .filter(|&n| n > 0 && self.available.len() > n)
            .unwrap_or(usize::MAX);
        self.available()
            .filter(|l| facility.map_or(true, |f| l.facility == f))
            .take(limit)
            .collect()
    }

    /// For each facility tier, the location nearest to `query` that the tier
    /// unlocks. Searches every known location, available or not.
    pub fn find_closest(
        &self,
        query: &WorldCoordinate,
        frame: &ReferenceFrame,
    ) -> Result<ClosestLocales, GeoError> {
        let mut closest = ClosestLocales::default();
        for location in self.locations.values() {
            let route = GreatCircleRoute::between(*query, location.coordinates(frame))?;
            for (slot, tier) in closest.0.iter_mut().zip(1..=FacilityLevels::TIERS) {
                let Some(mask) = FacilityLevels::tier(tier) else {
                    continue;
                };
                if !location.available_at_levels.intersects(mask) {
                    continue;
                }
                let nearer = slot
                    .as_ref()
                    .map_or(true, |best| route.distance_with_altitude_change < best.distance);
                if nearer {
                    *slot = Some(Locale {
                        name: location.name.clone(),
                        horizontal: route.distance_at_destination_altitude,
                        vertical: route.delta_asl,
                        distance: route.distance_with_altitude_change,
                    });
                }
            }
        }
        Ok(closest)
    }

    /// Records the actor's current position as a new location in the user
    /// file.
    pub fn add_location<L: FacilityLevelSource + ?Sized>(
        &mut self,
        request: &LocationRequest,
        actor: &ActorPosition,
        frame: &ReferenceFrame,
        levels: &L,
    ) -> Result<LocationKey, RegistryError> {
        if self.has_location(&request.name) {
            return Err(RegistryError::DuplicateName(request.name.clone()));
        }

        let offset = frame.offset_of(&actor.coordinate)?;
        let mut location = Location::new(
            &request.name,
            &request.facility,
            levels.facility_level(&request.facility),
            offset,
        );
        location.normal = actor.normal;
        location.rotation = actor.rotation;

        let file = self.user_file()?;
        location.file = file;
        let key = location.key();
        debug!(
            "requested location {} created at {:?} in {}",
            location.name,
            offset,
            self.files[file.0].path.display()
        );
        self.locations.insert(key.clone(), location);
        self.files[file.0].changed = true;

        self.refresh(levels);
        info!("{} added to known locations", request.name);
        Ok(key)
    }

    /// Moves a chosen location up the listing and persists the result.
    pub fn update_queuing(&mut self, name: &str) -> Result<Requeue<LocationKey>, RegistryError> {
        let key = LocationKey::new(name);
        let outcome = requeue(&mut self.locations, &key, display_order)
            .ok_or_else(|| RegistryError::UnknownLocation(name.to_string()))?;
        if outcome.is_unchanged() {
            debug!("requeueing {} from {}: no change", name, outcome.from);
            return Ok(outcome);
        }

        debug!("requeueing {} from {} to {}", name, outcome.from, outcome.to);
        for touched in &outcome.touched {
            let file = self.locations[touched].file;
            self.files[file.0].changed = true;
        }
        self.sort_available();
        self.save()?;
        Ok(outcome)
    }

    /// Writes every changed file. Files that fail stay marked as changed.
    pub fn save(&mut self) -> Result<usize, DataError> {
        let mut saved = 0;
        let mut first_error = None;
        for (index, file) in self.files.iter_mut().enumerate() {
            if !file.changed {
                debug!("no save required for {}", file.path.display());
                continue;
            }
            let records = LocationRecordsRef {
                locations: self
                    .locations
                    .values()
                    .filter(|l| l.file == FileId(index))
                    .collect(),
            };
            match write_records(&records, &file.path) {
                Ok(()) => {
                    info!("saved locations to {}", file.path.display());
                    file.changed = false;
                    saved += 1;
                }
                Err(err) => {
                    warn!("unable to save locations to {}: {err}", file.path.display());
                    first_error.get_or_insert(err);
                }
            }
        }
        debug!("{} location files checked for saving", self.files.len());
        match first_error {
            Some(err) => Err(err),
            None => Ok(saved),
        }
    }

    fn sort_available(&mut self) {
        let locations = &self.locations;
        self.available
            .sort_by(|a, b| display_order(&locations[a], &locations[b]));
    }

    fn user_file(&mut self) -> Result<FileId, DataError> {
        if let Some(index) = self.files.iter().position(LocationFile::is_user_file) {
            return Ok(FileId(index));
        }
        let path = self.directory.join(USER_LOCATION_FILENAME);
        if self.unreadable.contains(&path) {
            let backup = path.with_extension(UNREADABLE_BACKUP_EXTENSION);
            warn!(
                "{} could not be read, moving it to {}",
                path.display(),
                backup.display()
            );
            fs::rename(&path, &backup)?;
            self.unreadable.retain(|p| p != &path);
        }
        debug!("{} not found - creating", path.display());
        Ok(self.insert_file(path, Vec::new()))
    }

    fn load_location_files(&mut self) {
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(
                    "unable to read location directory {}: {err}",
                    self.directory.display()
                );
                return;
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(LOCATION_FILE_EXTENSION))
            })
            .collect();
        paths.sort();

        for path in paths {
            match read_records::<LocationRecords, _>(&path) {
                Ok(records) => {
                    info!(
                        "loaded {} locations from {}",
                        records.locations.len(),
                        path.display()
                    );
                    self.insert_file(&path, records.locations);
                }
                Err(err) => {
                    warn!("unable to load location file {}: {err}", path.display());
                    if !self.unreadable.contains(&path) {
                        self.unreadable.push(path);
                    }
                }
            }
        }
        debug!("{} location files loaded", self.files.len());
    }
}
