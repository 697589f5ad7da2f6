use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::data::{load_or_default, write_records, DataError};
use crate::host::{InventoryCatalog, TechGate};
use crate::registry::{requeue, Ranked, RegistryError, Requeue};

/// Something a character can carry. Only the name and rank are persisted;
/// everything else comes from the live catalog each session.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct InventoryItem {
    pub name: String,
    #[serde(default)]
    pub queueing: u32,
    #[serde(skip)]
    pub title: String,
    #[serde(skip)]
    pub cost: f32,
    /// Litres.
    #[serde(skip)]
    pub volume: f32,
    #[serde(skip)]
    pub available: bool,
}

impl Ranked for InventoryItem {
    fn queueing(&self) -> u32 {
        self.queueing
    }

    fn set_queueing(&mut self, queueing: u32) {
        self.queueing = queueing;
    }
}

/// Listing order: most preferred first, then smallest.
pub fn item_order(a: &InventoryItem, b: &InventoryItem) -> Ordering {
    b.queueing
        .cmp(&a.queueing)
        .then_with(|| a.volume.total_cmp(&b.volume))
}

#[derive(Debug, Default, Deserialize)]
struct ItemRecords {
    #[serde(default)]
    items: Vec<InventoryItem>,
}

#[derive(Serialize)]
struct ItemRecordsRef<'a> {
    items: Vec<&'a InventoryItem>,
}

/// Totals for an accepted inventory selection.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Selection {
    pub volume: f32,
    pub cost: f64,
}

#[derive(Debug)]
pub struct ItemRegistry {
    path: PathBuf,
    max_volume: f32,
    items: IndexMap<String, InventoryItem>,
    sorted: Vec<String>,
    changed: bool,
}

impl ItemRegistry {
    /// Items larger than `max_volume` litres are never offered.
    pub fn new<P: AsRef<Path>>(path: P, max_volume: f32) -> Self {
        ItemRegistry {
            path: path.as_ref().to_path_buf(),
            max_volume,
            items: IndexMap::new(),
            sorted: Vec::new(),
            changed: false,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn max_volume(&self) -> f32 {
        self.max_volume
    }

    pub fn get(&self, name: &str) -> Option<&InventoryItem> {
        self.items.get(name)
    }

    /// Every known item in listing order.
    pub fn sorted(&self) -> impl Iterator<Item = &InventoryItem> {
        self.sorted.iter().map(move |name| &self.items[name])
    }

    pub fn available(&self) -> impl Iterator<Item = &InventoryItem> {
        self.sorted().filter(|item| item.available)
    }

    /// Merges the live catalog into the known items, reading saved ranks
    /// first if nothing is known yet.
    pub fn refresh<C: InventoryCatalog + ?Sized>(&mut self, catalog: &C) {
        if self.items.is_empty() {
            self.load_items_file();
        }

        let definitions = catalog.inventory_definitions();
        debug!("examining {} catalog entries", definitions.len());
        for definition in definitions {
            if definition.volume > self.max_volume {
                debug!(
                    "{} skipped: volume {} exceeds {}",
                    definition.name, definition.volume, self.max_volume
                );
                continue;
            }
            let available = match definition.tech {
                TechGate::Researched => true,
                TechGate::Locked => false,
                TechGate::Unknown => {
                    debug!("unable to find tech for {}", definition.name);
                    continue;
                }
            };

            let item = self
                .items
                .entry(definition.name.clone())
                .or_insert_with(|| InventoryItem {
                    name: definition.name.clone(),
                    ..InventoryItem::default()
                });
            item.title = definition.title;
            item.cost = definition.cost;
            item.volume = definition.volume;
            item.available = available;
        }
        self.sort_items();
    }

    /// Verifies that a selection can go into one character's inventory.
    pub fn check_selection<S: AsRef<str>>(
        &self,
        names: &[S],
        max_items: usize,
        max_volume: f32,
    ) -> Result<Selection, RegistryError> {
        if names.len() > max_items {
            return Err(RegistryError::TooManyItems {
                count: names.len(),
                max: max_items,
            });
        }
        let mut selection = Selection::default();
        for name in names {
            let name: &str = name.as_ref();
            let item = self
                .items
                .get(name)
                .ok_or_else(|| RegistryError::UnknownItem(name.to_string()))?;
            if !item.available {
                return Err(RegistryError::ItemUnavailable(name.to_string()));
            }
            selection.volume += item.volume;
            selection.cost += f64::from(item.cost);
        }
        if selection.volume > max_volume {
            return Err(RegistryError::VolumeExceeded {
                volume: selection.volume,
                max: max_volume,
            });
        }
        Ok(selection)
    }

    /// Moves each chosen item up the listing, one after another, then
    /// persists the ranks.
    pub fn update_queueing<S: AsRef<str>>(
        &mut self,
        names: &[S],
    ) -> Result<Vec<Requeue<String>>, RegistryError> {
        for name in names {
            let name: &str = name.as_ref();
            if !self.items.contains_key(name) {
                return Err(RegistryError::UnknownItem(name.to_string()));
            }
        }

        let mut outcomes = Vec::with_capacity(names.len());
        for name in names {
            let name: &str = name.as_ref();
            let name = name.to_string();
            let Some(outcome) = requeue(&mut self.items, &name, item_order) else {
                continue;
            };
            debug!(
                "requeuing item {} from {} to {}",
                name, outcome.from, outcome.to
            );
            self.changed |= !outcome.is_unchanged();
            outcomes.push(outcome);
        }

        if self.changed {
            self.sort_items();
            self.save()?;
        }
        Ok(outcomes)
    }

    /// Writes the ranks of every item chosen at least once. Returns whether
    /// anything was written.
    pub fn save(&mut self) -> Result<bool, DataError> {
        if !self.changed || self.items.is_empty() {
            return Ok(false);
        }
        let records = ItemRecordsRef {
            items: self.items.values().filter(|i| i.queueing > 0).collect(),
        };
        let written = !records.items.is_empty();
        if written {
            write_records(&records, &self.path)?;
            info!(
                "saved {} item ranks to {}",
                records.items.len(),
                self.path.display()
            );
        }
        self.changed = false;
        Ok(written)
    }

    fn sort_items(&mut self) {
        let items = &self.items;
        self.sorted = items.keys().cloned().collect();
        self.sorted.sort_by(|a, b| item_order(&items[a], &items[b]));
    }

    fn load_items_file(&mut self) {
        let (records, status) = load_or_default(&self.path, ItemRecords::default);
        debug!("items file {} {:?}", self.path.display(), status);
        for item in records.items {
            debug!("added previously selected item [{}]", item.name);
            self.items.insert(item.name.clone(), item);
        }
    }
}
