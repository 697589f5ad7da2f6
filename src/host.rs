//! Contracts the host game must provide. Nothing in this crate talks to the
//! game directly; every read or write of live game state goes through these
//! traits.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::centrum::Landmark;
use crate::registry::levels::FacilityLevels;
use crate::WorldCoordinate;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum HostError {
    #[error("host refused the request: {0}")]
    Refused(String),
}

/// Where the player-controlled actor currently stands.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct ActorPosition {
    pub coordinate: WorldCoordinate,
    pub normal: [f64; 3],
    pub rotation: [f64; 4],
}

/// Whether the research needed for an item has been done.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TechGate {
    Researched,
    Locked,
    /// The host could not resolve the item's tech node.
    Unknown,
}

/// One entry of the host's part catalog.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ItemDefinition {
    pub name: String,
    pub title: String,
    pub cost: f32,
    /// Litres.
    pub volume: f32,
    pub tech: TechGate,
}

/// Everything the host needs to put a character on the ground.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SpawnRequest {
    pub character: String,
    pub location: String,
    pub coordinate: WorldCoordinate,
    pub normal: [f64; 3],
    pub rotation: [f64; 4],
    /// Funds to charge for the allocated inventory.
    pub item_cost: f64,
}

pub trait FacilityLevelSource {
    /// Current upgrade level of a facility as a single-bit mask.
    fn facility_level(&self, facility: &str) -> FacilityLevels;
}

/// Fixed facility levels, e.g. from a saved snapshot. Unlisted facilities
/// have no level.
impl FacilityLevelSource for HashMap<String, FacilityLevels> {
    fn facility_level(&self, facility: &str) -> FacilityLevels {
        self.get(facility).copied().unwrap_or(FacilityLevels::NONE)
    }
}

pub trait LandmarkLocator {
    fn landmark_position(&self, landmark: Landmark) -> Option<WorldCoordinate>;
}

pub trait ActorTracker {
    fn actor_position(&self) -> Option<ActorPosition>;
}

pub trait EntitySpawner {
    fn spawn(&mut self, request: &SpawnRequest) -> Result<(), HostError>;
}

pub trait InventoryCatalog {
    fn inventory_definitions(&self) -> Vec<ItemDefinition>;
}

impl InventoryCatalog for Vec<ItemDefinition> {
    fn inventory_definitions(&self) -> Vec<ItemDefinition> {
        self.clone()
    }
}

/// Optional companion inventory plugin. Probed once per session; absent when
/// the plugin is not installed.
pub trait InventoryCapability {
    /// Puts `quantity` of `item` into `character`'s inventory, returning the
    /// plugin's id for the new stack.
    fn try_add_item(&mut self, character: &str, item: &str, quantity: u32) -> Option<u64>;
}

/// The full set of host services a placement session relies on.
pub trait SpaceCenterHost:
    FacilityLevelSource + LandmarkLocator + ActorTracker + EntitySpawner + InventoryCatalog
{
}

impl<T> SpaceCenterHost for T where
    T: FacilityLevelSource + LandmarkLocator + ActorTracker + EntitySpawner + InventoryCatalog
{
}
