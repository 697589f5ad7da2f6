use std::path::{Path, PathBuf};

use log::{debug, info};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::data::{load_or_default, write_records, DataError, LoadStatus};

const DEFAULT_TOP_FEW: u32 = 5;
const DEFAULT_MAX_INVENTORY_ITEMS: u32 = 6;
const DEFAULT_MAX_INVENTORY_VOLUME: f32 = 300.0;

pub static DEFAULT_SETTINGS: Lazy<Settings> = Lazy::new(|| Settings {
    activation_hotkey: KeyCombination::new("W", &["LeftControl", "RightControl"]),
    mode: Mode::Normal,
    add_utility_hotkey: KeyCombination::new("X", &["LeftControl", "RightControl"]),
    screen: ScreenRect::default(),
    top_few: DEFAULT_TOP_FEW,
    max_inventory_items: DEFAULT_MAX_INVENTORY_ITEMS,
    max_inventory_volume: DEFAULT_MAX_INVENTORY_VOLUME,
    perpetual_motion_hotkey: KeyCombination::new("Quote", &[]),
    post_placement_action: PostPlacementAction::Reload,
});

/// A key plus modifiers, any one of which must be held with it.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyCombination {
    pub key: String,
    #[serde(default)]
    pub modifiers: Vec<String>,
}

impl KeyCombination {
    pub fn new(key: &str, modifiers: &[&str]) -> Self {
        KeyCombination {
            key: key.to_string(),
            modifiers: modifiers.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn is_unset(&self) -> bool {
        self.key.is_empty()
    }
}

/// Whether only placement is allowed, or new locations may be recorded too.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Normal,
    Utility,
}

/// What the host should do once a character has been placed.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PostPlacementAction {
    #[default]
    Reload,
    NoReload,
    JumpTo,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScreenRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub activation_hotkey: KeyCombination,
    pub mode: Mode,
    pub add_utility_hotkey: KeyCombination,
    pub screen: ScreenRect,
    /// How many locations the "Top N only" filter shows.
    pub top_few: u32,
    pub max_inventory_items: u32,
    /// Litres.
    pub max_inventory_volume: f32,
    pub perpetual_motion_hotkey: KeyCombination,
    pub post_placement_action: PostPlacementAction,
}

impl Default for Settings {
    fn default() -> Self {
        DEFAULT_SETTINGS.clone()
    }
}

/// Settings bound to the file they came from.
#[derive(Debug)]
pub struct SettingsFile {
    pub path: PathBuf,
    pub settings: Settings,
    changed: bool,
    pub status: LoadStatus,
}

impl SettingsFile {
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let (mut settings, status): (Settings, LoadStatus) =
            load_or_default(&path, || DEFAULT_SETTINGS.clone());
        let mut changed = !status.is_loaded();

        // Older files predate these values and carry zeros.
        if settings.top_few == 0 {
            settings.top_few = DEFAULT_TOP_FEW;
            changed = true;
        }
        if settings.max_inventory_items == 0 {
            settings.max_inventory_items = DEFAULT_MAX_INVENTORY_ITEMS;
            changed = true;
        }
        if settings.max_inventory_volume == 0.0 {
            settings.max_inventory_volume = DEFAULT_MAX_INVENTORY_VOLUME;
            changed = true;
        }
        if settings.perpetual_motion_hotkey.is_unset() {
            settings.perpetual_motion_hotkey = DEFAULT_SETTINGS.perpetual_motion_hotkey.clone();
        }

        info!("settings {} ({:?})", path.display(), status);
        SettingsFile {
            path,
            settings,
            changed,
            status,
        }
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn set_screen_position(&mut self, screen: ScreenRect) {
        if screen != self.settings.screen {
            debug!("screen moved from {:?} to {:?}", self.settings.screen, screen);
            self.settings.screen = screen;
            self.changed = true;
        }
    }

    pub fn save(&mut self) -> Result<(), DataError> {
        write_records(&self.settings, &self.path)?;
        info!("saved settings to {}", self.path.display());
        self.changed = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_file_loads_defaults_and_needs_saving() {
        let dir = tempfile::tempdir().unwrap();
        let file = SettingsFile::load(dir.path().join("Settings.cfg"));
        assert_eq!(file.settings, *DEFAULT_SETTINGS);
        assert!(file.is_changed());
    }

    #[test]
    fn zeroed_limits_are_upgraded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Settings.cfg");
        fs::write(
            &path,
            r#"{ "mode": "utility", "top_few": 0, "max_inventory_items": 0, "max_inventory_volume": 0.0 }"#,
        )
        .unwrap();
        let file = SettingsFile::load(&path);
        assert!(file.status.is_loaded());
        assert_eq!(file.settings.mode, Mode::Utility);
        assert_eq!(file.settings.top_few, 5);
        assert_eq!(file.settings.max_inventory_items, 6);
        assert_eq!(file.settings.max_inventory_volume, 300.0);
        assert!(file.is_changed());
    }

    #[test]
    fn unchanged_geometry_is_not_dirty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Settings.cfg");
        let mut file = SettingsFile::load(&path);
        file.save().unwrap();
        assert!(!file.is_changed());

        let same = file.settings.screen;
        file.set_screen_position(same);
        assert!(!file.is_changed());

        file.set_screen_position(ScreenRect { x: 10, y: 20, width: 300, height: 400 });
        assert!(file.is_changed());
        file.save().unwrap();

        let reloaded = SettingsFile::load(&path);
        assert_eq!(reloaded.settings.screen.width, 300);
        assert!(!reloaded.is_changed());
    }

    #[test]
    fn post_placement_action_uses_lowercase_names() {
        let json = serde_json::to_string(&PostPlacementAction::JumpTo).unwrap();
        assert_eq!(json, "\"jumpto\"");
    }
}
