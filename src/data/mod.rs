pub mod settings;

use std::fs;
use std::io;
use std::path::Path;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Extension of location record files.
pub const LOCATION_FILE_EXTENSION: &str = "loc";
/// File that receives locations added in-game.
pub const USER_LOCATION_FILENAME: &str = "user.loc";
/// Directory, under the mod directory, holding location files.
pub const LOCATION_SUBDIRECTORY: &str = "locFiles";
/// Extension given to a user location file that could not be read before a
/// fresh one is started.
pub const UNREADABLE_BACKUP_EXTENSION: &str = "loc.bak";
pub const SETTINGS_FILENAME: &str = "Settings.cfg";
pub const ITEMS_FILENAME: &str = "Items.cfg";

#[derive(Debug, Error)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// How a record file came to be in memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadStatus {
    Loaded,
    /// The file could not be used; the reason is kept for the log.
    Defaulted(String),
}

impl LoadStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadStatus::Loaded)
    }
}

pub fn read_records<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T, DataError> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Writes the whole record set, creating parent directories as needed.
pub fn write_records<T: Serialize, P: AsRef<Path>>(records: &T, path: P) -> Result<(), DataError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_vec_pretty(records)?;
    fs::write(path, json)?;
    debug!("wrote {}", path.display());
    Ok(())
}

/// Reads a record file, falling back to `default` when it is missing or
/// unreadable.
pub fn load_or_default<T, P, F>(path: P, default: F) -> (T, LoadStatus)
where
    T: DeserializeOwned,
    P: AsRef<Path>,
    F: FnOnce() -> T,
{
    let path = path.as_ref();
    match read_records(path) {
        Ok(records) => {
            debug!("loaded {}", path.display());
            (records, LoadStatus::Loaded)
        }
        Err(DataError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
            let reason = format!("did not find file [{}]", path.display());
            warn!("{reason}, using defaults");
            (default(), LoadStatus::Defaulted(reason))
        }
        Err(err) => {
            let reason = format!("unable to read [{}]: {err}", path.display());
            warn!("{reason}, using defaults");
            (default(), LoadStatus::Defaulted(reason))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
    struct Record {
        name: String,
        rank: u32,
    }

    #[test]
    fn missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let (record, status) =
            load_or_default(dir.path().join("absent.cfg"), || Record { name: "x".into(), rank: 3 });
        assert_eq!(record.rank, 3);
        assert!(!status.is_loaded());
    }

    #[test]
    fn corrupt_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.cfg");
        fs::write(&path, b"{ not json").unwrap();
        let (record, status) = load_or_default(&path, Record::default);
        assert_eq!(record, Record::default());
        assert!(matches!(status, LoadStatus::Defaulted(ref reason) if reason.contains("bad.cfg")));
    }

    #[test]
    fn written_records_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("r.cfg");
        let record = Record { name: "Pad".into(), rank: 2 };
        write_records(&record, &path).unwrap();
        let back: Record = read_records(&path).unwrap();
        assert_eq!(back, record);
    }
}
