//! Stable per-install device identifier.
//!
//! The identifier is a v4 UUID created on first run and persisted under the
//! platform data directory. When the file cannot be read or written the
//! process falls back to an ephemeral identifier rather than failing.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;
use uuid::Uuid;

fn device_id_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("murmur").join("device-id"))
}

/// Read the persisted identifier, creating it on first run.
pub fn load_or_create_device_id() -> String {
    let Some(path) = device_id_path() else {
        warn!("no data directory available, using ephemeral device id");
        return Uuid::new_v4().to_string();
    };

    match read_or_create_at(&path) {
        Ok(id) => id,
        Err(e) => {
            warn!("could not persist device id at {path:?}: {e}");
            Uuid::new_v4().to_string()
        }
    }
}

fn read_or_create_at(path: &Path) -> io::Result<String> {
    if let Ok(existing) = fs::read_to_string(path) {
        let trimmed = existing.trim();
        if Uuid::parse_str(trimmed).is_ok() {
            return Ok(trimmed.to_string());
        }
        warn!("device id file {path:?} is corrupt, replacing it");
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let id = Uuid::new_v4().to_string();
    fs::write(path, &id)?;
    Ok(id)
}
