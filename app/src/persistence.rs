//! File-backed saved state.
//!
//! All entries live in one JSON object on disk. Writes go to a sibling
//! temporary file which is then renamed over it, so a crash mid-write
//! leaves the previous contents intact.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tilegrid_core::saved_state::{SavedState, SavedStateError};

/// Saved state stored as a JSON object in a single file
#[derive(Debug)]
pub struct FileSavedState {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileSavedState {
    /// Open (or prepare to create) the file at `path`
    ///
    /// A missing file is an empty store. An unreadable or malformed file is
    /// logged and also treated as empty; the next write replaces it.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) => decode(&text).unwrap_or_else(|error| {
                tracing::warn!(path = %path.display(), error = %error, "Ignoring malformed saved state file");
                BTreeMap::new()
            }),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No saved state file yet");
                BTreeMap::new()
            },
            Err(error) => {
                tracing::warn!(path = %path.display(), error = %error, "Could not read saved state file");
                BTreeMap::new()
            },
        };

        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    /// Location of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), SavedStateError> {
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| SavedStateError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, &e))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        let written = fs::write(&tmp, json)
            .map_err(|e| io_error(&tmp, &e))
            .and_then(|()| fs::rename(&tmp, &self.path).map_err(|e| io_error(&self.path, &e)));

        if written.is_err() {
            discard(&tmp);
        }
        written
    }
}

impl SavedState for FileSavedState {
    fn get(&self, key: &str) -> Result<Option<String>, SavedStateError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SavedStateError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        let mut updated = entries.clone();
        updated.insert(key.to_string(), value.to_string());
        self.persist(&updated)?;

        *entries = updated;
        tracing::debug!(key, path = %self.path.display(), "Saved state written");
        Ok(())
    }
}

/// Accepts string values and, for hand-edited files, bare numbers and booleans
fn decode(text: &str) -> Result<BTreeMap<String, String>, serde_json::Error> {
    let object: Map<String, Value> = serde_json::from_str(text)?;
    Ok(object
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::String(s) => Some((key, s)),
            Value::Number(n) => Some((key, n.to_string())),
            Value::Bool(b) => Some((key, b.to_string())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        })
        .collect())
}

/// Best-effort removal of a temporary file left by a failed write
fn discard(tmp: &Path) {
    match fs::remove_file(tmp) {
        Ok(()) => {},
        Err(error) if error.kind() == io::ErrorKind::NotFound => {},
        Err(error) => {
            tracing::warn!(path = %tmp.display(), error = %error, "Could not remove temporary state file");
        },
    }
}

fn io_error(path: &Path, error: &io::Error) -> SavedStateError {
    SavedStateError::Io(format!("{}: {error}", path.display()))
}
