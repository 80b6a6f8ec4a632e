//! Value table persistence
//!
//! Tables are stored as a JSON snapshot:
//!
//! ```text
//! { "format": "owl-qtable", "version": 1, "saved_at": "...",
//!   "entries": [ { "state": {"x":5,"y":5,"map_id":0},
//!                  "values": {"up":0.0,"down":0.1,"left":0.0,"right":0.0} }, ... ] }
//! ```
//!
//! Entries are written in state order. Floats are written in shortest
//! round-trip form and parsed back bit-for-bit.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::ser::Error as _;
use serde::{Deserialize, Serialize};
use tracing::info;

use owl_core::{OwlError, Result, State};

use crate::table::{ActionValues, ValueTable};

/// Format tag written into every snapshot
pub const FORMAT: &str = "owl-qtable";

/// Current snapshot version
pub const VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct Snapshot {
    format: String,
    version: u32,
    saved_at: DateTime<Utc>,
    entries: Vec<Entry>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct Entry {
    state: State,
    values: ActionValues,
}

/// Serialize a table to bytes
pub fn encode(table: &ValueTable) -> Result<Vec<u8>> {
    let entries = table
        .sorted_entries()
        .into_iter()
        .map(|(state, values)| {
            if values.is_finite() {
                Ok(Entry { state, values })
            } else {
                let msg = format!("non-finite value for state {state}");
                Err(OwlError::Serialization(serde_json::Error::custom(msg)))
            }
        })
        .collect::<Result<Vec<_>>>()?;

    let snapshot = Snapshot {
        format: FORMAT.to_string(),
        version: VERSION,
        saved_at: Utc::now(),
        entries,
    };

    Ok(serde_json::to_vec_pretty(&snapshot)?)
}

/// Rebuild a table from bytes produced by [`encode`].
///
/// Any defect in the input fails the whole decode; no partial table is returned.
pub fn decode(bytes: &[u8]) -> Result<ValueTable> {
    let snapshot: Snapshot = serde_json::from_slice(bytes)
        .map_err(|e| OwlError::Deserialization(e.to_string()))?;

    if snapshot.format != FORMAT {
        return Err(OwlError::Deserialization(format!(
            "unexpected format tag {:?}",
            snapshot.format
        )));
    }
    if snapshot.version != VERSION {
        return Err(OwlError::Deserialization(format!(
            "unsupported version {} (expected {VERSION})",
            snapshot.version
        )));
    }

    let mut table = ValueTable::new();
    for entry in snapshot.entries {
        if table.insert(entry.state, entry.values).is_some() {
            return Err(OwlError::Deserialization(format!(
                "duplicate state {}",
                entry.state
            )));
        }
    }

    Ok(table)
}

/// Write a table to `path`, replacing any existing file
pub fn save(table: &ValueTable, path: &Path) -> Result<()> {
    let bytes = encode(table)?;

    // Write next to the target, then rename over it
    let tmp = temp_path(path);
    if let Err(e) = std::fs::write(&tmp, &bytes).and_then(|()| std::fs::rename(&tmp, path)) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }

    info!("Saved value table with {} states to {:?}", table.len(), path);
    Ok(())
}

/// Sibling of `path` with `.tmp` appended to the full file name
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Read a table from `path`
pub fn load(path: &Path) -> Result<ValueTable> {
    let bytes = std::fs::read(path)?;
    let table = decode(&bytes)?;

    info!("Loaded value table with {} states from {:?}", table.len(), path);
    Ok(table)
}
