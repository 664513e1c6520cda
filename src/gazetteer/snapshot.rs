//! Binary snapshot of a built [`ReferenceIndex`].
//!
//! Layout: a `u32` format version followed by the body, both `bincode`
//! encoded. A snapshot is an optimization only; every read failure is
//! reported so the caller can fall back to the source.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::core::record::ReferenceRecord;
use crate::core::types::RecordId;

use super::store::{GazetteerError, ReferenceIndex};

/// Bumped whenever the record or index layout changes
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotBodyRef<'a> {
    created_at: DateTime<Utc>,
    records: &'a [ReferenceRecord],
    by_city_prefix: &'a HashMap<String, Vec<RecordId>>,
    by_region: &'a HashMap<String, Vec<RecordId>>,
}

#[derive(Deserialize)]
struct SnapshotBody {
    created_at: DateTime<Utc>,
    records: Vec<ReferenceRecord>,
    by_city_prefix: HashMap<String, Vec<RecordId>>,
    by_region: HashMap<String, Vec<RecordId>>,
}

fn invalid(e: impl std::fmt::Display) -> GazetteerError {
    GazetteerError::InvalidSnapshot(e.to_string())
}

/// Read a snapshot from `path`.
///
/// Returns `Ok(None)` when no file exists.
///
/// # Errors
///
/// Returns an error if the file cannot be read, was written by a different
/// format version, fails to decode, or references records it does not hold.
pub fn read_snapshot(path: &Path) -> Result<Option<ReferenceIndex>, GazetteerError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut reader = BufReader::new(file);

    let version: u32 = bincode::deserialize_from(&mut reader).map_err(invalid)?;
    if version != SNAPSHOT_FORMAT_VERSION {
        return Err(GazetteerError::InvalidSnapshot(format!(
            "format version {version}, expected {SNAPSHOT_FORMAT_VERSION}"
        )));
    }

    let body: SnapshotBody = bincode::deserialize_from(&mut reader).map_err(invalid)?;
    tracing::debug!(
        "Snapshot {} created at {}",
        path.display(),
        body.created_at.to_rfc3339()
    );

    ReferenceIndex::from_parts(body.records, body.by_city_prefix, body.by_region).map(Some)
}

/// Write `index` to `path` atomically: the snapshot is written to a
/// temporary file in the same directory and renamed into place.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be created, written, or
/// renamed.
pub fn write_snapshot(path: &Path, index: &ReferenceIndex) -> Result<(), GazetteerError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        bincode::serialize_into(&mut writer, &SNAPSHOT_FORMAT_VERSION)?;
        bincode::serialize_into(
            &mut writer,
            &SnapshotBodyRef {
                created_at: Utc::now(),
                records: index.records(),
                by_city_prefix: index.city_prefix_map(),
                by_region: index.region_map(),
            },
        )?;
        writer.flush()?;
    }
    tmp.persist(path)?;

    Ok(())
}
