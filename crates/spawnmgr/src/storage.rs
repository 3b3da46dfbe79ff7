//! On-disk format for saved locations.
//!
//! ```json
//! { "locations": { "home": { "world": "overworld", "x": 1.5, "y": 64.0, "z": -3.5, "yaw": 90.0, "pitch": 0.0 } } }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use spawnmgr_plugin_api::TeleportTarget;
use tracing::warn;

use crate::error::LocationError;

/// File name of the saved registry inside the plugin data directory.
pub const LOCATIONS_FILE: &str = "locations.json";

#[derive(Serialize)]
struct LocationsDocument<'a> {
    locations: BTreeMap<&'a str, &'a TeleportTarget>,
}

/// Write `records` to `path`, creating the parent directory if needed.
/// Returns the number of records written.
pub fn write_locations<'a, I>(path: &Path, records: I) -> Result<usize, LocationError>
where
    I: IntoIterator<Item = (&'a str, &'a TeleportTarget)>,
{
    let doc = LocationsDocument {
        locations: records.into_iter().collect(),
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| LocationError::Persistence {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let json = serde_json::to_string_pretty(&doc).map_err(|source| LocationError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| LocationError::Persistence {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(doc.locations.len())
}

/// Read the records stored at `path`.
///
/// Returns `Ok(None)` if the file does not exist, and no records if the
/// mapping has no `locations` key. A document of any other shape is an
/// error. Records that fail to parse are skipped with a warning; the rest
/// are returned.
pub fn read_locations(path: &Path) -> Result<Option<Vec<(String, TeleportTarget)>>, LocationError> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path).map_err(|source| LocationError::Persistence {
        path: path.to_path_buf(),
        source,
    })?;
    let doc: Value = serde_json::from_str(&contents).map_err(|source| LocationError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;

    let malformed = |reason| LocationError::Malformed {
        path: path.to_path_buf(),
        reason,
    };
    let Value::Object(root) = &doc else {
        return Err(malformed("top level is not a mapping"));
    };
    let section = match root.get("locations") {
        Some(Value::Object(section)) => section,
        Some(_) => return Err(malformed("'locations' is not a mapping")),
        None => return Ok(Some(Vec::new())),
    };

    let mut records = Vec::with_capacity(section.len());
    for (name, raw) in section {
        match TeleportTarget::deserialize(raw) {
            Ok(target) => records.push((name.clone(), target)),
            Err(e) => warn!("Skipping location '{name}' in {}: {e}", path.display()),
        }
    }
    Ok(Some(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::scratch_dir;

    #[test]
    fn missing_file_is_none() {
        let dir = scratch_dir("storage_missing");
        assert!(read_locations(&dir.join(LOCATIONS_FILE)).unwrap().is_none());
    }

    #[test]
    fn write_creates_parent_dir() {
        let dir = scratch_dir("storage_parent");
        let path = dir.join("nested").join(LOCATIONS_FILE);
        let target = TeleportTarget::new("overworld", 0.0, 64.0, 0.0);
        let written = write_locations(&path, [("spawn", &target)]).unwrap();
        assert_eq!(written, 1);

        let records = read_locations(&path).unwrap().unwrap();
        assert_eq!(records, vec![("spawn".to_string(), target)]);
    }

    #[test]
    fn malformed_records_are_skipped() {
        let dir = scratch_dir("storage_malformed");
        let path = dir.join(LOCATIONS_FILE);
        let json = r#"{
            "version": 3,
            "locations": {
                "good": { "world": "overworld", "x": 1.0, "y": 2.0, "z": 3.0, "yaw": 45.0, "note": "kept" },
                "no_world": { "x": 1.0, "y": 2.0, "z": 3.0 },
                "bad_type": { "world": "overworld", "x": "one", "y": 2.0, "z": 3.0 },
                "scalar": 7
            }
        }"#;
        fs::write(&path, json).unwrap();

        let records = read_locations(&path).unwrap().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, "good");
        assert_eq!(records[0].1.yaw, 45.0);
        assert_eq!(records[0].1.pitch, 0.0);
    }

    #[test]
    fn document_without_section_is_empty() {
        let dir = scratch_dir("storage_nosection");
        let path = dir.join(LOCATIONS_FILE);
        fs::write(&path, r#"{ "other": {} }"#).unwrap();
        assert!(read_locations(&path).unwrap().unwrap().is_empty());
    }

    #[test]
    fn wrongly_shaped_document_is_an_error() {
        let dir = scratch_dir("storage_shape");
        let path = dir.join(LOCATIONS_FILE);
        for json in ["[]", "null", r#"{ "locations": [1, 2] }"#, r#"{ "locations": "oops" }"#] {
            fs::write(&path, json).unwrap();
            assert!(
                matches!(read_locations(&path), Err(LocationError::Malformed { .. })),
                "{json}"
            );
        }
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = scratch_dir("storage_invalid");
        let path = dir.join(LOCATIONS_FILE);
        fs::write(&path, "locations: [").unwrap();
        assert!(matches!(
            read_locations(&path),
            Err(LocationError::Serialize { .. })
        ));
    }
}
