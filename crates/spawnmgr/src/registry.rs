//! In-memory registry of named locations, backed by a JSON file.

use std::collections::HashMap;
use std::path::Path;

use spawnmgr_plugin_api::TeleportTarget;
use tracing::{debug, info};

use crate::error::LocationError;
use crate::location::LocationEntry;
use crate::storage;

/// All known locations, keyed by their exact (case-sensitive) name.
#[derive(Debug, Default)]
pub struct LocationRegistry {
    locations: HashMap<String, LocationEntry>,
}

impl LocationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite an entry by name. Last write wins.
    pub fn register(&mut self, entry: LocationEntry) -> Result<(), LocationError> {
        if entry.name.trim().is_empty() {
            return Err(LocationError::InvalidArgument(
                "location name must not be empty".into(),
            ));
        }
        debug!("Registered location '{}'", entry.name);
        self.locations.insert(entry.name.clone(), entry);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&LocationEntry> {
        self.locations.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.locations.contains_key(name)
    }

    /// Remove an entry. Removing an unknown name is a no-op.
    pub fn unregister(&mut self, name: &str) -> Option<LocationEntry> {
        self.locations.remove(name)
    }

    /// Replace the position of an existing entry.
    pub fn set_position(&mut self, name: &str, target: TeleportTarget) -> Result<(), LocationError> {
        let entry = self
            .locations
            .get_mut(name)
            .ok_or_else(|| LocationError::NotFound(name.to_string()))?;
        entry.position = Some(target);
        Ok(())
    }

    /// Snapshot of every entry, sorted by name.
    pub fn list(&self) -> Vec<LocationEntry> {
        let mut entries: Vec<LocationEntry> = self.locations.values().cloned().collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }

    /// Every registered name, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.locations.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn clear(&mut self) {
        self.locations.clear();
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Save every entry that has a position. Unset entries are skipped.
    pub fn save(&self, path: &Path) -> Result<usize, LocationError> {
        let records = self
            .locations
            .iter()
            .filter_map(|(name, entry)| entry.position.as_ref().map(|p| (name.as_str(), p)));
        let written = storage::write_locations(path, records)?;
        info!("Saved {written} locations to {}", path.display());
        Ok(written)
    }

    /// Replace the registry with the contents of `path`.
    ///
    /// A missing file leaves the registry untouched and returns 0. On any
    /// error the registry is also left untouched.
    pub fn load(&mut self, path: &Path) -> Result<usize, LocationError> {
        let Some(records) = storage::read_locations(path)? else {
            debug!("No saved locations at {}", path.display());
            return Ok(0);
        };

        let mut loaded = HashMap::with_capacity(records.len());
        for (name, target) in records {
            if name.trim().is_empty() {
                continue;
            }
            loaded.insert(name.clone(), LocationEntry::new(name, target));
        }

        let count = loaded.len();
        self.locations = loaded;
        info!("Loaded {count} locations from {}", path.display());
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LOCATIONS_FILE;
    use crate::testing::scratch_dir;

    fn pos(x: f64, y: f64, z: f64) -> TeleportTarget {
        TeleportTarget::new("overworld", x, y, z)
    }

    #[test]
    fn register_then_get() {
        let mut reg = LocationRegistry::new();
        reg.register(LocationEntry::new("home", pos(1.0, 64.0, 2.0)))
            .unwrap();
        let entry = reg.get("home").unwrap();
        assert_eq!(entry.name, "home");
        assert_eq!(entry.position, Some(pos(1.0, 64.0, 2.0)));
    }

    #[test]
    fn register_rejects_blank_names() {
        let mut reg = LocationRegistry::new();
        assert!(matches!(
            reg.register(LocationEntry::new("", pos(0.0, 0.0, 0.0))),
            Err(LocationError::InvalidArgument(_))
        ));
        assert!(reg.register(LocationEntry::unset("  ")).is_err());
        assert!(reg.is_empty());
    }

    #[test]
    fn last_write_wins() {
        let mut reg = LocationRegistry::new();
        reg.register(LocationEntry::new("home", pos(1.0, 1.0, 1.0)))
            .unwrap();
        reg.register(LocationEntry::new("home", pos(2.0, 2.0, 2.0)))
            .unwrap();
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get("home").unwrap().position, Some(pos(2.0, 2.0, 2.0)));
    }

    #[test]
    fn lookups_are_case_sensitive() {
        let mut reg = LocationRegistry::new();
        reg.register(LocationEntry::new("Home", pos(0.0, 0.0, 0.0)))
            .unwrap();
        assert!(reg.get("home").is_none());
        assert!(reg.contains("Home"));
    }

    #[test]
    fn unregister_absent_is_noop() {
        let mut reg = LocationRegistry::new();
        reg.register(LocationEntry::new("home", pos(0.0, 0.0, 0.0)))
            .unwrap();
        assert!(reg.unregister("home").is_some());
        assert!(reg.get("home").is_none());
        assert!(reg.unregister("home").is_none());
    }

    #[test]
    fn set_position_requires_existing_entry() {
        let mut reg = LocationRegistry::new();
        assert!(matches!(
            reg.set_position("arena", pos(0.0, 0.0, 0.0)),
            Err(LocationError::NotFound(name)) if name == "arena"
        ));
        reg.register(LocationEntry::unset("arena")).unwrap();
        reg.set_position("arena", pos(5.0, 6.0, 7.0)).unwrap();
        assert!(reg.get("arena").unwrap().is_set());
    }

    #[test]
    fn list_is_a_sorted_snapshot() {
        let mut reg = LocationRegistry::new();
        for name in ["spawn", "arena", "home"] {
            reg.register(LocationEntry::new(name, pos(0.0, 0.0, 0.0)))
                .unwrap();
        }
        let mut snapshot = reg.list();
        assert_eq!(snapshot[0].name, "arena");
        snapshot.clear();
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.names(), vec!["arena", "home", "spawn"]);
    }

    #[test]
    fn save_clear_load_roundtrip() {
        let dir = scratch_dir("registry_roundtrip");
        let path = dir.join(LOCATIONS_FILE);

        let mut reg = LocationRegistry::new();
        reg.register(LocationEntry::new(
            "spawn",
            pos(0.5, 65.0, 0.5).with_rotation(180.0, -10.0),
        ))
        .unwrap();
        reg.register(LocationEntry::new("home", pos(-12.0, 70.0, 33.25)))
            .unwrap();
        reg.register(LocationEntry::unset("pending")).unwrap();

        assert_eq!(reg.save(&path).unwrap(), 2);
        let before: Vec<LocationEntry> = reg.list().into_iter().filter(|e| e.is_set()).collect();

        reg.clear();
        assert_eq!(reg.load(&path).unwrap(), 2);
        assert_eq!(reg.list(), before);
        assert!(reg.get("pending").is_none());
    }

    #[test]
    fn load_replaces_existing_set() {
        let dir = scratch_dir("registry_replace");
        let path = dir.join(LOCATIONS_FILE);

        let mut reg = LocationRegistry::new();
        reg.register(LocationEntry::new("saved", pos(1.0, 1.0, 1.0)))
            .unwrap();
        reg.save(&path).unwrap();

        reg.register(LocationEntry::new("unsaved", pos(2.0, 2.0, 2.0)))
            .unwrap();
        reg.load(&path).unwrap();
        assert_eq!(reg.names(), vec!["saved"]);
    }

    #[test]
    fn load_missing_file_is_noop() {
        let dir = scratch_dir("registry_missing");
        let mut reg = LocationRegistry::new();
        assert_eq!(reg.load(&dir.join(LOCATIONS_FILE)).unwrap(), 0);
        assert!(reg.is_empty());
    }

    #[test]
    fn load_error_keeps_memory_state() {
        let dir = scratch_dir("registry_corrupt");
        let path = dir.join(LOCATIONS_FILE);
        std::fs::write(&path, "{ not json").unwrap();

        let mut reg = LocationRegistry::new();
        reg.register(LocationEntry::new("home", pos(0.0, 0.0, 0.0)))
            .unwrap();
        assert!(reg.load(&path).is_err());
        assert!(reg.contains("home"));
    }

    #[test]
    fn load_of_wrong_shape_keeps_memory_state() {
        let dir = scratch_dir("registry_wrong_shape");
        let path = dir.join(LOCATIONS_FILE);
        std::fs::write(&path, r#"{"locations":[1,2]}"#).unwrap();

        let mut reg = LocationRegistry::new();
        reg.register(LocationEntry::new("home", pos(0.0, 0.0, 0.0)))
            .unwrap();
        assert!(matches!(
            reg.load(&path),
            Err(LocationError::Malformed { .. })
        ));
        assert_eq!(reg.len(), 1);
        assert!(reg.contains("home"));
    }
}
