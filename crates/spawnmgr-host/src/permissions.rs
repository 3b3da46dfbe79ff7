//! Permission management: ops and per-player permission grants.
//!
//! Persists data as JSON files in the host's data directory.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

/// Manages operators and permission grants with JSON persistence.
pub struct PermissionManager {
    dir: PathBuf,
    /// Display names of operators.
    pub ops: HashSet<String>,
    /// Granted permission nodes: display_name → nodes.
    pub grants: HashMap<String, BTreeSet<String>>,
}

const OPS_FILE: &str = "ops.json";
const GRANTS_FILE: &str = "permissions.json";

impl PermissionManager {
    /// Load permission data from `dir`. Creates empty defaults if files don't exist.
    pub fn load(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let ops: Vec<String> = load_json(&dir.join(OPS_FILE)).unwrap_or_default();
        Self {
            ops: ops.into_iter().collect(),
            grants: load_json(&dir.join(GRANTS_FILE)).unwrap_or_default(),
            dir,
        }
    }

    pub fn is_op(&self, name: &str) -> bool {
        self.ops.contains(name)
    }

    /// Nodes granted to `name`, empty if none.
    pub fn nodes_for(&self, name: &str) -> HashSet<String> {
        self.grants
            .get(name)
            .map(|nodes| nodes.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns false if `name` was already an operator.
    pub fn op(&mut self, name: &str) -> bool {
        self.ops.insert(name.to_string())
    }

    pub fn deop(&mut self, name: &str) -> bool {
        self.ops.remove(name)
    }

    pub fn grant(&mut self, name: &str, node: &str) -> bool {
        self.grants
            .entry(name.to_string())
            .or_default()
            .insert(node.to_string())
    }

    pub fn revoke(&mut self, name: &str, node: &str) -> bool {
        let Some(nodes) = self.grants.get_mut(name) else {
            return false;
        };
        let removed = nodes.remove(node);
        if nodes.is_empty() {
            self.grants.remove(name);
        }
        removed
    }

    /// Save the ops list to disk.
    pub fn save_ops(&self) {
        let mut sorted: Vec<&String> = self.ops.iter().collect();
        sorted.sort();
        save_json(&self.dir.join(OPS_FILE), &sorted);
    }

    /// Save the permission grants to disk.
    pub fn save_grants(&self) {
        let sorted: std::collections::BTreeMap<_, _> = self.grants.iter().collect();
        save_json(&self.dir.join(GRANTS_FILE), &sorted);
    }

    pub fn save_all(&self) {
        self.save_ops();
        self.save_grants();
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    if !path.exists() {
        return None;
    }
    match fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(value) => {
                info!("Loaded {}", path.display());
                Some(value)
            }
            Err(e) => {
                warn!("Failed to parse {}: {e}", path.display());
                None
            }
        },
        Err(e) => {
            warn!("Failed to read {}: {e}", path.display());
            None
        }
    }
}

fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) {
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create {}: {e}", parent.display());
            return;
        }
    }
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            if let Err(e) = fs::write(path, json) {
                warn!("Failed to write {}: {e}", path.display());
            }
        }
        Err(e) => warn!("Failed to serialize {}: {e}", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_dir(tag: &str) -> PathBuf {
        let tmp = env::temp_dir().join(format!("spawnmgr_perm_{tag}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&tmp);
        tmp
    }

    #[test]
    fn load_empty_creates_defaults() {
        let dir = temp_dir("empty");
        let pm = PermissionManager::load(&dir);
        assert!(pm.ops.is_empty());
        assert!(pm.grants.is_empty());
        assert!(pm.nodes_for("Steve").is_empty());
    }

    #[test]
    fn save_and_reload_ops() {
        let dir = temp_dir("ops");
        let mut pm = PermissionManager::load(&dir);
        assert!(pm.op("Steve"));
        assert!(pm.op("Alex"));
        assert!(!pm.op("Alex"));
        pm.save_ops();

        let pm2 = PermissionManager::load(&dir);
        assert_eq!(pm2.ops.len(), 2);
        assert!(pm2.is_op("Steve"));
        assert!(pm2.is_op("Alex"));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn save_and_reload_grants() {
        let dir = temp_dir("grants");
        let mut pm = PermissionManager::load(&dir);
        assert!(pm.grant("Bob", "spawnmanager.location.use"));
        assert!(pm.grant("Bob", "spawnmanager.location.list"));
        assert!(!pm.grant("Bob", "spawnmanager.location.list"));
        pm.save_grants();

        let pm2 = PermissionManager::load(&dir);
        let nodes = pm2.nodes_for("Bob");
        assert_eq!(nodes.len(), 2);
        assert!(nodes.contains("spawnmanager.location.use"));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn revoke_drops_empty_entries() {
        let dir = temp_dir("revoke");
        let mut pm = PermissionManager::load(&dir);
        pm.grant("Bob", "a");
        assert!(!pm.revoke("Bob", "b"));
        assert!(pm.revoke("Bob", "a"));
        assert!(!pm.grants.contains_key("Bob"));
        assert!(!pm.revoke("Nobody", "a"));
        assert!(!pm.deop("Nobody"));
    }

    #[test]
    fn malformed_file_is_ignored() {
        let dir = temp_dir("malformed");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(OPS_FILE), "{not json").unwrap();
        let pm = PermissionManager::load(&dir);
        assert!(pm.ops.is_empty());
        let _ = fs::remove_dir_all(dir);
    }
}
