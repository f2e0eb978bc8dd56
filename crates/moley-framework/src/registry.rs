use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FrameworkError;

/// One persisted resource, keyed by the handler that owns it. `data.config`
/// and `data.state` are stored as opaque JSON so the registry itself never
/// depends on any concrete resource type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistentResourceEntry {
    pub handler_name: String,
    pub data: ResourceRecordData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRecordData {
    pub config: Value,
    pub state: Value,
}

/// The on-disk lock file: a flat list of entries, rewritten wholesale on
/// every mutation. A missing file is an empty registry, not an error.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ResourceRegistry {
    pub entries: Vec<PersistentResourceEntry>,
}

impl ResourceRegistry {
    pub fn load(path: &Path) -> Result<Self, FrameworkError> {
        match fs::read_to_string(path) {
            Ok(contents) => {
                let registry: ResourceRegistry = serde_json::from_str(&contents)?;
                Ok(registry)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(FrameworkError::RegistryIo { path: path.display().to_string(), source: err }),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), FrameworkError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| FrameworkError::RegistryIo { path: parent.display().to_string(), source: e })?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)
            .map_err(|e| FrameworkError::RegistryIo { path: path.display().to_string(), source: e })?;
        set_owner_only_permissions(path);
        Ok(())
    }

    pub fn entries_for(&self, handler_name: &str) -> Vec<&PersistentResourceEntry> {
        self.entries.iter().filter(|e| e.handler_name == handler_name).collect()
    }

    /// Replaces every entry owned by `handler_name` with `new_entries`,
    /// leaving entries owned by other handlers untouched.
    pub fn replace_entries_for(&mut self, handler_name: &str, new_entries: Vec<PersistentResourceEntry>) {
        self.entries.retain(|e| e.handler_name != handler_name);
        self.entries.extend(new_entries);
    }
}

#[cfg(unix)]
fn set_owner_only_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Ok(metadata) = fs::metadata(path) {
        let mut perms = metadata.permissions();
        perms.set_mode(0o644);
        let _ = fs::set_permissions(path, perms);
    }
}

#[cfg(not(unix))]
fn set_owner_only_permissions(_path: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_as_empty_registry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("moley.lock");
        let registry = ResourceRegistry::load(&path).unwrap();
        assert!(registry.entries.is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("moley.lock");

        let mut registry = ResourceRegistry::default();
        registry.replace_entries_for(
            "tunnel-create",
            vec![PersistentResourceEntry {
                handler_name: "tunnel-create".into(),
                data: ResourceRecordData {
                    config: serde_json::json!({"tunnel": "abc"}),
                    state: serde_json::json!({"tunnel": "abc"}),
                },
            }],
        );
        registry.save(&path).unwrap();

        let reloaded = ResourceRegistry::load(&path).unwrap();
        assert_eq!(reloaded.entries.len(), 1);
        assert_eq!(reloaded.entries[0].handler_name, "tunnel-create");
    }

    #[test]
    fn replace_entries_for_leaves_other_handlers_alone() {
        let mut registry = ResourceRegistry::default();
        registry.entries.push(PersistentResourceEntry {
            handler_name: "dns-record".into(),
            data: ResourceRecordData { config: serde_json::json!({}), state: serde_json::json!({}) },
        });
        registry.replace_entries_for("tunnel-create", vec![]);
        assert_eq!(registry.entries.len(), 1);
        assert_eq!(registry.entries[0].handler_name, "dns-record");
    }
}
