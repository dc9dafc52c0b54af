//! Per-site registry of known creators (`profiles.json`).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::api::Profile;
use crate::error::Result;

/// File name of the registry inside a site folder.
pub const PROFILES_FILE: &str = "profiles.json";

/// What the registry remembers about a creator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistInfo {
    pub id: String,
    pub name: String,
    pub service: String,
    #[serde(default)]
    pub indexed: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub public_id: Option<String>,
    #[serde(default)]
    pub relation_id: Option<serde_json::Value>,
}

impl From<&Profile> for ArtistInfo {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id.clone(),
            name: profile.name.clone(),
            service: profile.service.clone(),
            indexed: profile.indexed.clone(),
            updated: profile.updated.clone(),
            public_id: profile.public_id.clone(),
            relation_id: profile.relation_id.clone(),
        }
    }
}

/// Registry key: the same user id can exist on several services.
fn registry_key(service: &str, user_id: &str) -> String {
    format!("{}/{}", service, user_id)
}

/// Map of `{service}/{user_id}` to [`ArtistInfo`], persisted as pretty JSON.
#[derive(Debug, Default)]
pub struct ProfileRegistry {
    path: PathBuf,
    profiles: BTreeMap<String, ArtistInfo>,
}

impl ProfileRegistry {
    /// Load the registry of a site folder. A missing or unreadable file
    /// yields an empty registry.
    pub fn load(site_dir: &Path) -> Self {
        let path = site_dir.join(PROFILES_FILE);
        let profiles = std::fs::read_to_string(&path)
            .ok()
            .and_then(|content| match serde_json::from_str(&content) {
                Ok(profiles) => Some(profiles),
                Err(e) => {
                    tracing::warn!("Ignoring unreadable {}: {}", path.display(), e);
                    None
                }
            })
            .unwrap_or_default();

        Self { path, profiles }
    }

    pub fn get(&self, service: &str, user_id: &str) -> Option<&ArtistInfo> {
        self.profiles.get(&registry_key(service, user_id))
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Record a creator under its service and id, then write the registry
    /// back.
    pub fn upsert(&mut self, info: ArtistInfo) -> Result<()> {
        let key = registry_key(&info.service, &info.id);
        if self.profiles.get(&key) == Some(&info) {
            return Ok(());
        }
        self.profiles.insert(key, info);
        self.save()
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.profiles)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(service: &str, name: &str) -> ArtistInfo {
        ArtistInfo {
            id: "42".to_string(),
            name: name.to_string(),
            service: service.to_string(),
            indexed: None,
            updated: Some("2024-05-01".to_string()),
            public_id: Some("artist".to_string()),
            relation_id: None,
        }
    }

    #[test]
    fn test_missing_registry_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ProfileRegistry::load(dir.path());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_upsert_persists() {
        let dir = tempfile::tempdir().unwrap();
        let site = dir.path().join("kemono");

        let mut registry = ProfileRegistry::load(&site);
        registry.upsert(info("patreon", "Artist")).unwrap();
        registry.upsert(info("patreon", "Renamed")).unwrap();

        let reloaded = ProfileRegistry::load(&site);
        assert_eq!(reloaded.len(), 1);
        let stored = reloaded.get("patreon", "42").unwrap();
        assert_eq!(stored.name, "Renamed");
        assert_eq!(stored.id, "42");
        assert_eq!(stored.public_id.as_deref(), Some("artist"));
    }

    #[test]
    fn test_same_id_on_two_services() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = ProfileRegistry::load(dir.path());
        registry.upsert(info("patreon", "On Patreon")).unwrap();
        registry.upsert(info("fanbox", "On Fanbox")).unwrap();

        let reloaded = ProfileRegistry::load(dir.path());
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get("patreon", "42").unwrap().name, "On Patreon");
        assert_eq!(reloaded.get("fanbox", "42").unwrap().name, "On Fanbox");
    }

    #[test]
    fn test_profile_fields_are_kept() {
        let profile: Profile = serde_json::from_value(serde_json::json!({
            "id": "42", "name": "Artist", "service": "patreon", "post_count": 3,
            "indexed": "2024-01-01", "updated": "2024-02-01",
            "public_id": "artist", "relation_id": 7
        }))
        .unwrap();

        let info = ArtistInfo::from(&profile);
        assert_eq!(info.id, "42");
        assert_eq!(info.public_id.as_deref(), Some("artist"));
        assert_eq!(info.relation_id, Some(serde_json::json!(7)));
        assert_eq!(info.indexed.as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn test_corrupt_registry_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PROFILES_FILE), "{not json").unwrap();
        assert!(ProfileRegistry::load(dir.path()).is_empty());
    }
}
