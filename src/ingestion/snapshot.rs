use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::InventoryConfig;
use crate::ingestion::collector::{CollectionOutcome, CollectionReport};
use crate::ingestion::error::IngestionError;
use crate::security::templates::SECURITY_GROUPS_KIND;
use crate::security::types::{FirewallSet, Resource, ResourceType};

const RESOURCES_DIR: &str = "resources";
const SNAPSHOT_EXTENSIONS: &[&str] = &["json", "yaml", "yml"];

/// Everything the external collectors produced for one profile
#[derive(Debug, Clone, Default, Serialize)]
pub struct InventorySnapshot {
    pub profile: String,
    pub security_groups: Vec<FirewallSet>,
    pub resources: Vec<Resource>,
    pub collection: CollectionReport,
}

impl InventorySnapshot {
    pub fn resources_of(&self, resource_type: ResourceType) -> Vec<&Resource> {
        self.resources
            .iter()
            .filter(|r| r.resource_type == resource_type)
            .collect()
    }
}

/// Reads inventory snapshots laid out as
/// `<root>/<profile>/security-groups.json` and `<root>/<profile>/resources/<kind>.json`.
#[derive(Debug, Clone)]
pub struct SnapshotLoader {
    root: PathBuf,
}

impl SnapshotLoader {
    pub fn new(config: &InventoryConfig) -> Self {
        SnapshotLoader {
            root: PathBuf::from(&config.root_path),
        }
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        SnapshotLoader { root: root.into() }
    }

    /// Profiles are the non-hidden directories directly under the root
    pub fn list_profiles(&self) -> Result<Vec<String>, IngestionError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.root).map_err(|source| IngestionError::Io {
            path: self.root.clone(),
            source,
        })?;

        let mut profiles: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .filter_map(|e| e.file_name().to_str().map(|s| s.to_string()))
            .filter(|name| !name.starts_with('.'))
            .collect();
        profiles.sort();
        Ok(profiles)
    }

    /// Load one profile. Only an unreachable profile or an unreadable
    /// security-group snapshot fails; each resource kind degrades on its own.
    pub fn load(&self, profile: &str) -> Result<InventorySnapshot, IngestionError> {
        let profile_dir = self.profile_dir(profile)?;
        let mut collection = CollectionReport::default();

        let security_groups: Vec<FirewallSet> = match find_snapshot(&profile_dir, SECURITY_GROUPS_KIND) {
            Some(path) => {
                let sets: Vec<FirewallSet> = read_snapshot(&path)?;
                collection.record(CollectionOutcome::Loaded {
                    kind: SECURITY_GROUPS_KIND.to_string(),
                    count: sets.len(),
                });
                sets
            }
            None => {
                warn!("No security group snapshot for profile {}", profile);
                collection.record(CollectionOutcome::Failed {
                    kind: SECURITY_GROUPS_KIND.to_string(),
                    reason: "snapshot file missing".to_string(),
                });
                Vec::new()
            }
        };

        let resources = self.load_resources(&profile_dir.join(RESOURCES_DIR), &mut collection);

        info!(
            "Loaded profile {}: {} security groups, {} resources ({} collections failed)",
            profile,
            security_groups.len(),
            resources.len(),
            collection.failures().len()
        );

        Ok(InventorySnapshot {
            profile: profile.to_string(),
            security_groups,
            resources,
            collection,
        })
    }

    fn profile_dir(&self, profile: &str) -> Result<PathBuf, IngestionError> {
        let trimmed = profile.trim();
        if trimmed.is_empty()
            || trimmed.starts_with('.')
            || trimmed.contains('/')
            || trimmed.contains('\\')
        {
            return Err(IngestionError::InvalidProfile(profile.to_string()));
        }

        let dir = self.root.join(trimmed);
        if !dir.is_dir() {
            return Err(IngestionError::ProfileNotFound(trimmed.to_string()));
        }
        Ok(dir)
    }

    fn load_resources(&self, dir: &Path, collection: &mut CollectionReport) -> Vec<Resource> {
        let mut resources = Vec::new();
        if !dir.is_dir() {
            debug!("No resource snapshots under {}", dir.display());
            return resources;
        }

        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if file_name.starts_with('.') || !has_snapshot_extension(path) {
                continue;
            }

            let kind = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("")
                .to_string();

            match read_snapshot::<Vec<Resource>>(path) {
                Ok(mut loaded) => {
                    if let Some(kind_type) = ResourceType::from_kind(&kind) {
                        for resource in loaded.iter_mut() {
                            if resource.resource_type == ResourceType::Other {
                                resource.resource_type = kind_type;
                            }
                        }
                    }
                    debug!("Loaded {} {} resources", loaded.len(), kind);
                    collection.record(CollectionOutcome::Loaded {
                        kind,
                        count: loaded.len(),
                    });
                    resources.extend(loaded);
                }
                Err(e) => {
                    warn!("Skipping {}: {}", kind, e);
                    collection.record(CollectionOutcome::Failed {
                        kind,
                        reason: e.to_string(),
                    });
                }
            }
        }

        resources
    }
}

fn has_snapshot_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SNAPSHOT_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn find_snapshot(dir: &Path, kind: &str) -> Option<PathBuf> {
    SNAPSHOT_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{}", kind, ext)))
        .find(|path| path.is_file())
}

/// Parse a JSON or YAML snapshot file, chosen by extension
pub fn read_snapshot<T: DeserializeOwned>(path: &Path) -> Result<T, IngestionError> {
    let content = fs::read_to_string(path).map_err(|source| IngestionError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "json" => serde_json::from_str(&content).map_err(|source| IngestionError::Json {
            path: path.to_path_buf(),
            source,
        }),
        "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|source| IngestionError::Yaml {
            path: path.to_path_buf(),
            source,
        }),
        _ => Err(IngestionError::UnsupportedFormat(path.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_profile(root: &Path, profile: &str) -> PathBuf {
        let dir = root.join(profile);
        fs::create_dir_all(dir.join(RESOURCES_DIR)).unwrap();
        fs::write(dir.join("security-groups.json"), r#"[
            {
                "id": "sg-1",
                "name": "web",
                "permissions": [
                    {"egress": false, "protocol": "tcp", "from_port": 22, "to_port": 22, "partners": ["0.0.0.0/0"]}
                ]
            }
        ]"#).unwrap();
        dir
    }

    #[test]
    fn test_load_profile_with_yaml_resources() {
        let temp_dir = TempDir::new().unwrap();
        let dir = write_profile(temp_dir.path(), "prod");
        fs::write(dir.join(RESOURCES_DIR).join("ec2.yaml"), r#"
- id: i-0abc
  name: bastion
  interface_id: eni-1
  private_address: 10.0.1.10
  security_group_ids: [sg-1]
"#).unwrap();

        let loader = SnapshotLoader::with_root(temp_dir.path());
        let snapshot = loader.load("prod").unwrap();

        assert_eq!(snapshot.security_groups.len(), 1);
        assert_eq!(snapshot.security_groups[0].permissions[0].from_port, Some(22));
        assert_eq!(snapshot.resources.len(), 1);
        assert_eq!(snapshot.resources[0].resource_type, ResourceType::Ec2Instance);
        assert!(snapshot.collection.is_complete());
    }

    #[test]
    fn test_broken_resource_file_degrades() {
        let temp_dir = TempDir::new().unwrap();
        let dir = write_profile(temp_dir.path(), "prod");
        fs::write(dir.join(RESOURCES_DIR).join("msk.json"), "{ not json").unwrap();
        fs::write(
            dir.join(RESOURCES_DIR).join("elbs.json"),
            r#"[{"id": "lb-1", "security_group_ids": ["sg-1"]}]"#,
        ).unwrap();

        let snapshot = SnapshotLoader::with_root(temp_dir.path()).load("prod").unwrap();

        assert_eq!(snapshot.resources.len(), 1);
        assert_eq!(snapshot.resources[0].resource_type, ResourceType::LoadBalancer);
        assert_eq!(snapshot.collection.failures().len(), 1);
        assert_eq!(snapshot.collection.failures()[0].kind(), "msk");
    }

    #[test]
    fn test_explicit_resource_type_is_kept() {
        let temp_dir = TempDir::new().unwrap();
        let dir = write_profile(temp_dir.path(), "prod");
        fs::write(
            dir.join(RESOURCES_DIR).join("ec2.json"),
            r#"[{"id": "eni-9", "resource_type": "network-interface"}]"#,
        ).unwrap();

        let snapshot = SnapshotLoader::with_root(temp_dir.path()).load("prod").unwrap();

        assert_eq!(snapshot.resources[0].resource_type, ResourceType::NetworkInterface);
    }

    #[test]
    fn test_unknown_and_invalid_profiles() {
        let temp_dir = TempDir::new().unwrap();
        let loader = SnapshotLoader::with_root(temp_dir.path());

        assert!(loader.load("missing").unwrap_err().is_not_found());
        assert!(matches!(
            loader.load("../etc"),
            Err(IngestionError::InvalidProfile(_))
        ));
    }

    #[test]
    fn test_list_profiles_sorted() {
        let temp_dir = TempDir::new().unwrap();
        write_profile(temp_dir.path(), "staging");
        write_profile(temp_dir.path(), "prod");
        fs::create_dir_all(temp_dir.path().join(".cache")).unwrap();

        let profiles = SnapshotLoader::with_root(temp_dir.path()).list_profiles().unwrap();
        assert_eq!(profiles, vec!["prod".to_string(), "staging".to_string()]);
    }

    #[test]
    fn test_missing_security_groups_recorded() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("empty")).unwrap();

        let snapshot = SnapshotLoader::with_root(temp_dir.path()).load("empty").unwrap();

        assert!(snapshot.security_groups.is_empty());
        assert_eq!(snapshot.collection.failures()[0].kind(), "security-groups");
    }
}
