use anyhow::{anyhow, Context, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use crate::space::Polygon;

/// Persistence for the space polygon list.
///
/// The list is always read and written whole; there is no partial update.
pub trait SpaceStore: Send + Sync {
    fn load(&self) -> Result<Vec<Polygon>>;

    fn save(&self, polygons: &[Polygon]) -> Result<()>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

/// JSON file store: `[[[x, y], ...], ...]`.
pub struct JsonSpaceStore {
    path: PathBuf,
}

impl JsonSpaceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SpaceStore for JsonSpaceStore {
    fn load(&self) -> Result<Vec<Polygon>> {
        if !self.path.exists() {
            log::info!(
                "space file {} not found, starting with no spaces",
                self.path.display()
            );
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read space file {}", self.path.display()))?;
        let polygons: Vec<Polygon> = serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid space file {}: {}", self.path.display(), e))?;
        for (index, polygon) in polygons.iter().enumerate() {
            if polygon.is_degenerate() {
                log::warn!(
                    "space {} in {} has {} vertices and will never report occupied",
                    index + 1,
                    self.path.display(),
                    polygon.len()
                );
            }
        }
        Ok(polygons)
    }

    fn save(&self, polygons: &[Polygon]) -> Result<()> {
        let json = serde_json::to_string(polygons)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("failed to write space file {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path).with_context(|| {
            format!(
                "failed to replace space file {} with {}",
                self.path.display(),
                tmp.display()
            )
        })?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct InMemorySpaceStore {
    polygons: Mutex<Vec<Polygon>>,
}

impl InMemorySpaceStore {
    pub fn new(polygons: Vec<Polygon>) -> Self {
        Self {
            polygons: Mutex::new(polygons),
        }
    }

    pub fn snapshot(&self) -> Vec<Polygon> {
        self.polygons
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

impl SpaceStore for InMemorySpaceStore {
    fn load(&self) -> Result<Vec<Polygon>> {
        let guard = self
            .polygons
            .lock()
            .map_err(|_| anyhow!("space store lock poisoned"))?;
        Ok(guard.clone())
    }

    fn save(&self, polygons: &[Polygon]) -> Result<()> {
        let mut guard = self
            .polygons
            .lock()
            .map_err(|_| anyhow!("space store lock poisoned"))?;
        *guard = polygons.to_vec();
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

fn config_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^parking_spaces(\d+)\.json$").unwrap())
}

/// Space configuration files in `dir`, sorted by file name.
pub fn available_configs(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to list {}", dir.display()))?;
    let mut found = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if config_name_re().is_match(name) && entry.path().is_file() {
            found.push(entry.path());
        }
    }
    found.sort();
    Ok(found)
}

/// Display label for a configuration file ("Live3 Config").
pub fn config_label(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let caps = config_name_re().captures(name)?;
    Some(format!("Live{} Config", &caps[1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_follow_the_file_number() {
        assert_eq!(
            config_label(Path::new("/tmp/parking_spaces12.json")).as_deref(),
            Some("Live12 Config")
        );
        assert_eq!(config_label(Path::new("spaces.json")), None);
        assert_eq!(config_label(Path::new("parking_spacesA.json")), None);
    }

    #[test]
    fn in_memory_store_replaces_whole_list() {
        let store = InMemorySpaceStore::new(vec![Polygon::from_pairs(&[(0, 0), (1, 0), (1, 1)])]);
        assert_eq!(store.load().unwrap().len(), 1);
        store.save(&[]).unwrap();
        assert!(store.load().unwrap().is_empty());
    }
}
