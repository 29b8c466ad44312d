use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Daemon configuration. Tags are an array of tables because their order is
/// the classification order: the first matching tag wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Interval of the geometry autosave tick, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autosave_interval_ms: Option<u64>,
    #[serde(default)]
    pub tags: Vec<TagConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub class: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub instance: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub role: BTreeSet<String>,
    /// Launch command for `toggle` on an empty tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prog: Option<String>,
    /// Saved geometry as "WxH+X+Y". Written back by geom-save/geom-dump.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geom: Option<String>,
    /// Named sub-contexts within the tag, keyed by app name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub subprograms: BTreeMap<String, SubProgram>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubProgram {
    /// Window classes that belong to this sub-context.
    #[serde(default)]
    pub includes: BTreeSet<String>,
    pub prog: String,
}

impl Config {
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var("OSHIIRE_CONFIG") {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/etc"))
            .join("oshiire")
            .join("config.toml")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {:?}", path))?;
        toml::from_str(&text).with_context(|| format!("failed to parse config {:?}", path))
    }

    pub fn tag(&self, name: &str) -> Option<&TagConfig> {
        self.tags.iter().find(|t| t.name == name)
    }

    /// Update a tag's saved geometry in memory. Returns false for unknown tags.
    pub fn set_geom(&mut self, name: &str, geom: String) -> bool {
        match self.tags.iter_mut().find(|t| t.name == name) {
            Some(tag) => {
                tag.geom = Some(geom);
                true
            }
            None => false,
        }
    }

    /// Persist the configuration, geometry updates included.
    pub fn dump(&self, path: &Path) -> Result<()> {
        let text = toml::to_string_pretty(self).context("failed to serialize config")?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create config dir {:?}", dir))?;
        }
        std::fs::write(path, text).with_context(|| format!("failed to write config {:?}", path))
    }
}
