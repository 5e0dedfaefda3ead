use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use jf_arcs::{load_catalog, StorylineCatalog};
use jf_clients::{load_directory, InMemoryDirectory};
use jf_generator::DEFAULT_TIMED_CHANCE;
use jf_pool::PoolConfig;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub engine: EngineConfig,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    pub seed: u64,
    pub reputation: i32,
    pub tick_minutes: u32,
    #[serde(default = "default_timed_chance")]
    pub timed_chance: f64,
}

fn default_timed_chance() -> f64 {
    DEFAULT_TIMED_CHANCE
}

/// Optional YAML overrides; builtin fixtures are used when absent.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub clients_path: Option<String>,
    #[serde(default)]
    pub storylines_path: Option<String>,
}

impl Config {
    pub fn default_for_seed(seed: u64) -> Self {
        Self {
            engine: EngineConfig { seed, reputation: 1, tick_minutes: 5, timed_chance: DEFAULT_TIMED_CHANCE },
            pool: PoolConfig::default(),
            catalog: CatalogConfig::default(),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let cfg: Config = toml::from_str(&s).with_context(|| "parse jobforge.toml")?;
        Ok(cfg)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let s = toml::to_string_pretty(self).with_context(|| "serialize toml")?;
        std::fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    pub fn config_path(root: &Path) -> PathBuf {
        root.join(".jobforge").join("jobforge.toml")
    }

    /// Load `path` if it exists, otherwise the defaults for seed 0.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Self::default_for_seed(0))
        }
    }

    pub fn load_directory(&self, root: &Path) -> Result<InMemoryDirectory> {
        match &self.catalog.clients_path {
            Some(p) => load_directory(&resolve_path(root, p)),
            None => Ok(InMemoryDirectory::builtin()),
        }
    }

    pub fn load_catalog(&self, root: &Path) -> Result<StorylineCatalog> {
        match &self.catalog.storylines_path {
            Some(p) => load_catalog(&resolve_path(root, p)),
            None => Ok(StorylineCatalog::builtin()),
        }
    }
}

/// Tilde-expand `p`; relative results are taken from `root`.
pub fn resolve_path(root: &Path, p: &str) -> PathBuf {
    let expanded = PathBuf::from(shellexpand::tilde(p).to_string());
    if expanded.is_absolute() {
        expanded
    } else {
        root.join(expanded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = Config::config_path(dir.path());
        let mut cfg = Config::default_for_seed(42);
        cfg.pool.arc_chance = 0.5;
        cfg.catalog.clients_path = Some("clients.yaml".into());
        cfg.save_to(&path).unwrap();

        let back = Config::load_from(&path).unwrap();
        assert_eq!(back.engine.seed, 42);
        assert_eq!(back.engine.tick_minutes, 5);
        assert_eq!(back.pool, cfg.pool);
        assert_eq!(back.catalog.clients_path.as_deref(), Some("clients.yaml"));
        assert!(path.ends_with(".jobforge/jobforge.toml"));
    }

    #[test]
    fn missing_sections_take_defaults() {
        let cfg: Config = toml::from_str("[engine]\nseed = 7\nreputation = 2\ntick_minutes = 10\n").unwrap();
        assert_eq!(cfg.pool, PoolConfig::default());
        assert_eq!(cfg.engine.timed_chance, DEFAULT_TIMED_CHANCE);
        assert!(cfg.catalog.storylines_path.is_none());
    }

    #[test]
    fn relative_paths_resolve_against_root() {
        let root = Path::new("/srv/game");
        assert_eq!(resolve_path(root, "data/clients.yaml"), PathBuf::from("/srv/game/data/clients.yaml"));
        assert_eq!(resolve_path(root, "/etc/clients.yaml"), PathBuf::from("/etc/clients.yaml"));
    }
}
