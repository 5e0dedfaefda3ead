use anyhow::{anyhow, Context, Result};
use std::path::Path;

use jf_clients::ClientDirectory;

use crate::Config;

/// Check that `cfg` can drive a healthy pool: valid pool bounds, loadable
/// catalogs, and enough clients to fill `max` and the accessible floor.
pub fn doctor(root: &Path, cfg: &Config) -> Result<()> {
    cfg.pool.validate().context("invalid [pool] section")?;

    if !(0.0..=1.0).contains(&cfg.engine.timed_chance) {
        return Err(anyhow!("engine.timed_chance must be within [0, 1], got {}", cfg.engine.timed_chance));
    }
    if cfg.engine.tick_minutes == 0 {
        return Err(anyhow!("engine.tick_minutes must be at least 1"));
    }

    let directory = cfg.load_directory(root).context("load client directory")?;
    let catalog = cfg.load_catalog(root).context("load storyline catalog")?;

    if directory.len() < cfg.pool.max {
        return Err(anyhow!(
            "client directory has {} clients but the pool may hold {}; add clients or lower pool.max",
            directory.len(),
            cfg.pool.max
        ));
    }
    let accessible = directory.accessible_clients(cfg.engine.reputation).len();
    if accessible < cfg.pool.min_accessible {
        return Err(anyhow!(
            "only {accessible} clients are open at reputation {} but pool.min_accessible is {}",
            cfg.engine.reputation,
            cfg.pool.min_accessible
        ));
    }
    if catalog.is_empty() && cfg.pool.arc_chance > 0.0 {
        return Err(anyhow!("storyline catalog is empty; set pool.arc_chance = 0 or add storylines"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass() {
        let dir = tempfile::tempdir().unwrap();
        doctor(dir.path(), &Config::default_for_seed(1)).unwrap();
    }

    #[test]
    fn flags_an_unreachable_accessible_floor() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = Config::default_for_seed(1);
        cfg.engine.reputation = 0;
        let err = doctor(dir.path(), &cfg).unwrap_err();
        assert!(err.to_string().contains("reputation 0"), "{err}");
    }

    #[test]
    fn flags_bad_pool_bounds_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = Config::default_for_seed(1);
        cfg.pool.min = 9;
        assert!(doctor(dir.path(), &cfg).is_err());

        let mut cfg = Config::default_for_seed(1);
        cfg.catalog.clients_path = Some("missing.yaml".into());
        let err = doctor(dir.path(), &cfg).unwrap_err();
        assert!(format!("{err:#}").contains("missing.yaml"));
    }
}
