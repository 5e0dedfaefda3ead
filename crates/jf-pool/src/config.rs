use jf_core::{EpochMs, MINUTE_MS};
use jf_generator::ExpirationWindow;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PoolConfigError {
    #[error("pool max must be at least 1")]
    ZeroMax,
    #[error("pool min {min} exceeds max {max}")]
    MinExceedsMax { min: usize, max: usize },
    #[error("min_accessible {min_accessible} exceeds pool min {min}")]
    MinAccessibleExceedsMin { min_accessible: usize, min: usize },
    #[error("{name} must be within [0, 1], got {value}")]
    Probability { name: &'static str, value: f64 },
    #[error("expiration window {min_minutes}..={max_minutes} minutes is empty")]
    EmptyExpirationWindow { min_minutes: u32, max_minutes: u32 },
    #[error("regeneration delay must not be negative, got {0} ms")]
    NegativeDelay(EpochMs),
}

/// Pool sizing and timing knobs.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PoolConfig {
    pub min: usize,
    pub max: usize,
    pub min_accessible: usize,
    /// Chance a new pool entry is attempted as a whole arc.
    pub arc_chance: f64,
    /// Chance a new pool entry goes to an accessible client when not forced.
    pub accessible_bias: f64,
    /// How long a replacement stays hidden after its predecessor expires.
    pub regeneration_delay_ms: EpochMs,
    pub expiration: ExpirationWindow,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min: 4,
            max: 6,
            min_accessible: 2,
            arc_chance: 0.2,
            accessible_bias: 0.7,
            regeneration_delay_ms: MINUTE_MS,
            expiration: ExpirationWindow::default(),
        }
    }
}

impl PoolConfig {
    pub fn validate(&self) -> Result<(), PoolConfigError> {
        if self.max == 0 {
            return Err(PoolConfigError::ZeroMax);
        }
        if self.min > self.max {
            return Err(PoolConfigError::MinExceedsMax { min: self.min, max: self.max });
        }
        if self.min_accessible > self.min {
            return Err(PoolConfigError::MinAccessibleExceedsMin { min_accessible: self.min_accessible, min: self.min });
        }
        for (name, value) in [("arc_chance", self.arc_chance), ("accessible_bias", self.accessible_bias)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PoolConfigError::Probability { name, value });
            }
        }
        let w = self.expiration;
        if w.max_minutes == 0 || w.min_minutes > w.max_minutes {
            return Err(PoolConfigError::EmptyExpirationWindow { min_minutes: w.min_minutes, max_minutes: w.max_minutes });
        }
        if self.regeneration_delay_ms < 0 {
            return Err(PoolConfigError::NegativeDelay(self.regeneration_delay_ms));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = PoolConfig::default();
        assert_eq!((cfg.min, cfg.max, cfg.min_accessible), (4, 6, 2));
        assert_eq!(cfg.regeneration_delay_ms, 60_000);
        assert_eq!(cfg.expiration, ExpirationWindow { min_minutes: 15, max_minutes: 60 });
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_inconsistent_bounds() {
        let cfg = PoolConfig { min: 7, ..Default::default() };
        assert_eq!(cfg.validate(), Err(PoolConfigError::MinExceedsMax { min: 7, max: 6 }));

        let cfg = PoolConfig { min_accessible: 5, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(PoolConfigError::MinAccessibleExceedsMin { .. })));

        let cfg = PoolConfig { min: 0, max: 0, min_accessible: 0, ..Default::default() };
        assert_eq!(cfg.validate(), Err(PoolConfigError::ZeroMax));
    }

    #[test]
    fn rejects_bad_probabilities_and_windows() {
        let cfg = PoolConfig { arc_chance: 1.5, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(PoolConfigError::Probability { name: "arc_chance", .. })));

        let cfg = PoolConfig { expiration: ExpirationWindow { min_minutes: 30, max_minutes: 10 }, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(PoolConfigError::EmptyExpirationWindow { .. })));

        let cfg = PoolConfig { regeneration_delay_ms: -1, ..Default::default() };
        assert_eq!(cfg.validate(), Err(PoolConfigError::NegativeDelay(-1)));
    }
}
