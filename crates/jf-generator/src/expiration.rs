use jf_core::{minutes_to_ms, EpochMs, Job};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How long a visible, unaccepted job stays on offer.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExpirationWindow {
    pub min_minutes: u32,
    pub max_minutes: u32,
}

impl Default for ExpirationWindow {
    fn default() -> Self {
        Self { min_minutes: 15, max_minutes: 60 }
    }
}

impl ExpirationWindow {
    pub fn sample_ms<R: Rng + ?Sized>(&self, rng: &mut R) -> EpochMs {
        let lo = self.min_minutes.min(self.max_minutes);
        let hi = self.min_minutes.max(self.max_minutes);
        minutes_to_ms(rng.gen_range(lo..=hi))
    }
}

/// Stamp `expires_at` somewhere in the window after `now`.
pub fn add_expiration_to_mission<R: Rng + ?Sized>(mut job: Job, now: EpochMs, window: &ExpirationWindow, rng: &mut R) -> Job {
    job.expires_at = Some(now + window.sample_ms(rng));
    job
}

#[cfg(test)]
mod tests {
    use jf_core::{seeded_rng, MINUTE_MS};

    use super::*;

    #[test]
    fn samples_stay_in_window() {
        let window = ExpirationWindow::default();
        let mut rng = seeded_rng(4);
        for _ in 0..500 {
            let ms = window.sample_ms(&mut rng);
            assert!((15 * MINUTE_MS..=60 * MINUTE_MS).contains(&ms));
        }
    }

    #[test]
    fn inverted_window_is_tolerated() {
        let window = ExpirationWindow { min_minutes: 30, max_minutes: 20 };
        let mut rng = seeded_rng(4);
        let ms = window.sample_ms(&mut rng);
        assert!((20 * MINUTE_MS..=30 * MINUTE_MS).contains(&ms));
    }
}
