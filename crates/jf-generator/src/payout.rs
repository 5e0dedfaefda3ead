use jf_core::{ClientTier, Difficulty};

pub const PAYOUT_PER_OBJECTIVE: f64 = 200.0;
pub const DEADLINE_BONUS: f64 = 300.0;
pub const MIN_TIME_LIMIT_MINUTES: u32 = 3;
pub const MAX_TIME_LIMIT_MINUTES: u32 = 10;
pub const FAILURE_PENALTY_RATIO: f64 = 0.25;

/// Minutes allowed for a timed job: `ceil(3 + 0.8 * objectives)`, clamped to 3..=10.
pub fn calculate_time_limit(objective_count: usize) -> u32 {
    let raw = (3.0 + 0.8 * objective_count as f64).ceil() as u32;
    raw.clamp(MIN_TIME_LIMIT_MINUTES, MAX_TIME_LIMIT_MINUTES)
}

/// `200 * objectives * tier`, plus `300 * 10 / minutes` when the job is timed.
/// A tighter deadline always pays more.
pub fn calculate_payout(objective_count: usize, tier: ClientTier, time_limit_minutes: Option<u32>) -> i64 {
    let base = PAYOUT_PER_OBJECTIVE * objective_count as f64 * tier.payout_multiplier();
    let bonus = match time_limit_minutes {
        Some(minutes) => DEADLINE_BONUS * (10.0 / minutes.max(1) as f64),
        None => 0.0,
    };
    (base + bonus).round() as i64
}

/// Credits taken on failure, as a negative delta.
pub fn failure_penalty(payout: i64) -> i64 {
    -((payout as f64 * FAILURE_PENALTY_RATIO).round() as i64)
}

pub fn difficulty_for_file_count(file_count: usize) -> Difficulty {
    match file_count {
        0..=3 => Difficulty::Easy,
        4..=6 => Difficulty::Medium,
        _ => Difficulty::Hard,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn time_limit_matches_formula() {
        assert_eq!(calculate_time_limit(0), 3);
        assert_eq!(calculate_time_limit(1), 4);
        assert_eq!(calculate_time_limit(5), 7);
        assert_eq!(calculate_time_limit(8), 10);
        assert_eq!(calculate_time_limit(40), 10);
    }

    #[test]
    fn payout_matches_formula() {
        assert_eq!(calculate_payout(5, ClientTier::Individual, None), 1000);
        assert_eq!(calculate_payout(5, ClientTier::Enterprise, None), 2000);
        // 1000 + 300 * 10 / 7
        assert_eq!(calculate_payout(5, ClientTier::Individual, Some(7)), 1429);
        assert_eq!(calculate_payout(4, ClientTier::SmallBusiness, Some(10)), 960 + 300);
    }

    #[test]
    fn penalty_is_a_quarter() {
        assert_eq!(failure_penalty(1000), -250);
        assert_eq!(failure_penalty(1429), -357);
    }

    #[test]
    fn difficulty_thresholds() {
        assert_eq!(difficulty_for_file_count(2), Difficulty::Easy);
        assert_eq!(difficulty_for_file_count(3), Difficulty::Easy);
        assert_eq!(difficulty_for_file_count(4), Difficulty::Medium);
        assert_eq!(difficulty_for_file_count(6), Difficulty::Medium);
        assert_eq!(difficulty_for_file_count(7), Difficulty::Hard);
    }

    proptest! {
        #[test]
        fn time_limit_is_bounded_and_non_decreasing(n in 0usize..200) {
            let t = calculate_time_limit(n);
            prop_assert!((MIN_TIME_LIMIT_MINUTES..=MAX_TIME_LIMIT_MINUTES).contains(&t));
            prop_assert!(calculate_time_limit(n + 1) >= t);
        }

        #[test]
        fn tighter_deadline_pays_more(n in 1usize..20, tight in 3u32..10, slack in 1u32..8) {
            let loose = (tight + slack).min(MAX_TIME_LIMIT_MINUTES);
            prop_assume!(loose > tight);
            for tier in [ClientTier::Individual, ClientTier::MidMarket, ClientTier::Government] {
                prop_assert!(calculate_payout(n, tier, Some(tight)) > calculate_payout(n, tier, Some(loose)));
            }
        }

        #[test]
        fn timed_always_beats_untimed(n in 1usize..20, t in 3u32..=10) {
            prop_assert!(calculate_payout(n, ClientTier::Individual, Some(t)) > calculate_payout(n, ClientTier::Individual, None));
        }
    }
}
