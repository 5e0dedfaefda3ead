use rand::rngs::SmallRng;
use rand::SeedableRng;

/// Default RNG for the engine. Generation code is generic over `rand::Rng`,
/// this is just what the shell and the tests hand in.
pub type GameRng = SmallRng;

pub fn seeded_rng(seed: u64) -> GameRng {
    SmallRng::seed_from_u64(seed)
}
