/// Simulated milliseconds. The engine never reads a wall clock; every
/// operation takes `now` from the caller, which may run faster than real time
/// or jump ahead in batches.
pub type EpochMs = i64;

pub const MINUTE_MS: EpochMs = 60_000;

pub fn minutes_to_ms(minutes: u32) -> EpochMs {
    minutes as EpochMs * MINUTE_MS
}
