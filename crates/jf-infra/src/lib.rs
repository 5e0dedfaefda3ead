pub mod names;
pub mod synth;

pub use names::*;
pub use synth::*;
