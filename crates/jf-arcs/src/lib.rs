pub mod catalog;
pub mod storyline;

pub use catalog::*;
pub use storyline::*;
