pub mod ids;
pub mod model;
pub mod rng;
pub mod time;
pub mod types;

pub use ids::*;
pub use model::*;
pub use rng::*;
pub use time::*;
pub use types::*;
