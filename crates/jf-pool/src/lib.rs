pub mod config;
pub mod expiry;
pub mod manager;
pub mod state;
pub mod stats;

pub use config::*;
pub use expiry::*;
pub use manager::*;
pub use state::*;
pub use stats::*;
