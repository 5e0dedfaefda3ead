pub mod config;
pub mod doctor;
pub mod session;
pub mod simulate;

pub use config::*;
pub use doctor::*;
pub use session::*;
pub use simulate::*;
