pub mod briefing;
pub mod expiration;
pub mod generator;
pub mod objectives;
pub mod payout;

pub use briefing::*;
pub use expiration::*;
pub use generator::*;
pub use objectives::*;
pub use payout::*;
