pub mod espn;
pub mod payload;
pub mod provider;

pub use espn::EspnClient;
pub use provider::{with_timeout, ScoreSource};
