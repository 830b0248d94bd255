//! Wire types exchanged with the scoring backend and its push feeds.

pub mod admin;
pub mod phase;
pub mod push;
pub mod score;
pub mod scorecard;
