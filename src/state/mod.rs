//! Shared client state: the injected scorecard cache and connectivity flag.

/// Explicit scorecard cache store and its invalidation hub.
pub mod cache;
/// Connectivity tracking shared by the dispatcher.
pub mod connectivity;

pub use self::cache::{Invalidation, ScorecardCache};
pub use self::connectivity::ConnectivityMonitor;
