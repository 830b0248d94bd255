use tokio::sync::watch;
use tracing::info;

/// Tracks whether the device currently has a usable network path.
///
/// The surrounding shell feeds observed reachability changes into
/// [`set_online`](ConnectivityMonitor::set_online); the dispatcher consults
/// the flag before every submission attempt.
pub struct ConnectivityMonitor {
    online: watch::Sender<bool>,
}

impl ConnectivityMonitor {
    /// Create a monitor with the given starting assumption.
    pub fn new(initially_online: bool) -> Self {
        let (online, _receiver) = watch::channel(initially_online);
        Self { online }
    }

    /// Current connectivity flag.
    pub fn is_online(&self) -> bool {
        *self.online.borrow()
    }

    /// Record a reachability change, notifying watchers when it differs.
    pub fn set_online(&self, value: bool) {
        if self.is_online() == value {
            return;
        }
        info!(online = value, "connectivity changed");
        let _ = self.online.send(value);
    }

    /// Subscribe to connectivity updates, e.g. to trigger a resync pass when
    /// the device comes back online.
    pub fn watcher(&self) -> watch::Receiver<bool> {
        self.online.subscribe()
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}
