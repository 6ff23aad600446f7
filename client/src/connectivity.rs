//! Connectivity Monitor: the host's online/offline signal.

use tokio::sync::watch;
use tracing::debug;

/// Latest connectivity observation.
///
/// `reconnects` counts offline-to-online transitions, so a subscriber that
/// misses a quick flap still sees that an edge happened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectivityStatus {
    pub online: bool,
    pub reconnects: u64,
}

/// Publishes the host platform's network reachability.
#[derive(Debug)]
pub struct ConnectivityMonitor {
    status: watch::Sender<ConnectivityStatus>,
}

impl ConnectivityMonitor {
    pub fn new(online: bool) -> Self {
        let (status, _) = watch::channel(ConnectivityStatus {
            online,
            reconnects: 0,
        });
        Self { status }
    }

    /// Report the current reachability. Repeating the same value is a no-op.
    pub fn set_online(&self, online: bool) {
        let changed = self.status.send_if_modified(|status| {
            if status.online == online {
                return false;
            }
            status.online = online;
            if online {
                status.reconnects += 1;
            }
            true
        });
        if changed {
            debug!(online, "connectivity changed");
        }
    }

    pub fn is_online(&self) -> bool {
        self.status.borrow().online
    }

    pub fn status(&self) -> ConnectivityStatus {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectivityStatus> {
        self.status.subscribe()
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_rising_edges_only() {
        let monitor = ConnectivityMonitor::new(false);
        monitor.set_online(true);
        monitor.set_online(true);
        monitor.set_online(false);
        monitor.set_online(false);
        monitor.set_online(true);

        let status = monitor.status();
        assert!(status.online);
        assert_eq!(status.reconnects, 2);
    }

    #[tokio::test]
    async fn repeated_value_does_not_notify() {
        let monitor = ConnectivityMonitor::new(true);
        let mut rx = monitor.subscribe();
        rx.borrow_and_update();

        monitor.set_online(true);
        assert!(!rx.has_changed().unwrap());

        monitor.set_online(false);
        assert!(rx.has_changed().unwrap());
        assert!(!rx.borrow_and_update().online);
    }
}
