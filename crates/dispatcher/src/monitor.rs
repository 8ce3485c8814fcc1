//! Peer session monitor - periodic transport probing.
//!
//! The monitor is the only component that derives `ConnectionState`; the
//! dispatcher and any UI surface observe its transitions, they never probe
//! the transport themselves.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, instrument};

use contracts::{ConnectionState, PeerTransport};

use crate::dispatcher::OutboundDispatcher;

/// Periodic link prober driving connection-state transitions
pub struct SessionMonitor<T: PeerTransport> {
    transport: Arc<T>,
    dispatcher: Arc<OutboundDispatcher<T>>,
    probe_interval: Duration,
    state_tx: watch::Sender<ConnectionState>,
}

impl<T: PeerTransport + Send + Sync + 'static> SessionMonitor<T> {
    /// Create a monitor over the transport shared with `dispatcher`.
    ///
    /// Returns the monitor and a watch receiver publishing every observed
    /// connection state.
    pub fn new(
        transport: Arc<T>,
        dispatcher: Arc<OutboundDispatcher<T>>,
        probe_interval: Duration,
    ) -> (Self, watch::Receiver<ConnectionState>) {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        (
            Self {
                transport,
                dispatcher,
                probe_interval,
                state_tx,
            },
            state_rx,
        )
    }

    /// Spawn the probe loop as a background task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Run the probe loop.
    ///
    /// Exits when every state receiver has been dropped.
    #[instrument(name = "session_monitor_run", skip(self), fields(transport = self.transport.name()))]
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.probe_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        info!(
            interval_ms = self.probe_interval.as_millis() as u64,
            "Session monitor started"
        );

        loop {
            ticker.tick().await;

            if self.state_tx.is_closed() {
                break;
            }

            self.probe_once().await;
        }

        info!("Session monitor stopped");
    }

    /// One probe cycle: observe, derive, propagate on change
    pub async fn probe_once(&self) {
        let probe = self.transport.probe();
        let state = ConnectionState::from_probe(probe);
        let previous = *self.state_tx.borrow();

        if state == previous {
            return;
        }

        info!(
            from = previous.as_str(),
            to = state.as_str(),
            reachable = probe.reachable,
            session_active = probe.session_active,
            "Link condition changed"
        );

        observability::record_connection_state(state);
        self.dispatcher.on_connection_change(state).await;
        let _ = self.state_tx.send(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::MemoryLink;

    #[tokio::test]
    async fn test_monitor_derives_states() {
        let (sensor, _companion) = MemoryLink::pair(4);
        let dispatcher = Arc::new(OutboundDispatcher::new(Arc::clone(&sensor)));
        let (monitor, state_rx) = SessionMonitor::new(
            Arc::clone(&sensor),
            Arc::clone(&dispatcher),
            Duration::from_millis(5),
        );

        assert_eq!(*state_rx.borrow(), ConnectionState::Disconnected);

        sensor.set_session_active(true);
        monitor.probe_once().await;
        assert_eq!(*state_rx.borrow(), ConnectionState::Weak);
        assert_eq!(dispatcher.connection_state(), ConnectionState::Weak);

        sensor.set_reachable(true);
        monitor.probe_once().await;
        assert_eq!(*state_rx.borrow(), ConnectionState::Strong);

        sensor.set_session_active(false);
        monitor.probe_once().await;
        assert_eq!(*state_rx.borrow(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_monitor_drains_dispatcher_on_recovery() {
        let (sensor, _companion) = MemoryLink::pair(4);
        let dispatcher = Arc::new(OutboundDispatcher::new(Arc::clone(&sensor)));
        let (monitor, _state_rx) = SessionMonitor::new(
            Arc::clone(&sensor),
            Arc::clone(&dispatcher),
            Duration::from_millis(5),
        );

        dispatcher
            .send(
                contracts::message_type::WORKOUT_END_SIGNAL,
                serde_json::Map::new(),
                contracts::Priority::Normal,
            )
            .await;
        assert_eq!(dispatcher.retry_depth(), 1);

        sensor.set_session_active(true);
        monitor.probe_once().await;

        // Weak recovery routes the queued message to the durable tier
        assert_eq!(dispatcher.retry_depth(), 0);
        assert_eq!(sensor.durable_pending(), 1);
    }

    #[tokio::test]
    async fn test_spawned_monitor_observes_changes() {
        let (sensor, _companion) = MemoryLink::pair(4);
        let dispatcher = Arc::new(OutboundDispatcher::new(Arc::clone(&sensor)));
        let (monitor, mut state_rx) = SessionMonitor::new(
            Arc::clone(&sensor),
            dispatcher,
            Duration::from_millis(2),
        );
        let handle = monitor.spawn();

        sensor.set_session_active(true);
        sensor.set_reachable(true);

        state_rx.changed().await.unwrap();
        assert_eq!(*state_rx.borrow(), ConnectionState::Strong);

        drop(state_rx);
        handle.await.unwrap();
    }
}
