//! Outbound dispatcher - priority-aware delivery over a two-tier transport
//!
//! Responsibilities:
//! - Stamp outbound messages with a logical id and timestamp
//! - Pick a delivery tier per priority and observed connection state
//! - Park normal-priority messages while disconnected and drain them on
//!   reconnection

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, instrument, warn};

use contracts::{
    ConnectionState, ContractError, MessageId, OutboundMessage, PeerTransport, Priority,
};

use crate::metrics::DispatchMetrics;

/// Why a dispatch failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchFailure {
    /// Peer not reachable for the required tier; message dropped
    NotReachable,
    /// Transport endpoint has shut down
    LinkClosed,
}

/// Outcome of a dispatch call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Delivered immediately or handed to the durable tier
    Accepted,
    /// Parked in the retry queue until the link recovers
    Queued,
    /// Dropped
    Failed(DispatchFailure),
}

impl DispatchOutcome {
    /// Stable label for logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchOutcome::Accepted => "accepted",
            DispatchOutcome::Queued => "queued",
            DispatchOutcome::Failed(DispatchFailure::NotReachable) => "failed_not_reachable",
            DispatchOutcome::Failed(DispatchFailure::LinkClosed) => "failed_link_closed",
        }
    }
}

/// MessageId-keyed retry queue, insertion order retained, last-write-wins
#[derive(Debug, Default)]
struct RetryQueue {
    entries: Vec<OutboundMessage>,
}

impl RetryQueue {
    /// Insert a message, replacing any entry with the same id in place
    fn upsert(&mut self, message: OutboundMessage) {
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|e| e.message_id == message.message_id)
        {
            *existing = message;
        } else {
            self.entries.push(message);
        }
    }

    /// Re-insert a failed drain entry unless a newer message with the same
    /// id arrived while the drain was in flight
    fn restore_if_absent(&mut self, message: OutboundMessage) {
        if !self
            .entries
            .iter()
            .any(|e| e.message_id == message.message_id)
        {
            self.entries.push(message);
        }
    }

    /// Take every entry in insertion order
    fn take_all(&mut self) -> Vec<OutboundMessage> {
        std::mem::take(&mut self.entries)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Dispatcher-side shared state; lock scopes never cross an await point
#[derive(Debug)]
struct DispatchState {
    connection: ConnectionState,
    retry: RetryQueue,
    last_sync: Option<DateTime<Utc>>,
}

/// Priority-aware outbound dispatcher over a [`PeerTransport`]
pub struct OutboundDispatcher<T: PeerTransport> {
    transport: Arc<T>,
    state: Mutex<DispatchState>,
    metrics: Arc<DispatchMetrics>,
    seq: AtomicU64,
}

impl<T: PeerTransport> OutboundDispatcher<T> {
    /// Create a dispatcher over the given transport endpoint
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            state: Mutex::new(DispatchState {
                connection: ConnectionState::Disconnected,
                retry: RetryQueue::default(),
                last_sync: None,
            }),
            metrics: Arc::new(DispatchMetrics::new()),
            seq: AtomicU64::new(0),
        }
    }

    /// Shared metrics handle
    pub fn metrics(&self) -> Arc<DispatchMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Currently observed connection state
    pub fn connection_state(&self) -> ConnectionState {
        self.lock_state().connection
    }

    /// Instant of the last successful immediate-tier delivery
    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.lock_state().last_sync
    }

    /// Current retry queue depth
    pub fn retry_depth(&self) -> usize {
        self.lock_state().retry.len()
    }

    /// Stamp and dispatch a message per the priority policy
    #[instrument(name = "dispatch_send", skip(self, payload), fields(message_type, priority = priority.as_str()))]
    pub async fn send(
        &self,
        message_type: &str,
        payload: serde_json::Map<String, serde_json::Value>,
        priority: Priority,
    ) -> DispatchOutcome {
        let message = OutboundMessage {
            message_type: message_type.to_string(),
            payload,
            priority,
            message_id: self.stamp_message_id(message_type),
            timestamp: Self::stamp_timestamp(),
        };

        let outcome = self.apply_policy(message).await;
        self.record_outcome(priority, outcome);
        outcome
    }

    /// Monitor callback: the observed connection state changed.
    ///
    /// A transition into `Weak` or `Strong` drains the retry queue.
    #[instrument(name = "dispatch_connection_change", skip(self), fields(state = state.as_str()))]
    pub async fn on_connection_change(&self, state: ConnectionState) {
        let previous = {
            let mut guard = self.lock_state();
            let previous = guard.connection;
            guard.connection = state;
            previous
        };

        if previous == state {
            return;
        }

        info!(
            from = previous.as_str(),
            to = state.as_str(),
            "Connection state changed"
        );

        if state != ConnectionState::Disconnected {
            self.drain_retry_queue().await;
        }
    }

    /// Re-apply the priority policy to every parked message.
    ///
    /// Successes leave the queue; failures return to it unless superseded
    /// by a newer message with the same id.
    async fn drain_retry_queue(&self) {
        let pending = {
            let mut guard = self.lock_state();
            guard.retry.take_all()
        };

        if pending.is_empty() {
            return;
        }

        self.metrics.inc_drain();
        info!(pending = pending.len(), "Draining retry queue");

        for message in pending {
            let outcome = self.apply_policy(message.clone()).await;
            match outcome {
                DispatchOutcome::Accepted => {}
                _ => {
                    let mut guard = self.lock_state();
                    guard.retry.restore_if_absent(message);
                }
            }
        }

        self.publish_retry_depth();
    }

    /// Route one stamped message per priority and observed state
    async fn apply_policy(&self, message: OutboundMessage) -> DispatchOutcome {
        let connection = self.connection_state();

        match message.priority {
            Priority::High => self.dispatch_high(message, connection).await,
            Priority::Normal => self.dispatch_normal(message, connection).await,
            Priority::Low => self.dispatch_low(message).await,
        }
    }

    /// High: immediate tier only, never queued, loss is expected
    async fn dispatch_high(
        &self,
        message: OutboundMessage,
        connection: ConnectionState,
    ) -> DispatchOutcome {
        if !connection.can_send_immediate() {
            debug!(
                message_type = %message.message_type,
                state = connection.as_str(),
                "High-priority message dropped without attempt"
            );
            return DispatchOutcome::Failed(DispatchFailure::NotReachable);
        }

        match self.try_immediate(&message).await {
            Ok(()) => DispatchOutcome::Accepted,
            Err(_) => {
                debug!(
                    message_type = %message.message_type,
                    "High-priority immediate send failed, message dropped"
                );
                DispatchOutcome::Failed(DispatchFailure::NotReachable)
            }
        }
    }

    /// Normal: immediate with durable fallback, retry queue while disconnected
    async fn dispatch_normal(
        &self,
        message: OutboundMessage,
        connection: ConnectionState,
    ) -> DispatchOutcome {
        match connection {
            ConnectionState::Strong => {
                if self.try_immediate(&message).await.is_ok() {
                    return DispatchOutcome::Accepted;
                }
                warn!(
                    message_type = %message.message_type,
                    "Immediate send failed, falling back to durable transfer"
                );
                self.enqueue_durable(&message).await
            }
            ConnectionState::Weak => self.enqueue_durable(&message).await,
            ConnectionState::Disconnected => {
                {
                    let mut guard = self.lock_state();
                    guard.retry.upsert(message);
                }
                self.publish_retry_depth();
                DispatchOutcome::Queued
            }
        }
    }

    /// Low: durable tier in every state
    async fn dispatch_low(&self, message: OutboundMessage) -> DispatchOutcome {
        self.enqueue_durable(&message).await
    }

    async fn try_immediate(&self, message: &OutboundMessage) -> Result<(), ContractError> {
        let envelope = message.envelope();
        match self.transport.send_immediate(&envelope).await {
            Ok(()) => {
                self.metrics.inc_immediate_sent();
                let mut guard = self.lock_state();
                guard.last_sync = Some(Utc::now());
                Ok(())
            }
            Err(e) => {
                self.metrics.inc_immediate_failure();
                Err(e)
            }
        }
    }

    async fn enqueue_durable(&self, message: &OutboundMessage) -> DispatchOutcome {
        let envelope = message.envelope();
        match self.transport.enqueue_durable(&envelope).await {
            Ok(()) => {
                self.metrics.inc_durable_enqueued();
                DispatchOutcome::Accepted
            }
            Err(e) => {
                error!(
                    message_type = %message.message_type,
                    error = %e,
                    "Durable enqueue failed, link closed"
                );
                DispatchOutcome::Failed(DispatchFailure::LinkClosed)
            }
        }
    }

    /// Stamp the logical id; [`MessageId::for_type`] holds the coalescing rule
    fn stamp_message_id(&self, message_type: &str) -> MessageId {
        MessageId::for_type(message_type, || self.seq.fetch_add(1, Ordering::Relaxed))
    }

    fn stamp_timestamp() -> f64 {
        Utc::now().timestamp_millis() as f64 / 1000.0
    }

    fn record_outcome(&self, priority: Priority, outcome: DispatchOutcome) {
        match outcome {
            DispatchOutcome::Accepted => self.metrics.inc_accepted(),
            DispatchOutcome::Queued => self.metrics.inc_queued(),
            DispatchOutcome::Failed(_) => self.metrics.inc_failed(),
        }
        observability::record_dispatch_outcome(priority, outcome.as_str());
        self.publish_retry_depth();
    }

    fn publish_retry_depth(&self) {
        let depth = self.retry_depth();
        self.metrics.set_retry_depth(depth);
        observability::record_retry_queue_depth(depth);
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, DispatchState> {
        // Lock scopes never cross an await; a poisoned lock means a
        // panicked holder, which only happens in tests
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::MemoryLink;
    use contracts::message_type;

    fn payload(key: &str, value: f64) -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::new();
        map.insert(key.into(), value.into());
        map
    }

    #[tokio::test]
    async fn test_high_priority_dropped_while_disconnected() {
        let (sensor, _companion) = MemoryLink::pair(8);
        let dispatcher = OutboundDispatcher::new(sensor);

        let outcome = dispatcher
            .send(message_type::REALTIME_DATA, payload("elapsed_time", 1.0), Priority::High)
            .await;

        assert_eq!(
            outcome,
            DispatchOutcome::Failed(DispatchFailure::NotReachable)
        );
        assert_eq!(dispatcher.retry_depth(), 0, "high must never queue");
    }

    #[tokio::test]
    async fn test_high_priority_delivered_while_strong() {
        let (sensor, companion) = MemoryLink::pair(8);
        sensor.set_reachable(true);
        sensor.set_session_active(true);
        let dispatcher = OutboundDispatcher::new(Arc::clone(&sensor));
        dispatcher.on_connection_change(ConnectionState::Strong).await;

        let outcome = dispatcher
            .send(message_type::REALTIME_DATA, payload("elapsed_time", 1.0), Priority::High)
            .await;

        assert_eq!(outcome, DispatchOutcome::Accepted);
        assert!(dispatcher.last_sync().is_some());
        let delivered = companion.inbox().try_recv().unwrap();
        let envelope = contracts::MessageEnvelope::decode(&delivered).unwrap();
        assert_eq!(envelope.message_type, "realtime_data");
    }

    #[tokio::test]
    async fn test_normal_priority_queued_while_disconnected() {
        let (sensor, _companion) = MemoryLink::pair(8);
        let dispatcher = OutboundDispatcher::new(sensor);

        let outcome = dispatcher
            .send(
                message_type::WORKOUT_END_SIGNAL,
                serde_json::Map::new(),
                Priority::Normal,
            )
            .await;

        assert_eq!(outcome, DispatchOutcome::Queued);
        assert_eq!(dispatcher.retry_depth(), 1);
    }

    #[tokio::test]
    async fn test_retry_queue_last_write_wins() {
        let (sensor, _companion) = MemoryLink::pair(8);
        let dispatcher = OutboundDispatcher::new(sensor);

        for value in [1.0, 2.0, 3.0] {
            dispatcher
                .send(
                    message_type::USER_PROFILE_SYNC,
                    payload("weight_kg", value),
                    Priority::Normal,
                )
                .await;
        }

        // Same logical id, single entry
        assert_eq!(dispatcher.retry_depth(), 1);
    }

    #[tokio::test]
    async fn test_low_priority_accepted_while_disconnected() {
        let (sensor, _companion) = MemoryLink::pair(8);
        let dispatcher = OutboundDispatcher::new(Arc::clone(&sensor));

        let outcome = dispatcher
            .send(
                message_type::USER_PROFILE_SYNC,
                payload("height_cm", 180.0),
                Priority::Low,
            )
            .await;

        assert_eq!(outcome, DispatchOutcome::Accepted);
        assert_eq!(sensor.durable_pending(), 1);
        assert_eq!(dispatcher.retry_depth(), 0);
    }

    #[tokio::test]
    async fn test_drain_on_reconnection() {
        let (sensor, _companion) = MemoryLink::pair(8);
        let dispatcher = OutboundDispatcher::new(Arc::clone(&sensor));

        dispatcher
            .send(
                message_type::WORKOUT_END_SIGNAL,
                serde_json::Map::new(),
                Priority::Normal,
            )
            .await;
        assert_eq!(dispatcher.retry_depth(), 1);

        // Weak reconnection: drain goes through the durable tier
        sensor.set_session_active(true);
        dispatcher.on_connection_change(ConnectionState::Weak).await;

        assert_eq!(dispatcher.retry_depth(), 0);
        assert_eq!(sensor.durable_pending(), 1);
    }

    #[tokio::test]
    async fn test_workout_complete_gets_unique_ids() {
        let (sensor, _companion) = MemoryLink::pair(8);
        sensor.set_session_active(true);
        let dispatcher = OutboundDispatcher::new(Arc::clone(&sensor));
        dispatcher.on_connection_change(ConnectionState::Weak).await;

        dispatcher
            .send(
                message_type::WORKOUT_COMPLETE,
                payload("total_calories", 300.0),
                Priority::Normal,
            )
            .await;
        dispatcher
            .send(
                message_type::WORKOUT_COMPLETE,
                payload("total_calories", 400.0),
                Priority::Normal,
            )
            .await;

        // Two distinct messages in the durable outbox
        assert_eq!(sensor.durable_pending(), 2);
    }
}
