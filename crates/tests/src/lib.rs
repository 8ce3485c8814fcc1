//! # Integration Tests
//!
//! End-to-end tests over the in-process link.
//!
//! Covers:
//! - Contract and configuration round trips
//! - Priority delivery laws across link conditions
//! - Full sensor-to-companion reconciliation flow

#[cfg(test)]
mod support {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_channel::Receiver;
    use consistency::{SessionRuntime, SessionSnapshot};
    use contracts::{
        ContractError, InboundMessage, ProfileStore, SessionConfig, WorkoutStore, WorkoutSummary,
    };
    use dispatcher::MemoryLink;
    use ingestion::InboundRouter;
    use observability::SessionStatsAggregator;
    use tokio::sync::watch;
    use tokio::task::JoinHandle;

    /// Workout store that records everything it is handed
    #[derive(Clone, Default)]
    pub struct RecordingStore {
        pub workouts: Arc<Mutex<Vec<WorkoutSummary>>>,
    }

    impl WorkoutStore for RecordingStore {
        fn name(&self) -> &str {
            "recording"
        }

        async fn store_workout(&mut self, summary: &WorkoutSummary) -> Result<(), ContractError> {
            self.workouts.lock().unwrap().push(summary.clone());
            Ok(())
        }
    }

    /// Profile store that records synced field maps
    #[derive(Clone, Default)]
    pub struct RecordingProfileStore {
        pub profiles: Arc<Mutex<Vec<serde_json::Map<String, serde_json::Value>>>>,
    }

    impl ProfileStore for RecordingProfileStore {
        fn name(&self) -> &str {
            "recording"
        }

        async fn apply_profile(
            &mut self,
            fields: &serde_json::Map<String, serde_json::Value>,
        ) -> Result<(), ContractError> {
            self.profiles.lock().unwrap().push(fields.clone());
            Ok(())
        }
    }

    /// The companion half of the link, fully wired
    pub struct Companion {
        pub store: RecordingStore,
        pub profile_store: RecordingProfileStore,
        pub router_metrics: Arc<ingestion::RouterMetrics>,
        pub snapshots: watch::Receiver<SessionSnapshot>,
        pub runtime_handle: JoinHandle<SessionStatsAggregator>,
        pub router_handle: JoinHandle<()>,
    }

    /// Wire router + runtime over a companion-side link endpoint
    pub fn spawn_companion(
        link: &Arc<MemoryLink>,
        config: SessionConfig,
    ) -> (Companion, Receiver<InboundMessage>) {
        let mut router = InboundRouter::new(link.inbox(), 64);
        let inbound = router.take_receiver().unwrap();
        let router_metrics = router.metrics();
        let router_handle = router.spawn();

        let store = RecordingStore::default();
        let profile_store = RecordingProfileStore::default();
        let (runtime, snapshots) = SessionRuntime::new(
            config,
            inbound.clone(),
            store.clone(),
            profile_store.clone(),
        );
        let runtime_handle = runtime.spawn();

        (
            Companion {
                store,
                profile_store,
                router_metrics,
                snapshots,
                runtime_handle,
                router_handle,
            },
            inbound,
        )
    }

    /// Short timers so timeout scenarios finish quickly
    pub fn short_session_config() -> SessionConfig {
        SessionConfig {
            frame_timeout: Duration::from_millis(80),
            teardown_grace: Duration::from_millis(50),
            clock_tick: Duration::from_millis(10),
            report_interval_frames: 5,
            ..Default::default()
        }
    }

    /// Realtime frame payload using the wire field names
    pub fn frame_payload(
        elapsed: f64,
        distance: f64,
    ) -> serde_json::Map<String, serde_json::Value> {
        let value = serde_json::json!({
            "elapsed_time": elapsed,
            "distance": distance,
            "current_pace": 300.0,
            "heart_rate": 150.0,
            "cadence": 172.0,
            "current_calories": 10.0,
        });
        match value {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    /// Wait (bounded) until the latest snapshot satisfies `predicate`
    pub async fn wait_for_snapshot(
        snapshots: &mut watch::Receiver<SessionSnapshot>,
        predicate: impl Fn(&SessionSnapshot) -> bool,
    ) -> SessionSnapshot {
        let wait = async {
            // Skip the initial value: the default snapshot predates the
            // runtime and can spuriously satisfy terminal predicates.
            // `changed` is version-tracked, so publishes between helper
            // entry and this await are still observed.
            loop {
                snapshots.changed().await.expect("snapshot channel closed");
                {
                    let snapshot = snapshots.borrow();
                    if predicate(&snapshot) {
                        return snapshot.clone();
                    }
                }
            }
        };

        tokio::time::timeout(Duration::from_secs(5), wait)
            .await
            .expect("snapshot condition not reached in time")
    }
}

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};

    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_default_profile_round_trips() {
        let profile = contracts::LinkProfile::default();
        let toml = ConfigLoader::to_toml(&profile).unwrap();
        let reloaded = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        assert_eq!(
            reloaded.session.frame_timeout_secs,
            profile.session.frame_timeout_secs
        );
        assert_eq!(
            reloaded.dispatch.immediate_capacity,
            profile.dispatch.immediate_capacity
        );
    }
}

#[cfg(test)]
mod priority_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{message_type, ConnectionState, MessageEnvelope, Priority};
    use dispatcher::{DispatchFailure, DispatchOutcome, MemoryLink, OutboundDispatcher};

    use crate::support::frame_payload;

    #[tokio::test]
    async fn test_high_while_disconnected_fails_without_queueing() {
        let (sensor, _companion) = MemoryLink::pair(8);
        let dispatcher = OutboundDispatcher::new(Arc::clone(&sensor));

        let outcome = dispatcher
            .send(
                message_type::REALTIME_DATA,
                frame_payload(1.0, 10.0),
                Priority::High,
            )
            .await;

        assert_eq!(
            outcome,
            DispatchOutcome::Failed(DispatchFailure::NotReachable)
        );
        assert_eq!(dispatcher.retry_depth(), 0);
        assert_eq!(sensor.durable_pending(), 0);
    }

    #[tokio::test]
    async fn test_low_while_disconnected_delivered_on_reconnection() {
        let (sensor, companion) = MemoryLink::pair(8);
        let dispatcher = OutboundDispatcher::new(Arc::clone(&sensor));

        // Accepted even though nothing is reachable
        let outcome = dispatcher
            .send(
                message_type::USER_PROFILE_SYNC,
                frame_payload(0.0, 0.0),
                Priority::Low,
            )
            .await;
        assert_eq!(outcome, DispatchOutcome::Accepted);
        assert_eq!(sensor.durable_pending(), 1);

        // Reconnect: the pump carries the backlog across
        let pump = sensor.spawn_pump(Duration::from_millis(5));
        sensor.set_session_active(true);
        sensor.set_reachable(true);

        let inbox = companion.inbox();
        let bytes = tokio::time::timeout(Duration::from_secs(5), inbox.recv())
            .await
            .unwrap()
            .unwrap();
        let envelope = MessageEnvelope::decode(&bytes).unwrap();
        assert_eq!(envelope.message_type, message_type::USER_PROFILE_SYNC);
        assert_eq!(sensor.durable_pending(), 0);

        pump.abort();
    }

    #[tokio::test]
    async fn test_normal_queued_then_drained_on_recovery() {
        let (sensor, _companion) = MemoryLink::pair(8);
        let dispatcher = OutboundDispatcher::new(Arc::clone(&sensor));

        let outcome = dispatcher
            .send(
                message_type::WORKOUT_END_SIGNAL,
                serde_json::Map::new(),
                Priority::Normal,
            )
            .await;
        assert_eq!(outcome, DispatchOutcome::Queued);
        assert_eq!(dispatcher.retry_depth(), 1);

        // Weak recovery: immediate is not viable, durable is
        dispatcher.on_connection_change(ConnectionState::Weak).await;
        assert_eq!(dispatcher.retry_depth(), 0);
        assert_eq!(sensor.durable_pending(), 1);
    }

    #[tokio::test]
    async fn test_retry_queue_keeps_only_latest_per_id() {
        let (sensor, _companion) = MemoryLink::pair(8);
        let dispatcher = OutboundDispatcher::new(Arc::clone(&sensor));

        for elapsed in [1.0, 2.0, 3.0] {
            dispatcher
                .send(
                    message_type::REALTIME_DATA_FALLBACK,
                    frame_payload(elapsed, elapsed * 10.0),
                    Priority::Normal,
                )
                .await;
        }

        // Three sends, one coalesced entry
        assert_eq!(dispatcher.retry_depth(), 1);

        dispatcher.on_connection_change(ConnectionState::Weak).await;
        assert_eq!(sensor.durable_pending(), 1);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{message_type, ConnectionState, Priority, SyncStatus};
    use dispatcher::{MemoryLink, OutboundDispatcher};

    use crate::support::{
        frame_payload, short_session_config, spawn_companion, wait_for_snapshot,
    };

    /// Full flow: dispatcher -> link -> router -> runtime, with a
    /// reordered stream reconciled on the companion side
    #[tokio::test]
    async fn test_reordered_stream_reconciled_end_to_end() {
        let (sensor, companion_link) = MemoryLink::pair(16);
        sensor.set_session_active(true);
        sensor.set_reachable(true);

        let dispatcher = OutboundDispatcher::new(Arc::clone(&sensor));
        dispatcher
            .on_connection_change(ConnectionState::Strong)
            .await;

        let (mut companion, _inbound) =
            spawn_companion(&companion_link, short_session_config());

        for (elapsed, distance) in [(10.0, 30.0), (8.0, 31.0), (11.0, 32.0)] {
            dispatcher
                .send(
                    message_type::REALTIME_DATA,
                    frame_payload(elapsed, distance),
                    Priority::High,
                )
                .await;
        }

        let snapshot =
            wait_for_snapshot(&mut companion.snapshots, |s| s.frame_count == 3).await;

        // Raw [10, 8, 11] displays as [10, 11, 12]
        let frame = snapshot.frame.unwrap();
        assert_eq!(frame.elapsed_time, 12.0);
        assert_eq!(snapshot.status, SyncStatus::Synchronized);

        sensor.close();
        companion_link.close();
        companion.runtime_handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_workout_complete_stores_and_tears_down() {
        let (sensor, companion_link) = MemoryLink::pair(16);
        sensor.set_session_active(true);
        sensor.set_reachable(true);

        let dispatcher = OutboundDispatcher::new(Arc::clone(&sensor));
        dispatcher
            .on_connection_change(ConnectionState::Strong)
            .await;

        let (mut companion, _inbound) =
            spawn_companion(&companion_link, short_session_config());

        dispatcher
            .send(
                message_type::REALTIME_DATA,
                frame_payload(1.0, 5.0),
                Priority::High,
            )
            .await;

        let mut payload = serde_json::Map::new();
        payload.insert("workoutData".into(), serde_json::json!({"splits": [300]}));
        payload.insert("total_calories".into(), 180.0.into());
        payload.insert("isAssessment".into(), false.into());
        dispatcher
            .send(message_type::WORKOUT_COMPLETE, payload, Priority::Normal)
            .await;

        wait_for_snapshot(&mut companion.snapshots, |s| {
            s.status == SyncStatus::Disconnected && s.frame.is_none()
        })
        .await;

        let workouts = companion.store.workouts.lock().unwrap().clone();
        assert_eq!(workouts.len(), 1);
        assert_eq!(workouts[0].total_calories, 180.0);

        sensor.close();
        companion_link.close();
        companion.runtime_handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_malformed_frames_rejected_before_the_engine() {
        let (sensor, companion_link) = MemoryLink::pair(16);
        sensor.set_session_active(true);
        sensor.set_reachable(true);

        let dispatcher = OutboundDispatcher::new(Arc::clone(&sensor));
        dispatcher
            .on_connection_change(ConnectionState::Strong)
            .await;

        let (companion, _inbound) = spawn_companion(&companion_link, short_session_config());

        // Implausible heart rate: rejected, no session starts
        let mut payload = frame_payload(1.0, 5.0);
        payload.insert("heart_rate".into(), 400.0.into());
        dispatcher
            .send(message_type::REALTIME_DATA, payload, Priority::High)
            .await;

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while companion.router_metrics.rejected_count() == 0 {
            assert!(tokio::time::Instant::now() < deadline, "rejection not counted");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(companion.router_metrics.rejected_count(), 1);
        assert_eq!(companion.snapshots.borrow().frame_count, 0);

        sensor.close();
        companion_link.close();
        companion.runtime_handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_profile_sync_reaches_collaborator() {
        let (sensor, companion_link) = MemoryLink::pair(16);
        sensor.set_session_active(true);
        sensor.set_reachable(true);

        let dispatcher = OutboundDispatcher::new(Arc::clone(&sensor));
        dispatcher
            .on_connection_change(ConnectionState::Strong)
            .await;
        let pump = sensor.spawn_pump(Duration::from_millis(5));

        let (companion, _inbound) = spawn_companion(&companion_link, short_session_config());

        let mut fields = serde_json::Map::new();
        fields.insert("weight_kg".into(), 71.0.into());
        dispatcher
            .send(message_type::USER_PROFILE_SYNC, fields, Priority::Low)
            .await;

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            if !companion.profile_store.profiles.lock().unwrap().is_empty() {
                break;
            }
            assert!(tokio::time::Instant::now() < deadline, "profile never applied");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let profiles = companion.profile_store.profiles.lock().unwrap().clone();
        assert_eq!(profiles[0]["weight_kg"], 71.0);

        pump.abort();
        sensor.close();
        companion_link.close();
        companion.runtime_handle.await.unwrap();
    }

    /// A weak phase drops high-priority frames, but the fallback copies
    /// cross on the durable tier and re-establish the stream
    #[tokio::test]
    async fn test_fallback_copies_survive_weak_phase() {
        let (sensor, companion_link) = MemoryLink::pair(16);
        sensor.set_session_active(true);
        sensor.set_reachable(true);

        let dispatcher = OutboundDispatcher::new(Arc::clone(&sensor));
        dispatcher
            .on_connection_change(ConnectionState::Strong)
            .await;
        let pump = sensor.spawn_pump(Duration::from_millis(5));

        let (mut companion, _inbound) =
            spawn_companion(&companion_link, short_session_config());

        dispatcher
            .send(
                message_type::REALTIME_DATA,
                frame_payload(1.0, 10.0),
                Priority::High,
            )
            .await;
        wait_for_snapshot(&mut companion.snapshots, |s| s.frame_count == 1).await;

        // Weak phase: high fails, the fallback copy goes durable
        sensor.set_reachable(false);
        dispatcher.on_connection_change(ConnectionState::Weak).await;

        dispatcher
            .send(
                message_type::REALTIME_DATA,
                frame_payload(2.0, 20.0),
                Priority::High,
            )
            .await;
        dispatcher
            .send(
                message_type::REALTIME_DATA_FALLBACK,
                frame_payload(2.0, 20.0),
                Priority::Normal,
            )
            .await;
        assert!(sensor.durable_pending() >= 1);

        // Recovery: the pump delivers the fallback, the engine accepts it
        sensor.set_reachable(true);
        dispatcher
            .on_connection_change(ConnectionState::Strong)
            .await;

        let snapshot =
            wait_for_snapshot(&mut companion.snapshots, |s| s.frame_count >= 2).await;
        let frame = snapshot.frame.unwrap();
        assert!(frame.elapsed_time >= 2.0);
        assert!(frame.distance_meters >= 20.0);

        pump.abort();
        sensor.close();
        companion_link.close();
        companion.runtime_handle.await.unwrap();
    }
}
