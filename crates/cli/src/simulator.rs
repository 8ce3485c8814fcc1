//! Deterministic workout simulator - the demo's sensor peer.
//!
//! Oscillates around the configured athlete baseline, streams realtime
//! frames at high priority, emits a normal-priority fallback copy on the
//! configured cadence, fires the one-off profile sync, and degrades the
//! transport per the scheduled dropout windows. Finishes with a
//! `workout_complete` summary.

use std::sync::Arc;
use std::time::Duration;

use contracts::{message_type, DropoutKind, Priority, SimulationPlan, TelemetryFrame};
use dispatcher::{MemoryLink, OutboundDispatcher};
use tracing::{info, instrument, warn};

/// Cap on the history arrays carried inside each frame
const HISTORY_LEN: usize = 10;

/// Counters from one simulated workout
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatorReport {
    /// Realtime frames emitted (high priority)
    pub frames_emitted: u64,
    /// Fallback copies emitted (normal priority)
    pub fallbacks_emitted: u64,
    /// Whether the profile sync was dispatched
    pub profile_synced: bool,
}

/// Scripted sensor peer over a [`MemoryLink`] endpoint
pub struct WorkoutSimulator {
    plan: SimulationPlan,
    dispatcher: Arc<OutboundDispatcher<MemoryLink>>,
    link: Arc<MemoryLink>,
}

impl WorkoutSimulator {
    pub fn new(
        plan: SimulationPlan,
        dispatcher: Arc<OutboundDispatcher<MemoryLink>>,
        link: Arc<MemoryLink>,
    ) -> Self {
        Self {
            plan,
            dispatcher,
            link,
        }
    }

    /// Run the scripted workout to completion
    #[instrument(name = "workout_simulator_run", skip(self))]
    pub async fn run(self) -> SimulatorReport {
        let tick_period = Duration::from_secs_f64(1.0 / self.plan.tick_hz);
        let total_ticks = (self.plan.duration_secs * self.plan.tick_hz).ceil() as u64;

        info!(
            duration_secs = self.plan.duration_secs,
            tick_hz = self.plan.tick_hz,
            dropouts = self.plan.dropouts.len(),
            "Workout simulation starting"
        );

        self.link.set_session_active(true);
        self.link.set_reachable(true);

        let mut report = SimulatorReport::default();
        let mut state = AthleteState::new(&self.plan);
        let mut ticker = tokio::time::interval(tick_period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        for tick in 0..total_ticks {
            ticker.tick().await;
            let t = tick as f64 / self.plan.tick_hz;

            self.apply_link_condition(t);

            let frame = state.advance(t, tick_period.as_secs_f64());
            let payload = frame_payload(&frame);

            self.dispatcher
                .send(message_type::REALTIME_DATA, payload.clone(), Priority::High)
                .await;
            report.frames_emitted += 1;

            // Occasional durable-capable copy so frames survive weak phases
            if self.plan.fallback_every_ticks > 0
                && tick % self.plan.fallback_every_ticks == self.plan.fallback_every_ticks - 1
            {
                self.dispatcher
                    .send(message_type::REALTIME_DATA_FALLBACK, payload, Priority::Normal)
                    .await;
                report.fallbacks_emitted += 1;
            }

            if let Some(at) = self.plan.profile_sync_at_secs {
                if !report.profile_synced && t >= at {
                    self.dispatcher
                        .send(
                            message_type::USER_PROFILE_SYNC,
                            profile_payload(),
                            Priority::Low,
                        )
                        .await;
                    report.profile_synced = true;
                }
            }
        }

        // Restore the link so the completion summary can get through
        self.link.set_session_active(true);
        self.link.set_reachable(true);

        let outcome = self
            .dispatcher
            .send(
                message_type::WORKOUT_COMPLETE,
                state.summary_payload(),
                Priority::Normal,
            )
            .await;
        info!(outcome = outcome.as_str(), "Workout completion dispatched");

        info!(
            frames = report.frames_emitted,
            fallbacks = report.fallbacks_emitted,
            "Workout simulation finished"
        );
        report
    }

    /// Degrade or restore the transport per the dropout schedule
    fn apply_link_condition(&self, t: f64) {
        let window = self
            .plan
            .dropouts
            .iter()
            .find(|w| t >= w.start_secs && t < w.end_secs);

        match window.map(|w| w.kind) {
            Some(DropoutKind::Weak) => {
                self.link.set_session_active(true);
                self.link.set_reachable(false);
            }
            Some(DropoutKind::Disconnected) => {
                self.link.set_session_active(false);
                self.link.set_reachable(false);
            }
            None => {
                self.link.set_session_active(true);
                self.link.set_reachable(true);
            }
        }
    }
}

/// Evolving athlete state, deterministic per tick
struct AthleteState {
    pace_base: f64,
    heart_rate_base: f64,
    cadence_base: f64,
    distance_meters: f64,
    calories_kcal: f64,
    recent_paces: Vec<f64>,
    recent_cadences: Vec<f64>,
    recent_heart_rates: Vec<f64>,
}

impl AthleteState {
    fn new(plan: &SimulationPlan) -> Self {
        Self {
            pace_base: plan.athlete.pace_sec_per_km,
            heart_rate_base: plan.athlete.heart_rate_bpm,
            cadence_base: plan.athlete.cadence_spm,
            distance_meters: 0.0,
            calories_kcal: 0.0,
            recent_paces: Vec::new(),
            recent_cadences: Vec::new(),
            recent_heart_rates: Vec::new(),
        }
    }

    /// Produce the frame for simulation time `t`
    fn advance(&mut self, t: f64, dt: f64) -> TelemetryFrame {
        let pace = self.pace_base + 12.0 * (t * 0.21).sin();
        let heart_rate = self.heart_rate_base + 6.0 * (t * 0.13).sin();
        let cadence = self.cadence_base + 3.0 * (t * 0.37).sin();

        self.distance_meters += 1000.0 / pace * dt;
        self.calories_kcal += 0.18 * dt;

        push_capped(&mut self.recent_paces, pace);
        push_capped(&mut self.recent_cadences, cadence);
        push_capped(&mut self.recent_heart_rates, heart_rate);

        TelemetryFrame {
            elapsed_time: t,
            distance_meters: self.distance_meters,
            pace_sec_per_km: pace,
            heart_rate_bpm: heart_rate,
            cadence_spm: cadence,
            calories_kcal: self.calories_kcal,
            recent_paces: self.recent_paces.clone(),
            recent_cadences: self.recent_cadences.clone(),
            recent_heart_rates: self.recent_heart_rates.clone(),
            ..Default::default()
        }
    }

    /// Completion-summary payload covering the whole workout
    fn summary_payload(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut payload = serde_json::Map::new();
        payload.insert(
            "workoutData".into(),
            serde_json::json!({
                "distance_meters": self.distance_meters,
                "recent_paces": self.recent_paces,
            }),
        );
        payload.insert("total_calories".into(), self.calories_kcal.into());
        payload.insert("isAssessment".into(), false.into());
        payload
    }
}

fn push_capped(history: &mut Vec<f64>, value: f64) {
    if history.len() == HISTORY_LEN {
        history.remove(0);
    }
    history.push(value);
}

/// Wire payload for one telemetry frame
fn frame_payload(frame: &TelemetryFrame) -> serde_json::Map<String, serde_json::Value> {
    match serde_json::to_value(frame) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => {
            warn!("Frame failed to serialize, sending empty payload");
            serde_json::Map::new()
        }
    }
}

/// Demo profile fields for the one-off sync
fn profile_payload() -> serde_json::Map<String, serde_json::Value> {
    let mut payload = serde_json::Map::new();
    payload.insert("nickname".into(), "demo-runner".into());
    payload.insert("weight_kg".into(), 70.0.into());
    payload.insert("height_cm".into(), 178.0.into());
    payload
}
