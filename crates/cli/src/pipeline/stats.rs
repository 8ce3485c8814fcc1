//! Demo link statistics.

use std::time::Duration;

use dispatcher::MetricsSnapshot as DispatchSnapshot;
use ingestion::MetricsSnapshot as RouterSnapshot;
use observability::SessionSummary;

use crate::simulator::SimulatorReport;

/// Statistics from one demo link run
#[derive(Debug, Clone)]
pub struct LinkStats {
    /// Sensor-peer simulator counters
    pub simulator: SimulatorReport,

    /// Outbound dispatcher counters
    pub dispatch: DispatchSnapshot,

    /// Companion-side inbound router counters
    pub router: RouterSnapshot,

    /// Companion-side session summary
    pub session: SessionSummary,

    /// Total duration of the run
    pub duration: Duration,
}

impl LinkStats {
    /// Share of emitted frames that made it through to acceptance
    pub fn delivery_rate(&self) -> f64 {
        if self.simulator.frames_emitted > 0 {
            self.session.total_frames as f64 / self.simulator.frames_emitted as f64 * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                     Link Statistics                          ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("Sensor peer");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Frames emitted: {}", self.simulator.frames_emitted);
        println!("   ├─ Fallback copies: {}", self.simulator.fallbacks_emitted);
        println!("   └─ Profile synced: {}", self.simulator.profile_synced);

        println!("\nDispatcher");
        println!("   ├─ Accepted: {}", self.dispatch.accepted_count);
        println!("   ├─ Queued: {}", self.dispatch.queued_count);
        println!("   ├─ Failed: {}", self.dispatch.failed_count);
        println!("   ├─ Immediate sent: {}", self.dispatch.immediate_sent);
        println!(
            "   ├─ Immediate failures: {}",
            self.dispatch.immediate_failures
        );
        println!("   ├─ Durable enqueued: {}", self.dispatch.durable_enqueued);
        println!("   ├─ Retry drains: {}", self.dispatch.drain_count);
        println!("   └─ Retry depth at end: {}", self.dispatch.retry_depth);

        println!("\nCompanion peer");
        println!("   ├─ Envelopes received: {}", self.router.received_count);
        println!("   ├─ Envelopes routed: {}", self.router.routed_count);
        println!("   ├─ Envelopes rejected: {}", self.router.rejected_count);
        println!("   └─ Delivery rate: {:.1}%", self.delivery_rate());

        println!("\n{}", self.session);
    }
}
