//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    session: SessionInfo,
    monitor: MonitorInfo,
    dispatch: DispatchInfo,
    analysis: AnalysisInfo,
    storage: StorageInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    simulation: Option<SimulationInfo>,
}

#[derive(Serialize)]
struct SessionInfo {
    frame_timeout_secs: f64,
    teardown_grace_secs: f64,
    clock_tick_ms: u64,
    max_distance_jump_m: f64,
    distance_epsilon_m: f64,
    elapsed_step_secs: f64,
}

#[derive(Serialize)]
struct MonitorInfo {
    probe_interval_secs: f64,
}

#[derive(Serialize)]
struct DispatchInfo {
    immediate_capacity: usize,
    channel_capacity: usize,
    durable_pump_interval_ms: u64,
}

#[derive(Serialize)]
struct AnalysisInfo {
    window_capacity: usize,
    report_interval_frames: u64,
}

#[derive(Serialize)]
struct StorageInfo {
    output_dir: String,
}

#[derive(Serialize)]
struct SimulationInfo {
    duration_secs: f64,
    tick_hz: f64,
    fallback_every_ticks: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    profile_sync_at_secs: Option<f64>,
    athlete: AthleteInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    dropouts: Vec<DropoutInfo>,
}

#[derive(Serialize)]
struct AthleteInfo {
    pace_sec_per_km: f64,
    heart_rate_bpm: f64,
    cadence_spm: f64,
}

#[derive(Serialize)]
struct DropoutInfo {
    start_secs: f64,
    end_secs: f64,
    kind: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let profile = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&profile, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&profile, args);
    }

    Ok(())
}

fn build_config_info(profile: &contracts::LinkProfile, args: &InfoArgs) -> ConfigInfo {
    let simulation = if args.simulation {
        Some(SimulationInfo {
            duration_secs: profile.simulation.duration_secs,
            tick_hz: profile.simulation.tick_hz,
            fallback_every_ticks: profile.simulation.fallback_every_ticks,
            profile_sync_at_secs: profile.simulation.profile_sync_at_secs,
            athlete: AthleteInfo {
                pace_sec_per_km: profile.simulation.athlete.pace_sec_per_km,
                heart_rate_bpm: profile.simulation.athlete.heart_rate_bpm,
                cadence_spm: profile.simulation.athlete.cadence_spm,
            },
            dropouts: profile
                .simulation
                .dropouts
                .iter()
                .map(|w| DropoutInfo {
                    start_secs: w.start_secs,
                    end_secs: w.end_secs,
                    kind: format!("{:?}", w.kind),
                })
                .collect(),
        })
    } else {
        None
    };

    ConfigInfo {
        version: format!("{:?}", profile.version),
        session: SessionInfo {
            frame_timeout_secs: profile.session.frame_timeout_secs,
            teardown_grace_secs: profile.session.teardown_grace_secs,
            clock_tick_ms: profile.session.clock_tick_ms,
            max_distance_jump_m: profile.session.max_distance_jump_m,
            distance_epsilon_m: profile.session.distance_epsilon_m,
            elapsed_step_secs: profile.session.elapsed_step_secs,
        },
        monitor: MonitorInfo {
            probe_interval_secs: profile.monitor.probe_interval_secs,
        },
        dispatch: DispatchInfo {
            immediate_capacity: profile.dispatch.immediate_capacity,
            channel_capacity: profile.dispatch.channel_capacity,
            durable_pump_interval_ms: profile.dispatch.durable_pump_interval_ms,
        },
        analysis: AnalysisInfo {
            window_capacity: profile.analysis.window_capacity,
            report_interval_frames: profile.analysis.report_interval_frames,
        },
        storage: StorageInfo {
            output_dir: profile.storage.output_dir.display().to_string(),
        },
        simulation,
    }
}

fn print_config_info(profile: &contracts::LinkProfile, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                 StrideLink Configuration                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("Session");
    println!("   ├─ Version: {:?}", profile.version);
    println!(
        "   ├─ Frame timeout: {}s (+{}s grace)",
        profile.session.frame_timeout_secs, profile.session.teardown_grace_secs
    );
    println!("   ├─ Clock tick: {}ms", profile.session.clock_tick_ms);
    println!(
        "   ├─ Distance jump ceiling: {}m (clamp +{}m)",
        profile.session.max_distance_jump_m, profile.session.distance_epsilon_m
    );
    println!(
        "   └─ Elapsed bump step: {}s",
        profile.session.elapsed_step_secs
    );

    println!("\nMonitor");
    println!(
        "   └─ Probe interval: {}s",
        profile.monitor.probe_interval_secs
    );

    println!("\nDispatch");
    println!(
        "   ├─ Immediate capacity: {}",
        profile.dispatch.immediate_capacity
    );
    println!(
        "   ├─ Channel capacity: {}",
        profile.dispatch.channel_capacity
    );
    println!(
        "   └─ Durable pump interval: {}ms",
        profile.dispatch.durable_pump_interval_ms
    );

    println!("\nAnalysis");
    println!(
        "   ├─ Window capacity: {} samples",
        profile.analysis.window_capacity
    );
    println!(
        "   └─ Report interval: every {} frames",
        profile.analysis.report_interval_frames
    );

    println!("\nStorage");
    println!("   └─ Output dir: {}", profile.storage.output_dir.display());

    if args.simulation {
        let sim = &profile.simulation;
        println!("\nSimulation");
        println!("   ├─ Duration: {}s at {} Hz", sim.duration_secs, sim.tick_hz);
        println!(
            "   ├─ Fallback copy: every {} ticks",
            sim.fallback_every_ticks
        );
        match sim.profile_sync_at_secs {
            Some(at) => println!("   ├─ Profile sync at: {}s", at),
            None => println!("   ├─ Profile sync: disabled"),
        }
        println!(
            "   ├─ Athlete: pace {}s/km, HR {} bpm, cadence {} spm",
            sim.athlete.pace_sec_per_km, sim.athlete.heart_rate_bpm, sim.athlete.cadence_spm
        );

        if sim.dropouts.is_empty() {
            println!("   └─ Dropouts: none");
        } else {
            println!("   └─ Dropouts ({}):", sim.dropouts.len());
            for (i, window) in sim.dropouts.iter().enumerate() {
                let prefix = if i == sim.dropouts.len() - 1 {
                    "└─"
                } else {
                    "├─"
                };
                println!(
                    "      {} {:?} from {}s to {}s",
                    prefix, window.kind, window.start_secs, window.end_secs
                );
            }
        }
    }

    println!();
}
