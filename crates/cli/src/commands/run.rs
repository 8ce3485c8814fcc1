//! `run` command implementation.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_link(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    // Validate config path
    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    // Load and parse configuration
    let profile = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    info!(
        duration_secs = profile.simulation.duration_secs,
        tick_hz = profile.simulation.tick_hz,
        dropouts = profile.simulation.dropouts.len(),
        output_dir = %profile.storage.output_dir.display(),
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&profile);
        return Ok(());
    }

    // Build pipeline configuration
    let pipeline_config = PipelineConfig {
        profile,
        duration_override: if args.duration == 0.0 {
            None
        } else {
            Some(args.duration)
        },
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    // Create and run pipeline
    let pipeline = Pipeline::new(pipeline_config);

    // Setup graceful shutdown handler
    let shutdown_signal = setup_shutdown_signal();

    info!("Starting link...");

    // Run pipeline with shutdown signal
    tokio::select! {
        result = pipeline.run() => {
            match result {
                Ok(stats) => {
                    info!(
                        frames_emitted = stats.simulator.frames_emitted,
                        frames_accepted = stats.session.total_frames,
                        duration_secs = stats.duration.as_secs_f64(),
                        delivery_rate = format!("{:.1}%", stats.delivery_rate()),
                        "Link completed successfully"
                    );

                    // Print detailed statistics
                    stats.print_summary();
                }
                Err(e) => {
                    return Err(e).context("Link execution failed");
                }
            }
        }
        _ = shutdown_signal => {
            warn!("Received shutdown signal, stopping link...");
        }
    }

    info!("StrideLink finished");
    Ok(())
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(profile: &contracts::LinkProfile) {
    println!("\n=== Configuration Summary ===\n");
    println!("Session:");
    println!("  Frame timeout: {}s", profile.session.frame_timeout_secs);
    println!("  Teardown grace: {}s", profile.session.teardown_grace_secs);
    println!("  Clock tick: {}ms", profile.session.clock_tick_ms);
    println!(
        "\nDispatch: immediate capacity {}, channel capacity {}",
        profile.dispatch.immediate_capacity, profile.dispatch.channel_capacity
    );
    println!(
        "\nAnalysis: window {} samples, report every {} frames",
        profile.analysis.window_capacity, profile.analysis.report_interval_frames
    );
    println!(
        "\nSimulation: {}s at {} Hz, fallback every {} ticks",
        profile.simulation.duration_secs,
        profile.simulation.tick_hz,
        profile.simulation.fallback_every_ticks
    );

    if !profile.simulation.dropouts.is_empty() {
        println!("\nDropout windows ({}):", profile.simulation.dropouts.len());
        for window in &profile.simulation.dropouts {
            println!(
                "  - {:?} from {}s to {}s",
                window.kind, window.start_secs, window.end_secs
            );
        }
    }

    println!("\nStorage: {}", profile.storage.output_dir.display());
    println!();
}
