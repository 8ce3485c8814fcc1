//! Configuration validation
//!
//! Rules:
//! - all timeouts and intervals > 0
//! - teardown grace >= 0
//! - correction thresholds > 0
//! - channel capacities > 0
//! - analysis window large enough for stability checks
//! - simulation dropout windows well-formed and within the run

use contracts::{ContractError, LinkProfile};

/// Validate a LinkProfile
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(profile: &LinkProfile) -> Result<(), ContractError> {
    validate_session(profile)?;
    validate_monitor(profile)?;
    validate_dispatch(profile)?;
    validate_analysis(profile)?;
    validate_simulation(profile)?;
    Ok(())
}

fn validate_session(profile: &LinkProfile) -> Result<(), ContractError> {
    let session = &profile.session;

    if session.frame_timeout_secs <= 0.0 {
        return Err(ContractError::config_validation(
            "session.frame_timeout_secs",
            format!("must be > 0, got {}", session.frame_timeout_secs),
        ));
    }
    if session.teardown_grace_secs < 0.0 {
        return Err(ContractError::config_validation(
            "session.teardown_grace_secs",
            format!("must be >= 0, got {}", session.teardown_grace_secs),
        ));
    }
    if session.clock_tick_ms == 0 {
        return Err(ContractError::config_validation(
            "session.clock_tick_ms",
            "must be > 0",
        ));
    }
    if session.max_distance_jump_m <= 0.0 {
        return Err(ContractError::config_validation(
            "session.max_distance_jump_m",
            format!("must be > 0, got {}", session.max_distance_jump_m),
        ));
    }
    if session.distance_epsilon_m <= 0.0 {
        return Err(ContractError::config_validation(
            "session.distance_epsilon_m",
            format!("must be > 0, got {}", session.distance_epsilon_m),
        ));
    }
    if session.distance_epsilon_m > session.max_distance_jump_m {
        return Err(ContractError::config_validation(
            "session.distance_epsilon_m",
            format!(
                "clamp step ({}) must be <= max_distance_jump_m ({})",
                session.distance_epsilon_m, session.max_distance_jump_m
            ),
        ));
    }
    if session.elapsed_step_secs <= 0.0 {
        return Err(ContractError::config_validation(
            "session.elapsed_step_secs",
            format!("must be > 0, got {}", session.elapsed_step_secs),
        ));
    }

    Ok(())
}

fn validate_monitor(profile: &LinkProfile) -> Result<(), ContractError> {
    if profile.monitor.probe_interval_secs <= 0.0 {
        return Err(ContractError::config_validation(
            "monitor.probe_interval_secs",
            format!("must be > 0, got {}", profile.monitor.probe_interval_secs),
        ));
    }
    Ok(())
}

fn validate_dispatch(profile: &LinkProfile) -> Result<(), ContractError> {
    let dispatch = &profile.dispatch;

    if dispatch.immediate_capacity == 0 {
        return Err(ContractError::config_validation(
            "dispatch.immediate_capacity",
            "must be > 0",
        ));
    }
    if dispatch.channel_capacity == 0 {
        return Err(ContractError::config_validation(
            "dispatch.channel_capacity",
            "must be > 0",
        ));
    }
    if dispatch.durable_pump_interval_ms == 0 {
        return Err(ContractError::config_validation(
            "dispatch.durable_pump_interval_ms",
            "must be > 0",
        ));
    }
    Ok(())
}

fn validate_analysis(profile: &LinkProfile) -> Result<(), ContractError> {
    let analysis = &profile.analysis;

    // Stability analysis needs at least 10 raw samples in the window
    if analysis.window_capacity < 10 {
        return Err(ContractError::config_validation(
            "analysis.window_capacity",
            format!("must be >= 10, got {}", analysis.window_capacity),
        ));
    }
    if analysis.report_interval_frames == 0 {
        return Err(ContractError::config_validation(
            "analysis.report_interval_frames",
            "must be > 0",
        ));
    }
    Ok(())
}

fn validate_simulation(profile: &LinkProfile) -> Result<(), ContractError> {
    let sim = &profile.simulation;

    if sim.duration_secs <= 0.0 {
        return Err(ContractError::config_validation(
            "simulation.duration_secs",
            format!("must be > 0, got {}", sim.duration_secs),
        ));
    }
    if sim.tick_hz <= 0.0 {
        return Err(ContractError::config_validation(
            "simulation.tick_hz",
            format!("must be > 0, got {}", sim.tick_hz),
        ));
    }

    for (idx, window) in sim.dropouts.iter().enumerate() {
        if window.start_secs >= window.end_secs {
            return Err(ContractError::config_validation(
                format!("simulation.dropouts[{idx}]"),
                format!(
                    "start_secs ({}) must be < end_secs ({})",
                    window.start_secs, window.end_secs
                ),
            ));
        }
        if window.end_secs > sim.duration_secs {
            return Err(ContractError::config_validation(
                format!("simulation.dropouts[{idx}].end_secs"),
                format!(
                    "window ends at {} but the run lasts {}",
                    window.end_secs, sim.duration_secs
                ),
            ));
        }
    }

    Ok(())
}
