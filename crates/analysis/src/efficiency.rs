//! Running-efficiency computation and trend fitting.

use serde::Serialize;

/// Minimum valid (pace, heart-rate) pairs before a trend is reported
const MIN_VALID_PAIRS: usize = 5;

const MEAN_LOW: f64 = 0.05;
const MEAN_HIGH: f64 = 0.08;

/// Advisory derived from the mean efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EfficiencyAdvice {
    /// Mean < 0.05
    BuildAerobicBase,
    /// 0.05 <= mean <= 0.08
    Maintain,
    /// Mean > 0.08
    ExtendDistance,
}

impl EfficiencyAdvice {
    /// Fixed advisory text
    pub fn advisory(self) -> &'static str {
        match self {
            EfficiencyAdvice::BuildAerobicBase => {
                "Efficiency is low; build your aerobic base with easy runs."
            }
            EfficiencyAdvice::Maintain => "Efficiency is on track; maintain current training.",
            EfficiencyAdvice::ExtendDistance => {
                "Efficiency is high; you can extend your distance."
            }
        }
    }

    fn from_mean(mean: f64) -> Self {
        if mean < MEAN_LOW {
            EfficiencyAdvice::BuildAerobicBase
        } else if mean > MEAN_HIGH {
            EfficiencyAdvice::ExtendDistance
        } else {
            EfficiencyAdvice::Maintain
        }
    }
}

/// Efficiency trend report
#[derive(Debug, Clone, Serialize)]
pub struct EfficiencyTrend {
    /// Mean efficiency over the valid pairs
    pub mean: f64,
    /// OLS slope over the valid-sequence index
    pub slope: f64,
    /// Advisory class
    pub advice: EfficiencyAdvice,
}

/// Instantaneous running efficiency: speed (km/h) per heart beat.
///
/// Returns None unless both pace and heart rate are positive.
pub fn instantaneous_efficiency(pace_sec_per_km: f64, heart_rate_bpm: f64) -> Option<f64> {
    if pace_sec_per_km > 0.0 && heart_rate_bpm > 0.0 {
        Some((3600.0 / pace_sec_per_km) / heart_rate_bpm)
    } else {
        None
    }
}

/// Fit an efficiency trend over index-aligned pace and heart-rate windows.
///
/// Pairs where either value is non-positive are skipped; the OLS fit runs
/// over the valid-sequence index, not the window index. Returns None when
/// fewer than 5 valid pairs exist.
pub fn efficiency_trend(paces: &[f64], heart_rates: &[f64]) -> Option<EfficiencyTrend> {
    let series: Vec<f64> = paces
        .iter()
        .zip(heart_rates.iter())
        .filter_map(|(pace, hr)| instantaneous_efficiency(*pace, *hr))
        .collect();

    if series.len() < MIN_VALID_PAIRS {
        return None;
    }

    let n = series.len() as f64;
    let mean_y = series.iter().sum::<f64>() / n;
    let mean_x = (n - 1.0) / 2.0;

    let mut num = 0.0;
    let mut den = 0.0;
    for (i, y) in series.iter().enumerate() {
        let dx = i as f64 - mean_x;
        num += dx * (y - mean_y);
        den += dx * dx;
    }
    let slope = if den > 0.0 { num / den } else { 0.0 };

    Some(EfficiencyTrend {
        mean: mean_y,
        slope,
        advice: EfficiencyAdvice::from_mean(mean_y),
    })
}
