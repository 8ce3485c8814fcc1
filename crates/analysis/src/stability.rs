//! Pace stability classification.

use observability::RunningStats;
use serde::Serialize;

/// Minimum raw samples in the window before stability can be judged
const MIN_RAW_SAMPLES: usize = 10;
/// Minimum non-zero pace samples
const MIN_VALID_SAMPLES: usize = 5;

const CV_UNSTABLE_PCT: f64 = 15.0;
const CV_MODERATE_PCT: f64 = 10.0;

/// Stability classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StabilityClass {
    /// Not enough samples to judge
    Insufficient,
    /// CV <= 10%
    Stable,
    /// 10% < CV <= 15%
    Moderate,
    /// CV > 15%
    Unstable,
}

impl StabilityClass {
    /// Fixed advisory text per class
    pub fn advisory(self) -> &'static str {
        match self {
            StabilityClass::Insufficient => "Not enough pace data yet; keep running.",
            StabilityClass::Stable => "Pace is steady; hold this rhythm.",
            StabilityClass::Moderate => "Pace is wavering; focus on an even effort.",
            StabilityClass::Unstable => "Pace is erratic; slow down and settle into a rhythm.",
        }
    }
}

/// Pace stability report
#[derive(Debug, Clone, Serialize)]
pub struct StabilityReport {
    /// Classification
    pub class: StabilityClass,
    /// Coefficient of variation in percent (None when insufficient)
    pub cv_percent: Option<f64>,
    /// Advisory text for the display surface
    pub advisory: &'static str,
}

/// Classify pace stability from a window of pace samples (sec/km).
///
/// Zero paces (standing still / no signal) are excluded from the CV but
/// count toward the raw sample requirement.
pub fn pace_stability(paces: &[f64]) -> StabilityReport {
    let valid: Vec<f64> = paces.iter().copied().filter(|p| *p > 0.0).collect();

    if paces.len() < MIN_RAW_SAMPLES || valid.len() < MIN_VALID_SAMPLES {
        return StabilityReport {
            class: StabilityClass::Insufficient,
            cv_percent: None,
            advisory: StabilityClass::Insufficient.advisory(),
        };
    }

    let mut stats = RunningStats::default();
    for pace in &valid {
        stats.push(*pace);
    }

    let mean = stats.mean();
    let cv = if mean > 0.0 {
        stats.std_dev() / mean * 100.0
    } else {
        0.0
    };

    let class = if cv > CV_UNSTABLE_PCT {
        StabilityClass::Unstable
    } else if cv > CV_MODERATE_PCT {
        StabilityClass::Moderate
    } else {
        StabilityClass::Stable
    };

    StabilityReport {
        class,
        cv_percent: Some(cv),
        advisory: class.advisory(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_raw_samples() {
        let paces = vec![300.0; 9];
        let report = pace_stability(&paces);
        assert_eq!(report.class, StabilityClass::Insufficient);
        assert!(report.cv_percent.is_none());
    }

    #[test]
    fn test_insufficient_valid_samples() {
        // 10 raw but only 4 non-zero
        let paces = vec![300.0, 310.0, 305.0, 300.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let report = pace_stability(&paces);
        assert_eq!(report.class, StabilityClass::Insufficient);
    }

    #[test]
    fn test_minimum_sufficient_samples_produce_cv() {
        // Exactly 10 raw with exactly 5 non-zero sits on the sufficient side
        let paces = vec![300.0, 302.0, 304.0, 306.0, 308.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let report = pace_stability(&paces);
        assert!(report.cv_percent.is_some());
        assert_eq!(report.class, StabilityClass::Stable);
    }

    #[test]
    fn test_stable_pace() {
        // Nearly constant pace, CV well under 10%
        let paces: Vec<f64> = (0..12).map(|i| 300.0 + (i % 2) as f64).collect();
        let report = pace_stability(&paces);
        assert_eq!(report.class, StabilityClass::Stable);
        assert!(report.cv_percent.unwrap() < 1.0);
    }

    #[test]
    fn test_unstable_pace() {
        // Alternating 200/400 sec/km: mean 300, large spread
        let paces: Vec<f64> = (0..12)
            .map(|i| if i % 2 == 0 { 200.0 } else { 400.0 })
            .collect();
        let report = pace_stability(&paces);
        assert_eq!(report.class, StabilityClass::Unstable);
        assert!(report.cv_percent.unwrap() > 15.0);
    }

    #[test]
    fn test_moderate_pace() {
        // Spread tuned to land between 10% and 15% CV:
        // alternating 260/340 around mean 300 gives CV ~13.9%
        let paces: Vec<f64> = (0..12)
            .map(|i| if i % 2 == 0 { 260.0 } else { 340.0 })
            .collect();
        let report = pace_stability(&paces);
        assert_eq!(report.class, StabilityClass::Moderate);
        let cv = report.cv_percent.unwrap();
        assert!(cv > 10.0 && cv <= 15.0, "cv = {cv}");
    }

    #[test]
    fn test_zero_paces_excluded_from_cv() {
        let mut paces = vec![300.0; 10];
        paces.extend([0.0, 0.0]);
        let report = pace_stability(&paces);
        assert_eq!(report.class, StabilityClass::Stable);
        assert!(report.cv_percent.unwrap() < f64::EPSILON);
    }
}
