//! Overtraining-risk scoring over per-workout efficiency history.

use serde::Serialize;

/// How many recent workouts feed the score
const HISTORY_WINDOW: usize = 5;
/// Minimum workouts before a real score is produced
const MIN_WORKOUTS: usize = 3;

const SCORE_HIGH: f64 = 0.7;
const SCORE_MEDIUM: f64 = 0.4;

/// Risk level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Score < 0.4, or insufficient history
    Low,
    /// 0.4 <= score < 0.7
    Medium,
    /// Score >= 0.7
    High,
}

impl RiskLevel {
    /// Fixed advisory text per level
    pub fn advisory(self) -> &'static str {
        match self {
            RiskLevel::Low => "Recovery looks fine; train as planned.",
            RiskLevel::Medium => "Efficiency is declining; reduce intensity this week.",
            RiskLevel::High => "Sustained efficiency decline; take a full rest day.",
        }
    }
}

/// Overtraining risk report
#[derive(Debug, Clone, Serialize)]
pub struct RiskReport {
    /// Risk level
    pub level: RiskLevel,
    /// Fraction of adjacent declines in the recent history
    pub score: f64,
    /// True when fewer than 3 workouts were available
    pub insufficient_history: bool,
    /// Advisory text for the display surface
    pub advisory: &'static str,
}

/// Score overtraining risk from per-workout mean efficiencies,
/// oldest first. Only the last 5 entries are considered.
pub fn overtraining_risk(workout_efficiencies: &[f64]) -> RiskReport {
    let recent = if workout_efficiencies.len() > HISTORY_WINDOW {
        &workout_efficiencies[workout_efficiencies.len() - HISTORY_WINDOW..]
    } else {
        workout_efficiencies
    };

    if recent.len() < MIN_WORKOUTS {
        return RiskReport {
            level: RiskLevel::Low,
            score: 0.0,
            insufficient_history: true,
            advisory: "Not enough workout history yet; keep logging runs.",
        };
    }

    let declines = recent.windows(2).filter(|w| w[1] < w[0]).count();
    let score = declines as f64 / (recent.len() - 1) as f64;

    let level = if score >= SCORE_HIGH {
        RiskLevel::High
    } else if score >= SCORE_MEDIUM {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    RiskReport {
        level,
        score,
        insufficient_history: false,
        advisory: level.advisory(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_history() {
        let report = overtraining_risk(&[0.08, 0.07]);
        assert_eq!(report.level, RiskLevel::Low);
        assert!(report.insufficient_history);
        assert_eq!(report.score, 0.0);
    }

    #[test]
    fn test_steady_improvement_low_risk() {
        let report = overtraining_risk(&[0.06, 0.065, 0.07, 0.075]);
        assert_eq!(report.level, RiskLevel::Low);
        assert!(!report.insufficient_history);
        assert_eq!(report.score, 0.0);
    }

    #[test]
    fn test_all_declines_high_risk() {
        let report = overtraining_risk(&[0.08, 0.075, 0.07, 0.065]);
        assert_eq!(report.level, RiskLevel::High);
        assert_eq!(report.score, 1.0);
    }

    #[test]
    fn test_half_declines_medium_risk() {
        // 2 declines over 4 intervals = 0.5
        let report = overtraining_risk(&[0.08, 0.07, 0.075, 0.07, 0.075]);
        assert_eq!(report.level, RiskLevel::Medium);
        assert!((report.score - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_only_last_five_considered() {
        // Old declines fall outside the window; recent history improves
        let history = [0.09, 0.08, 0.07, 0.06, 0.061, 0.062, 0.063, 0.064];
        let report = overtraining_risk(&history);
        assert_eq!(report.level, RiskLevel::Low);
        assert_eq!(report.score, 0.0);
    }

    #[test]
    fn test_high_boundary() {
        // 3 declines over 4 intervals = 0.75 -> High
        let report = overtraining_risk(&[0.08, 0.07, 0.06, 0.05, 0.055]);
        assert_eq!(report.level, RiskLevel::High);
    }
}
