//! Optimal-cadence band detection.

use serde::Serialize;

use crate::efficiency::instantaneous_efficiency;

/// Minimum valid (pace, cadence, heart-rate) triples before bucketing
const MIN_VALID_TRIPLES: usize = 10;

/// Cadence bins are 5 spm wide
const BIN_WIDTH: f64 = 5.0;

/// Fallback band when history is too thin
const DEFAULT_BAND: (f64, f64) = (170.0, 180.0);

/// Recommended cadence band
#[derive(Debug, Clone, Serialize)]
pub struct CadenceBand {
    /// Band lower bound (spm)
    pub low: f64,
    /// Band upper bound (spm)
    pub high: f64,
    /// Raw average of the supplied cadences (0 when none)
    pub average_cadence: f64,
    /// True when the default band was used for lack of data
    pub from_default: bool,
}

/// Find the cadence band with the best mean efficiency.
///
/// Triples with pace, cadence and heart rate all positive are bucketed
/// into width-5 cadence bins; the winning bin maximizes mean efficiency,
/// lowest bin center winning ties. With fewer than 10 valid triples the
/// default band [170, 180] is returned alongside the raw cadence average.
pub fn cadence_optimization(paces: &[f64], cadences: &[f64], heart_rates: &[f64]) -> CadenceBand {
    let average_cadence = if cadences.is_empty() {
        0.0
    } else {
        cadences.iter().sum::<f64>() / cadences.len() as f64
    };

    let triples: Vec<(f64, f64)> = paces
        .iter()
        .zip(cadences.iter())
        .zip(heart_rates.iter())
        .filter(|((pace, cadence), hr)| **pace > 0.0 && **cadence > 0.0 && **hr > 0.0)
        .filter_map(|((pace, cadence), hr)| {
            instantaneous_efficiency(*pace, *hr).map(|eff| (*cadence, eff))
        })
        .collect();

    if triples.len() < MIN_VALID_TRIPLES {
        return CadenceBand {
            low: DEFAULT_BAND.0,
            high: DEFAULT_BAND.1,
            average_cadence,
            from_default: true,
        };
    }

    // bin index -> (sum efficiency, count)
    let mut bins: std::collections::BTreeMap<i64, (f64, u64)> = std::collections::BTreeMap::new();
    for (cadence, eff) in &triples {
        let bin = (cadence / BIN_WIDTH).floor() as i64;
        let entry = bins.entry(bin).or_insert((0.0, 0));
        entry.0 += eff;
        entry.1 += 1;
    }

    // BTreeMap iterates in ascending bin order, so strict > keeps the
    // lowest center on ties
    let mut best_bin = 0i64;
    let mut best_mean = f64::NEG_INFINITY;
    for (bin, (sum, count)) in &bins {
        let mean = sum / *count as f64;
        if mean > best_mean {
            best_mean = mean;
            best_bin = *bin;
        }
    }

    let center = best_bin as f64 * BIN_WIDTH + BIN_WIDTH / 2.0;
    CadenceBand {
        low: center - 5.0,
        high: center + 5.0,
        average_cadence,
        from_default: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_band_when_thin() {
        let paces = vec![300.0; 5];
        let cadences = vec![168.0; 5];
        let hrs = vec![150.0; 5];
        let band = cadence_optimization(&paces, &cadences, &hrs);
        assert!(band.from_default);
        assert_eq!(band.low, 170.0);
        assert_eq!(band.high, 180.0);
        assert!((band.average_cadence - 168.0).abs() < 1e-12);
    }

    #[test]
    fn test_best_bin_wins() {
        // 6 samples at cadence ~172 with better efficiency (lower HR),
        // 6 at cadence ~162 with worse efficiency
        let mut paces = Vec::new();
        let mut cadences = Vec::new();
        let mut hrs = Vec::new();
        for _ in 0..6 {
            paces.push(300.0);
            cadences.push(172.0);
            hrs.push(140.0);
        }
        for _ in 0..6 {
            paces.push(300.0);
            cadences.push(162.0);
            hrs.push(170.0);
        }

        let band = cadence_optimization(&paces, &cadences, &hrs);
        assert!(!band.from_default);
        // 172 falls in bin 34 -> center 172.5 -> band [167.5, 177.5]
        assert_eq!(band.low, 167.5);
        assert_eq!(band.high, 177.5);
    }

    #[test]
    fn test_tie_prefers_lower_center() {
        // Two bins with identical efficiency
        let mut paces = Vec::new();
        let mut cadences = Vec::new();
        let mut hrs = Vec::new();
        for _ in 0..6 {
            paces.push(300.0);
            cadences.push(162.0);
            hrs.push(150.0);
        }
        for _ in 0..6 {
            paces.push(300.0);
            cadences.push(172.0);
            hrs.push(150.0);
        }

        let band = cadence_optimization(&paces, &cadences, &hrs);
        assert!(!band.from_default);
        // 162 -> bin 32 -> center 162.5
        assert_eq!(band.low, 157.5);
        assert_eq!(band.high, 167.5);
    }

    #[test]
    fn test_invalid_triples_ignored() {
        // 12 raw triples but only 9 valid -> default band
        let mut paces = vec![300.0; 12];
        let cadences = vec![172.0; 12];
        let mut hrs = vec![150.0; 12];
        paces[0] = 0.0;
        hrs[1] = 0.0;
        paces[2] = 0.0;
        let band = cadence_optimization(&paces, &cadences, &hrs);
        assert!(band.from_default);
    }
}
