//! Simulated dashboard metrics.
//!
//! Geographic, performance, traffic and score figures are pure decoration:
//! they are sampled from fixed ranges on every request and never derive from
//! stored data. They sit behind [`MetricsSource`] so tests can swap in a
//! deterministic source.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::sync::Mutex;

/// Attack-origin countries and their count ranges.
pub const GEOGRAPHIC_RANGES: [(&str, RangeInclusive<u32>); 6] = [
    ("USA", 40..=50),
    ("China", 35..=45),
    ("Russia", 30..=40),
    ("Brazil", 25..=35),
    ("India", 20..=30),
    ("Germany", 15..=25),
];

/// System performance gauges (percent) and their ranges.
pub const PERFORMANCE_RANGES: [(&str, RangeInclusive<u32>); 6] = [
    ("CPU", 70..=95),
    ("Memory", 60..=85),
    ("Network", 80..=98),
    ("Disk", 55..=80),
    ("Security", 90..=99),
    ("Uptime", 95..=100),
];

/// Inbound traffic range, Mbps.
pub const INBOUND_RANGE: RangeInclusive<f64> = 20.0..=70.0;
/// Outbound traffic range, Mbps.
pub const OUTBOUND_RANGE: RangeInclusive<f64> = 10.0..=40.0;
/// Overall security score range.
pub const SECURITY_SCORE_RANGE: RangeInclusive<u32> = 88..=97;

/// Simulated network throughput.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkTraffic {
    pub inbound: f64,
    pub outbound: f64,
    pub timestamp: DateTime<Utc>,
}

/// One sample of the decorative figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticMetrics {
    pub geographic_data: BTreeMap<String, u32>,
    pub performance_data: BTreeMap<String, u32>,
    pub network_data: NetworkTraffic,
    pub security_score: u32,
}

/// Produces the decorative half of the chart payload.
pub trait MetricsSource: Send + Sync {
    fn sample(&self) -> SyntheticMetrics;
}

/// Uniform random sampling within the documented ranges.
pub struct RandomMetrics {
    rng: Mutex<StdRng>,
}

impl std::fmt::Debug for RandomMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomMetrics").finish_non_exhaustive()
    }
}

impl Default for RandomMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomMetrics {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible sequence for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl MetricsSource for RandomMetrics {
    fn sample(&self) -> SyntheticMetrics {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut draw = |ranges: &[(&str, RangeInclusive<u32>)]| -> BTreeMap<String, u32> {
            ranges
                .iter()
                .map(|(key, range)| (key.to_string(), rng.gen_range(range.clone())))
                .collect()
        };
        let geographic_data = draw(&GEOGRAPHIC_RANGES);
        let performance_data = draw(&PERFORMANCE_RANGES);

        let network_data = NetworkTraffic {
            inbound: round_tenth(rng.gen_range(INBOUND_RANGE)),
            outbound: round_tenth(rng.gen_range(OUTBOUND_RANGE)),
            timestamp: Utc::now(),
        };
        let security_score = rng.gen_range(SECURITY_SCORE_RANGE);

        SyntheticMetrics {
            geographic_data,
            performance_data,
            network_data,
            security_score,
        }
    }
}

/// Always returns the same sample. Useful where exact values matter.
#[derive(Debug, Clone)]
pub struct FixedMetrics(pub SyntheticMetrics);

impl FixedMetrics {
    /// Every figure at the lower bound of its range.
    pub fn lower_bounds() -> Self {
        let pick = |ranges: &[(&str, RangeInclusive<u32>)]| -> BTreeMap<String, u32> {
            ranges
                .iter()
                .map(|(key, range)| (key.to_string(), *range.start()))
                .collect()
        };
        Self(SyntheticMetrics {
            geographic_data: pick(&GEOGRAPHIC_RANGES),
            performance_data: pick(&PERFORMANCE_RANGES),
            network_data: NetworkTraffic {
                inbound: *INBOUND_RANGE.start(),
                outbound: *OUTBOUND_RANGE.start(),
                timestamp: Utc::now(),
            },
            security_score: *SECURITY_SCORE_RANGE.start(),
        })
    }
}

impl MetricsSource for FixedMetrics {
    fn sample(&self) -> SyntheticMetrics {
        self.0.clone()
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Check a sample against the documented ranges.
pub fn within_bounds(metrics: &SyntheticMetrics) -> bool {
    let check = |values: &BTreeMap<String, u32>, ranges: &[(&str, RangeInclusive<u32>)]| {
        values.len() == ranges.len()
            && ranges
                .iter()
                .all(|(key, range)| values.get(*key).is_some_and(|v| range.contains(v)))
    };
    check(&metrics.geographic_data, &GEOGRAPHIC_RANGES)
        && check(&metrics.performance_data, &PERFORMANCE_RANGES)
        && INBOUND_RANGE.contains(&metrics.network_data.inbound)
        && OUTBOUND_RANGE.contains(&metrics.network_data.outbound)
        && SECURITY_SCORE_RANGE.contains(&metrics.security_score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_samples_within_bounds() {
        let source = RandomMetrics::new();
        for _ in 0..1_000 {
            let sample = source.sample();
            assert!(within_bounds(&sample), "out of bounds: {sample:?}");
        }
    }

    #[test]
    fn test_network_rounded_to_one_decimal() {
        let source = RandomMetrics::seeded(7);
        for _ in 0..200 {
            let net = source.sample().network_data;
            assert!(((net.inbound * 10.0).round() - net.inbound * 10.0).abs() < 1e-9);
            assert!(((net.outbound * 10.0).round() - net.outbound * 10.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let a = RandomMetrics::seeded(42).sample();
        let b = RandomMetrics::seeded(42).sample();
        assert_eq!(a.geographic_data, b.geographic_data);
        assert_eq!(a.performance_data, b.performance_data);
        assert_eq!(a.security_score, b.security_score);
        assert_eq!(a.network_data.inbound, b.network_data.inbound);
    }

    #[test]
    fn test_fixed_metrics() {
        let source = FixedMetrics::lower_bounds();
        let sample = source.sample();
        assert!(within_bounds(&sample));
        assert_eq!(sample.performance_data["CPU"], 70);
        assert_eq!(sample.geographic_data["Germany"], 15);
        assert_eq!(sample.security_score, 88);
    }

    #[test]
    fn test_within_bounds_rejects_outliers() {
        let mut sample = FixedMetrics::lower_bounds().sample();
        sample.performance_data.insert("CPU".into(), 96);
        assert!(!within_bounds(&sample));

        let mut sample = FixedMetrics::lower_bounds().sample();
        sample.geographic_data.remove("USA");
        assert!(!within_bounds(&sample));
    }

    #[test]
    fn test_round_tenth() {
        assert_eq!(round_tenth(20.04), 20.0);
        assert_eq!(round_tenth(20.06), 20.1);
        assert_eq!(round_tenth(69.96), 70.0);
    }
}
