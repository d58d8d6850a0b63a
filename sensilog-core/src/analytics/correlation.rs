//! Pearson correlation between configuration parameters and performance
//!
//! Each configuration period contributes one `(parameter, metric)` pair.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use super::metrics::PerformanceMetrics;

/// Outcome of a correlation computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Correlation {
    /// Coefficient in `[-1, 1]`
    Value(f64),
    /// Fewer than two paired observations
    InsufficientData,
}

impl Correlation {
    pub fn value(&self) -> Option<f64> {
        match self {
            Correlation::Value(r) => Some(*r),
            Correlation::InsufficientData => None,
        }
    }
}

// Serialized as the coefficient, or null when not computable.
impl Serialize for Correlation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value().serialize(serializer)
    }
}

/// Pearson product-moment correlation of paired samples.
///
/// A zero (or cancelled-to-negative) variance product yields `Value(0.0)`.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Correlation {
    if xs.len() != ys.len() || xs.len() < 2 {
        return Correlation::InsufficientData;
    }

    // Constant series: rounding in the sums below can leave a tiny
    // non-zero variance, so catch them exactly first.
    if is_constant(xs) || is_constant(ys) {
        return Correlation::Value(0.0);
    }

    let n = xs.len() as f64;
    let (mut sx, mut sy, mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for (&x, &y) in xs.iter().zip(ys) {
        sx += x;
        sy += y;
        sxy += x * y;
        sxx += x * x;
        syy += y * y;
    }

    let numerator = n * sxy - sx * sy;
    let variance_product = (n * sxx - sx * sx) * (n * syy - sy * sy);

    if !(variance_product > 0.0) {
        return Correlation::Value(0.0);
    }

    let r = numerator / variance_product.sqrt();
    if r.is_finite() {
        Correlation::Value(r.clamp(-1.0, 1.0))
    } else {
        Correlation::Value(0.0)
    }
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

/// Correlate paired `(parameter, metric)` observations.
pub fn correlate(pairs: &[(f64, f64)]) -> Correlation {
    let (xs, ys): (Vec<f64>, Vec<f64>) = pairs.iter().copied().unzip();
    pearson(&xs, &ys)
}

/// Configuration parameters tracked against performance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigParameter {
    Sensitivity,
    Dpi,
    Edpi,
}

impl ConfigParameter {
    pub const ALL: [ConfigParameter; 3] = [
        ConfigParameter::Sensitivity,
        ConfigParameter::Dpi,
        ConfigParameter::Edpi,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ConfigParameter::Sensitivity => "sensitivity",
            ConfigParameter::Dpi => "dpi",
            ConfigParameter::Edpi => "edpi",
        }
    }

    pub fn value(&self, sensitivity: f64, dpi: u32) -> f64 {
        match self {
            ConfigParameter::Sensitivity => sensitivity,
            ConfigParameter::Dpi => f64::from(dpi),
            ConfigParameter::Edpi => sensitivity * f64::from(dpi),
        }
    }
}

/// Performance metrics tracked against configuration parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceMetric {
    KdRatio,
    HeadshotPercentage,
    WinRate,
    CombatScore,
}

impl PerformanceMetric {
    pub const ALL: [PerformanceMetric; 4] = [
        PerformanceMetric::KdRatio,
        PerformanceMetric::HeadshotPercentage,
        PerformanceMetric::WinRate,
        PerformanceMetric::CombatScore,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PerformanceMetric::KdRatio => "kd_ratio",
            PerformanceMetric::HeadshotPercentage => "headshot_percentage",
            PerformanceMetric::WinRate => "win_rate",
            PerformanceMetric::CombatScore => "combat_score",
        }
    }

    pub fn value(&self, metrics: &PerformanceMetrics) -> f64 {
        match self {
            PerformanceMetric::KdRatio => metrics.avg_kd_ratio,
            PerformanceMetric::HeadshotPercentage => metrics.avg_headshot_percentage,
            PerformanceMetric::WinRate => metrics.win_rate,
            PerformanceMetric::CombatScore => metrics.avg_combat_score,
        }
    }
}

/// Coefficients keyed `"<parameter>_vs_<metric>"`, e.g. `sensitivity_vs_kd_ratio`.
pub type CorrelationMap = BTreeMap<String, Correlation>;

/// One observation per configuration period.
#[derive(Debug, Clone, Copy)]
pub struct PeriodObservation {
    pub sensitivity: f64,
    pub dpi: u32,
    pub performance: PerformanceMetrics,
}

/// Correlate every tracked parameter against every tracked metric.
///
/// Returns `None` with fewer than two observations.
pub fn correlation_map(observations: &[PeriodObservation]) -> Option<CorrelationMap> {
    if observations.len() < 2 {
        return None;
    }

    let mut map = CorrelationMap::new();
    for parameter in ConfigParameter::ALL {
        for metric in PerformanceMetric::ALL {
            let pairs: Vec<(f64, f64)> = observations
                .iter()
                .map(|o| {
                    (
                        parameter.value(o.sensitivity, o.dpi),
                        metric.value(&o.performance),
                    )
                })
                .collect();
            map.insert(
                format!("{}_vs_{}", parameter.name(), metric.name()),
                correlate(&pairs),
            );
        }
    }
    Some(map)
}
