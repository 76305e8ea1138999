//! Direction-of-change derivation over the trailing window of a metric,
//! plus the projected point types the trend endpoints serve.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::kpi::KpiRecord;
use crate::model::{EnvironmentalSample, ProductionMap};

/// How many trailing samples feed a trend computation.
pub const TREND_WINDOW: usize = 3;

/// Percent-change band inside which a metric is reported as stable, so
/// small oscillations do not flip the direction arrow every tick.
pub const DEADBAND_PERCENT: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    /// Absolute percent change over the window, never negative.
    pub magnitude: f64,
    pub direction: TrendDirection,
}

impl Trend {
    pub fn stable() -> Self {
        Self {
            magnitude: 0.0,
            direction: TrendDirection::Stable,
        }
    }
}

/// Computes the trend of `metric` over the last [`TREND_WINDOW`] entries of
/// `samples`. Needs at least two defined values in that window, and a
/// non-zero first value to use as the baseline; otherwise the result is
/// stable at magnitude 0.
pub fn trend<T, F>(samples: &[T], metric: F) -> Trend
where
    F: Fn(&T) -> Option<f64>,
{
    let tail = &samples[samples.len().saturating_sub(TREND_WINDOW)..];
    let values: Vec<f64> = tail.iter().filter_map(|s| metric(s)).collect();
    if values.len() < 2 {
        return Trend::stable();
    }

    let first = values[0];
    let last = values[values.len() - 1];
    if first == 0.0 {
        return Trend::stable();
    }

    let change = (last - first) / first * 100.0;
    let direction = if change > DEADBAND_PERCENT {
        TrendDirection::Up
    } else if change < -DEADBAND_PERCENT {
        TrendDirection::Down
    } else {
        TrendDirection::Stable
    };

    Trend {
        magnitude: change.abs(),
        direction,
    }
}

/// One history entry projected to its environmental fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentalPoint {
    pub date: DateTime<Utc>,
    #[serde(flatten)]
    pub environmental: EnvironmentalSample,
}

/// One history entry projected to its production map, optionally filtered
/// down to a single crop.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionPoint {
    pub date: DateTime<Utc>,
    pub production: ProductionMap,
}

/// One history entry projected to its KPI record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiPoint {
    pub date: DateTime<Utc>,
    #[serde(flatten)]
    pub kpis: KpiRecord,
}
