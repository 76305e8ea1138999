use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::kpi::KpiRecord;

/// One environmental reading. Immutable once produced; the engine only
/// inspects temperature, rainfall and soil moisture, the remaining fields
/// ride along for the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentalSample {
    /// Air temperature in degrees Celsius.
    pub temperature: f64,
    /// Rainfall in millimetres, never negative.
    pub rainfall: f64,
    /// Soil moisture as a percentage, 0-100.
    pub soil_moisture: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub solar_radiation: f64,
}

/// Per-crop production figures for a single tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropProductionRecord {
    pub name: String,
    /// Cultivated area in hectares, always positive.
    pub area: f64,
    /// Progress through the current growth cycle, 0-100. Non-decreasing
    /// across ticks until the generator wraps it into a new cycle.
    pub growth_percentage: f64,
    /// Production efficiency, 0-100.
    pub efficiency: f64,
    /// Estimated standing production in tonnes.
    pub current_production: f64,
    /// Estimated revenue in currency units.
    pub estimated_revenue: f64,
    /// Descriptive label for the dashboard ("growing", "stressed", ...).
    pub status: String,
}

/// Production keyed by crop identifier. The crop set is fixed for a
/// simulation run: every tick carries a record for every crop.
pub type ProductionMap = BTreeMap<String, CropProductionRecord>;

/// An immutable bundle of environmental, production and KPI data for one
/// point in time. Ids are process-local and strictly increasing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub environmental: EnvironmentalSample,
    pub production: ProductionMap,
    pub kpis: KpiRecord,
}

/// Last-known growth percentage per crop, carried across ticks so the
/// generator can produce continuous progressions. Owned and mutated only by
/// the controller; never handed out to readers.
#[derive(Debug, Clone, Default)]
pub struct GrowthState {
    growth: BTreeMap<String, f64>,
}

impl GrowthState {
    pub fn get(&self, crop: &str) -> Option<f64> {
        self.growth.get(crop).copied()
    }

    /// Replaces the carried values with the growth reported by `production`.
    pub fn absorb(&mut self, production: &ProductionMap) {
        for (crop, record) in production {
            self.growth.insert(crop.clone(), record.growth_percentage);
        }
    }

    pub fn clear(&mut self) {
        self.growth.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.growth.is_empty()
    }
}
