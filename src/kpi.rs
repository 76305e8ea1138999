//! Aggregate KPIs computed from one tick's production map and environmental
//! sample. Everything here is pure: same inputs, same outputs.

use serde::{Deserialize, Serialize};

use crate::model::{EnvironmentalSample, ProductionMap};

/// Top-line indicators for one snapshot. Sums are exact; the mean and ratio
/// fields carry the rounding the dashboard expects (efficiency and risk to
/// whole numbers, growth to one decimal, productivity to two).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiRecord {
    pub total_area: f64,
    pub total_revenue: f64,
    pub total_production: f64,
    pub average_efficiency: f64,
    pub average_growth: f64,
    pub weather_risk: f64,
    pub profit_per_hectare: f64,
    pub productivity_index: f64,
}

/// Computes the KPI record for one tick.
///
/// `production` must not be empty; the scenario loader rejects crop-less
/// configurations so the controller can never get here with one. A zero
/// total area degrades the two per-hectare ratios to 0 instead of dividing.
pub fn aggregate(production: &ProductionMap, env: &EnvironmentalSample) -> KpiRecord {
    debug_assert!(!production.is_empty(), "crop set is fixed and non-empty");
    let crops: Vec<_> = production.values().collect();
    let count = crops.len() as f64;

    let total_area: f64 = crops.iter().map(|c| c.area).sum();
    let total_revenue: f64 = crops.iter().map(|c| c.estimated_revenue).sum();
    let total_production: f64 = crops.iter().map(|c| c.current_production).sum();
    let avg_efficiency = crops.iter().map(|c| c.efficiency).sum::<f64>() / count;
    let avg_growth = crops.iter().map(|c| c.growth_percentage).sum::<f64>() / count;

    let temp_risk = temperature_risk(env.temperature);
    let water = water_stress(env.rainfall, env.soil_moisture);
    let weather_risk = ((temp_risk + water) / 2.0).round();

    let (profit_per_hectare, productivity_index) = if total_area > 0.0 {
        (
            (total_revenue / total_area).round(),
            round2(total_production / total_area),
        )
    } else {
        (0.0, 0.0)
    };

    KpiRecord {
        total_area,
        total_revenue,
        total_production,
        average_efficiency: avg_efficiency.round(),
        average_growth: round1(avg_growth),
        weather_risk,
        profit_per_hectare,
        productivity_index,
    }
}

/// Risk score (0-100) for extreme temperatures. Bands are checked from the
/// most extreme inward; the first matching band wins, so e.g. 5.0 lands in
/// the 50 band, not the 80 band.
pub fn temperature_risk(temperature: f64) -> f64 {
    if temperature < 5.0 || temperature > 35.0 {
        80.0
    } else if temperature < 10.0 || temperature > 30.0 {
        50.0
    } else if temperature < 15.0 || temperature > 25.0 {
        20.0
    } else {
        0.0
    }
}

/// Risk score (0-100) combining rainfall and soil moisture into a single
/// water index, banded most-severe-first like [`temperature_risk`].
pub fn water_stress(rainfall: f64, soil_moisture: f64) -> f64 {
    let water_index = (rainfall * 2.0 + soil_moisture) / 3.0;
    if water_index < 20.0 {
        90.0
    } else if water_index < 40.0 {
        60.0
    } else if water_index < 60.0 {
        30.0
    } else {
        0.0
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CropProductionRecord;

    fn sample(temperature: f64, rainfall: f64, soil_moisture: f64) -> EnvironmentalSample {
        EnvironmentalSample {
            temperature,
            rainfall,
            soil_moisture,
            humidity: 50.0,
            wind_speed: 5.0,
            solar_radiation: 500.0,
        }
    }

    fn crop(
        name: &str,
        area: f64,
        growth: f64,
        efficiency: f64,
        production: f64,
        revenue: f64,
    ) -> CropProductionRecord {
        CropProductionRecord {
            name: name.to_string(),
            area,
            growth_percentage: growth,
            efficiency,
            current_production: production,
            estimated_revenue: revenue,
            status: "growing".to_string(),
        }
    }

    fn two_crop_map() -> ProductionMap {
        let mut map = ProductionMap::new();
        map.insert("wheat".into(), crop("Wheat", 10.0, 50.0, 80.0, 20.0, 1_000.0));
        map.insert("corn".into(), crop("Corn", 30.0, 60.0, 90.0, 40.0, 3_000.0));
        map
    }

    #[test]
    fn totals_are_exact_sums() {
        let kpis = aggregate(&two_crop_map(), &sample(20.0, 10.0, 70.0));
        assert_eq!(kpis.total_area, 40.0);
        assert_eq!(kpis.total_revenue, 4_000.0);
        assert_eq!(kpis.total_production, 60.0);
    }

    #[test]
    fn means_and_ratios_carry_expected_rounding() {
        let kpis = aggregate(&two_crop_map(), &sample(20.0, 10.0, 70.0));
        assert_eq!(kpis.average_efficiency, 85.0);
        assert_eq!(kpis.average_growth, 55.0);
        assert_eq!(kpis.profit_per_hectare, 100.0);
        assert_eq!(kpis.productivity_index, 1.5);
    }

    #[test]
    fn growth_mean_rounds_to_one_decimal() {
        let mut map = ProductionMap::new();
        map.insert("wheat".into(), crop("Wheat", 10.0, 33.33, 80.0, 1.0, 100.0));
        map.insert("corn".into(), crop("Corn", 10.0, 33.34, 80.0, 1.0, 100.0));
        let kpis = aggregate(&map, &sample(20.0, 10.0, 70.0));
        // (33.33 + 33.34) / 2 = 33.335 -> 33.3
        assert_eq!(kpis.average_growth, 33.3);
    }

    #[test]
    fn temperature_bands_resolve_most_extreme_first() {
        assert_eq!(temperature_risk(4.0), 80.0);
        assert_eq!(temperature_risk(5.0), 50.0);
        assert_eq!(temperature_risk(9.9), 50.0);
        assert_eq!(temperature_risk(10.0), 20.0);
        assert_eq!(temperature_risk(14.9), 20.0);
        assert_eq!(temperature_risk(20.0), 0.0);
        assert_eq!(temperature_risk(25.0), 0.0);
        assert_eq!(temperature_risk(25.1), 20.0);
        assert_eq!(temperature_risk(30.0), 20.0);
        assert_eq!(temperature_risk(30.1), 50.0);
        assert_eq!(temperature_risk(35.0), 50.0);
        assert_eq!(temperature_risk(36.0), 80.0);
    }

    #[test]
    fn water_stress_bands_resolve_most_severe_first() {
        // water index = (rainfall * 2 + soil moisture) / 3
        assert_eq!(water_stress(0.0, 30.0), 90.0); // index 10
        assert_eq!(water_stress(0.0, 60.0), 60.0); // index 20
        assert_eq!(water_stress(10.0, 70.0), 60.0); // index 30
        assert_eq!(water_stress(10.0, 100.0), 30.0); // index 40
        assert_eq!(water_stress(25.0, 70.0), 30.0); // index 40
        assert_eq!(water_stress(30.0, 90.0), 30.0); // index 50
        assert_eq!(water_stress(40.0, 100.0), 0.0); // index 60
    }

    #[test]
    fn weather_risk_is_rounded_mean_of_both_scores() {
        // temp 4.0 -> 80, water index 10 -> 90, mean 85
        let kpis = aggregate(&two_crop_map(), &sample(4.0, 0.0, 30.0));
        assert_eq!(kpis.weather_risk, 85.0);
    }

    #[test]
    fn zero_total_area_degrades_ratios_to_zero() {
        let mut map = ProductionMap::new();
        map.insert("fallow".into(), crop("Fallow", 0.0, 0.0, 0.0, 0.0, 0.0));
        let kpis = aggregate(&map, &sample(20.0, 10.0, 70.0));
        assert_eq!(kpis.profit_per_hectare, 0.0);
        assert_eq!(kpis.productivity_index, 0.0);
    }

    #[test]
    fn risk_scorers_are_deterministic() {
        for t in [-10.0, 0.0, 7.5, 22.0, 33.0, 40.0] {
            assert_eq!(temperature_risk(t), temperature_risk(t));
        }
        assert_eq!(water_stress(12.0, 44.0), water_stress(12.0, 44.0));
    }
}
