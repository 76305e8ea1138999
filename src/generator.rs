//! The data generator contract and its default implementation.
//!
//! The engine only depends on the [`Generator`] trait: one environmental
//! sample per tick, one production map derived from the previous growth
//! state, and a bulk historical bootstrap. [`FieldSampler`] is the shipped
//! implementation, a seeded synthetic sampler with seasonal drift.

use anyhow::Result;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::model::{CropProductionRecord, EnvironmentalSample, GrowthState, ProductionMap};
use crate::scenario::{CropSpec, Scenario};

/// One synthetic day produced by the historical bootstrap.
#[derive(Debug, Clone)]
pub struct HistoricalDay {
    pub date: DateTime<Utc>,
    pub environmental: EnvironmentalSample,
    pub production: ProductionMap,
}

/// Produces the raw telemetry the controller aggregates. Implementations
/// must keep each crop's growth a function of its previous value (threaded
/// in through `prior_growth`), return a record for every crop in the fixed
/// crop set, and hold no state shared between instances.
pub trait Generator: Send {
    fn environmental_sample(&mut self) -> Result<EnvironmentalSample>;

    /// Missing entries in `prior_growth` are treated as start-of-cycle.
    fn production_sample(
        &mut self,
        env: &EnvironmentalSample,
        prior_growth: &GrowthState,
    ) -> Result<ProductionMap>;

    /// Bulk-produces `days` synthetic days with increasing timestamps and
    /// the same growth continuity as `days` sequential ticks.
    fn historical_days(&mut self, days: usize) -> Result<Vec<HistoricalDay>>;
}

/// Default seeded generator. A day counter drives a yearly sinusoid for the
/// environmental fields; growth advances per crop at a rate damped by
/// temperature and water stress, wrapping into a new cycle past 100%.
pub struct FieldSampler {
    crops: Vec<CropSpec>,
    rng: ChaCha8Rng,
    day: u64,
}

impl FieldSampler {
    pub fn from_scenario(scenario: &Scenario) -> Self {
        Self {
            crops: scenario.crops.clone(),
            rng: ChaCha8Rng::seed_from_u64(scenario.seed),
            day: 0,
        }
    }

    fn season_phase(&self) -> f64 {
        (self.day as f64 / 365.0) * std::f64::consts::TAU
    }

    fn crop_record(
        crop: &CropSpec,
        rng: &mut ChaCha8Rng,
        env: &EnvironmentalSample,
        prior: Option<f64>,
    ) -> CropProductionRecord {
        let temp_stress =
            ((env.temperature - crop.optimal_temperature).abs() / 15.0).min(1.0);
        let water_index = (env.rainfall * 2.0 + env.soil_moisture) / 3.0;
        let water_stress = if water_index < crop.water_need_index {
            (crop.water_need_index - water_index) / crop.water_need_index
        } else {
            0.0
        };
        let stress = (temp_stress * 0.6 + water_stress * 0.4).clamp(0.0, 1.0);

        let daily_gain = 100.0 / crop.growth_cycle_days
            * (1.0 - 0.7 * stress)
            * rng.gen_range(0.8..1.2);
        let mut growth = prior.unwrap_or_else(|| rng.gen_range(0.0..8.0)) + daily_gain;
        if growth >= 100.0 {
            // Harvest: the next cycle starts just past zero.
            growth = rng.gen_range(0.0..3.0);
        }

        let efficiency = (92.0 - 55.0 * stress + rng.gen_range(-6.0..6.0)).clamp(20.0, 100.0);
        let current_production = crop.area_hectares
            * crop.base_yield_tonnes_per_hectare
            * (growth / 100.0)
            * (efficiency / 100.0);
        let estimated_revenue = current_production * crop.price_per_tonne;

        let status = if stress > 0.6 {
            "stressed"
        } else if growth < 15.0 {
            "sprouting"
        } else if growth < 55.0 {
            "growing"
        } else if growth < 85.0 {
            "ripening"
        } else {
            "harvest-ready"
        };

        CropProductionRecord {
            name: crop.name.clone(),
            area: crop.area_hectares,
            growth_percentage: growth,
            efficiency,
            current_production,
            estimated_revenue,
            status: status.to_string(),
        }
    }
}

impl Generator for FieldSampler {
    fn environmental_sample(&mut self) -> Result<EnvironmentalSample> {
        let phase = self.season_phase();
        self.day += 1;

        let temperature = 16.0 + 11.0 * phase.sin() + self.rng.gen_range(-3.0..3.0);
        let rainfall = (3.5 + 3.0 * (phase + 1.1).sin() + self.rng.gen_range(-4.0..6.0)).max(0.0);
        let soil_moisture =
            (45.0 + 18.0 * (phase + 0.6).sin() + self.rng.gen_range(-10.0..10.0)).clamp(0.0, 100.0);
        let humidity =
            (60.0 + 15.0 * (phase + 0.9).sin() + self.rng.gen_range(-8.0..8.0)).clamp(10.0, 100.0);
        let wind_speed = (6.0f64 + self.rng.gen_range(-4.0..8.0)).max(0.0);
        let solar_radiation =
            (520.0 + 260.0 * phase.sin() + self.rng.gen_range(-60.0..60.0)).max(0.0);

        Ok(EnvironmentalSample {
            temperature,
            rainfall,
            soil_moisture,
            humidity,
            wind_speed,
            solar_radiation,
        })
    }

    fn production_sample(
        &mut self,
        env: &EnvironmentalSample,
        prior_growth: &GrowthState,
    ) -> Result<ProductionMap> {
        let mut production = ProductionMap::new();
        for crop in &self.crops {
            let prior = prior_growth.get(&crop.id);
            let record = Self::crop_record(crop, &mut self.rng, env, prior);
            production.insert(crop.id.clone(), record);
        }
        Ok(production)
    }

    fn historical_days(&mut self, days: usize) -> Result<Vec<HistoricalDay>> {
        let mut carry = GrowthState::default();
        let mut out = Vec::with_capacity(days);
        let now = Utc::now();
        for i in 0..days {
            let environmental = self.environmental_sample()?;
            let production = self.production_sample(&environmental, &carry)?;
            carry.absorb(&production);
            let date = now - ChronoDuration::days((days - i) as i64);
            out.push(HistoricalDay {
                date,
                environmental,
                production,
            });
        }
        Ok(out)
    }
}
