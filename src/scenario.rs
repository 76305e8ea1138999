use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::ScenarioError;

fn default_update_interval_ms() -> u64 {
    5_000
}

fn default_seed_history_days() -> usize {
    30
}

fn default_growth_cycle_days() -> f64 {
    120.0
}

fn default_optimal_temperature() -> f64 {
    20.0
}

fn default_water_need_index() -> f64 {
    45.0
}

/// A farm configuration: the fixed crop set plus simulation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default = "default_update_interval_ms")]
    pub update_interval_ms: u64,
    #[serde(default = "default_seed_history_days")]
    pub seed_history_days: usize,
    pub crops: Vec<CropSpec>,
}

/// Static parameters for one crop. The identifier keys the production map
/// for the whole run; the agronomic fields drive the default generator.
#[derive(Debug, Clone, Deserialize)]
pub struct CropSpec {
    pub id: String,
    pub name: String,
    pub area_hectares: f64,
    pub base_yield_tonnes_per_hectare: f64,
    pub price_per_tonne: f64,
    #[serde(default = "default_growth_cycle_days")]
    pub growth_cycle_days: f64,
    #[serde(default = "default_optimal_temperature")]
    pub optimal_temperature: f64,
    #[serde(default = "default_water_need_index")]
    pub water_need_index: f64,
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        scenario
            .validate()
            .with_context(|| format!("Invalid scenario {}", path.display()))?;
        Ok(scenario)
    }
}

impl Scenario {
    /// Rejects configurations the engine cannot run. An empty crop set would
    /// make KPI aggregation divide by zero, so it is refused up front.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.crops.is_empty() {
            return Err(ScenarioError::EmptyCropSet);
        }
        if self.update_interval_ms == 0 {
            return Err(ScenarioError::ZeroInterval);
        }
        let mut seen = std::collections::BTreeSet::new();
        for crop in &self.crops {
            if !(crop.area_hectares > 0.0) {
                return Err(ScenarioError::NonPositiveArea(crop.id.clone()));
            }
            if !seen.insert(crop.id.as_str()) {
                return Err(ScenarioError::DuplicateCrop(crop.id.clone()));
            }
        }
        Ok(())
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }
}
