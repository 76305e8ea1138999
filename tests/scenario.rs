use std::fs;

use agrosim::scenario::ScenarioLoader;
use tempfile::tempdir;

#[test]
fn default_scenario_fixture_loads() {
    let loader = ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"));
    let scenario = loader
        .load("scenarios/hillside_farm.yaml")
        .expect("fixture parses");
    assert_eq!(scenario.name, "hillside_farm");
    assert_eq!(scenario.crops.len(), 4);
    assert_eq!(scenario.update_interval_ms, 5_000);
    assert_eq!(scenario.seed_history_days, 30);
    let total_area: f64 = scenario.crops.iter().map(|c| c.area_hectares).sum();
    assert_eq!(total_area, 447.0);
}

#[test]
fn missing_optional_fields_fall_back_to_defaults() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("minimal.yaml");
    fs::write(
        &path,
        r#"
name: minimal
seed: 7
crops:
  - id: barley
    name: Barley
    area_hectares: 40.0
    base_yield_tonnes_per_hectare: 4.0
    price_per_tonne: 170.0
"#,
    )
    .expect("write scenario");

    let loader = ScenarioLoader::new(temp.path());
    let scenario = loader.load("minimal.yaml").expect("minimal parses");
    assert_eq!(scenario.update_interval_ms, 5_000);
    assert_eq!(scenario.seed_history_days, 30);
    let crop = &scenario.crops[0];
    assert_eq!(crop.growth_cycle_days, 120.0);
    assert_eq!(crop.optimal_temperature, 20.0);
    assert_eq!(crop.water_need_index, 45.0);
}

#[test]
fn crop_less_scenario_is_refused() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("empty.yaml");
    fs::write(
        &path,
        r#"
name: empty
seed: 1
crops: []
"#,
    )
    .expect("write scenario");

    let loader = ScenarioLoader::new(temp.path());
    let err = loader.load("empty.yaml").expect_err("must be refused");
    assert!(format!("{err:#}").contains("at least one crop"));
}

#[test]
fn unreadable_path_reports_the_file() {
    let loader = ScenarioLoader::new(".");
    let err = loader
        .load("scenarios/does_not_exist.yaml")
        .expect_err("missing file");
    assert!(format!("{err:#}").contains("does_not_exist.yaml"));
}
