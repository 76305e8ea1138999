pub mod controller;
pub mod error;
pub mod generator;
pub mod history;
pub mod kpi;
pub mod model;
pub mod runtime;
pub mod scenario;
pub mod trend;
pub mod web;

pub use controller::SimulationController;
pub use scenario::{Scenario, ScenarioLoader};
