//! The simulation controller: owns the generator, the carried growth state,
//! the rolling history and the current snapshot, and runs the tick/refresh/
//! reset lifecycle. All methods are synchronous; the tokio driver in
//! [`crate::runtime`] serializes calls onto a single task.

use chrono::Utc;
use tracing::{info, warn};

use crate::generator::{FieldSampler, Generator};
use crate::history::HistoryBuffer;
use crate::kpi::{self, KpiRecord};
use crate::model::{GrowthState, Snapshot};
use crate::scenario::Scenario;
use crate::trend::{self, EnvironmentalPoint, KpiPoint, ProductionPoint, Trend};

/// Builds a brand-new generator; invoked at construction and on every reset
/// so a reset discards all generator state.
pub type GeneratorFactory = Box<dyn Fn() -> Box<dyn Generator> + Send>;

/// Lifecycle phase of the controller.
///
/// `Loading` covers the initial bootstrap and the reset settling window;
/// `Failed` is the persistent error state after a bootstrap failure (no
/// current snapshot, not loading, still tickable).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Loading,
    Ready,
    Failed,
}

pub struct SimulationController {
    scenario_name: String,
    seed_days: usize,
    factory: GeneratorFactory,
    generator: Box<dyn Generator>,
    growth: GrowthState,
    history: HistoryBuffer,
    current: Option<Snapshot>,
    next_id: u64,
    phase: Phase,
    active: bool,
    last_error: Option<String>,
}

impl SimulationController {
    /// Builds a controller backed by the default [`FieldSampler`] and
    /// bootstraps it from the scenario's seeded history.
    pub fn new(scenario: &Scenario) -> Self {
        let for_factory = scenario.clone();
        Self::with_generator_factory(
            scenario.name.clone(),
            scenario.seed_history_days,
            Box::new(move || Box::new(FieldSampler::from_scenario(&for_factory))),
        )
    }

    /// Builds a controller around an arbitrary generator factory. The
    /// bootstrap runs immediately; on failure the controller lands in the
    /// persistent error state instead of panicking.
    pub fn with_generator_factory(
        scenario_name: String,
        seed_days: usize,
        factory: GeneratorFactory,
    ) -> Self {
        let generator = factory();
        let mut controller = Self {
            scenario_name,
            seed_days,
            factory,
            generator,
            growth: GrowthState::default(),
            history: HistoryBuffer::new(),
            current: None,
            next_id: 0,
            phase: Phase::Loading,
            active: true,
            last_error: None,
        };
        controller.bootstrap();
        controller
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Seeds the history buffer from the generator's historical bulk run and
    /// promotes the last seeded snapshot to current.
    fn bootstrap(&mut self) {
        self.phase = Phase::Loading;
        match self.generator.historical_days(self.seed_days) {
            Ok(days) => {
                for day in days {
                    let kpis = kpi::aggregate(&day.production, &day.environmental);
                    self.growth.absorb(&day.production);
                    let snapshot = Snapshot {
                        id: self.allocate_id(),
                        timestamp: day.date,
                        environmental: day.environmental,
                        production: day.production,
                        kpis,
                    };
                    self.history.push(snapshot);
                }
                self.current = self.history.last().cloned();
                self.last_error = None;
                self.phase = Phase::Ready;
                info!(
                    scenario = %self.scenario_name,
                    seeded = self.history.len(),
                    "bootstrap complete"
                );
            }
            Err(err) => {
                self.phase = Phase::Failed;
                self.last_error = Some(format!("bootstrap failed: {err:#}"));
                warn!(scenario = %self.scenario_name, error = %err, "bootstrap failed");
            }
        }
    }

    /// Runs one simulation step. A failing generator leaves the growth
    /// state, history and current snapshot exactly as they were; only the
    /// error record changes.
    pub fn tick(&mut self) {
        if self.phase == Phase::Loading {
            return;
        }
        match self.try_tick() {
            Ok(()) => {
                self.last_error = None;
            }
            Err(err) => {
                warn!(scenario = %self.scenario_name, error = %err, "tick failed");
                self.last_error = Some(format!("tick failed: {err:#}"));
            }
        }
    }

    fn try_tick(&mut self) -> anyhow::Result<()> {
        let env = self.generator.environmental_sample()?;
        let production = self.generator.production_sample(&env, &self.growth)?;

        // Both generator calls succeeded; commit.
        self.growth.absorb(&production);
        let kpis = kpi::aggregate(&production, &env);
        let snapshot = Snapshot {
            id: self.allocate_id(),
            timestamp: Utc::now(),
            environmental: env,
            production,
            kpis,
        };
        self.current = Some(snapshot.clone());
        self.history.push(snapshot);
        self.phase = Phase::Ready;
        Ok(())
    }

    /// Flips between active and paused. No ticks run while paused; resuming
    /// does not replay missed intervals.
    pub fn toggle_active(&mut self) {
        self.active = !self.active;
        info!(scenario = %self.scenario_name, active = self.active, "toggled");
    }

    /// Performs exactly one tick immediately, independent of the interval.
    pub fn refresh_now(&mut self) {
        self.tick();
    }

    /// First half of a hard reset: discard all state and enter loading. The
    /// driver waits out the settling delay before calling
    /// [`Self::complete_reset`]; no ticks run in between.
    pub fn begin_reset(&mut self) {
        self.growth.clear();
        self.history.clear();
        self.current = None;
        self.last_error = None;
        self.phase = Phase::Loading;
        info!(scenario = %self.scenario_name, "reset started");
    }

    /// Second half of a hard reset: swap in a brand-new generator and re-run
    /// the bootstrap from scratch.
    pub fn complete_reset(&mut self) {
        self.generator = (self.factory)();
        self.next_id = 0;
        self.bootstrap();
    }

    pub fn current_snapshot(&self) -> Option<&Snapshot> {
        self.current.as_ref()
    }

    /// Owned copy of the history, oldest first, at most 100 entries.
    pub fn history(&self) -> Vec<Snapshot> {
        self.history.to_vec()
    }

    pub fn data_points(&self) -> usize {
        self.history.len()
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn scenario_name(&self) -> &str {
        &self.scenario_name
    }

    /// The last `days` snapshots projected to their environmental fields.
    pub fn environmental_trends(&self, days: usize) -> Vec<EnvironmentalPoint> {
        self.history
            .tail(days)
            .map(|s| EnvironmentalPoint {
                date: s.timestamp,
                environmental: s.environmental.clone(),
            })
            .collect()
    }

    /// The last `days` snapshots projected to their production maps. With a
    /// crop id the maps are filtered to that crop; an unknown id yields
    /// empty maps rather than failing.
    pub fn production_trends(&self, crop: Option<&str>, days: usize) -> Vec<ProductionPoint> {
        self.history
            .tail(days)
            .map(|s| {
                let production = match crop {
                    Some(id) => s
                        .production
                        .iter()
                        .filter(|(key, _)| key.as_str() == id)
                        .map(|(key, record)| (key.clone(), record.clone()))
                        .collect(),
                    None => s.production.clone(),
                };
                ProductionPoint {
                    date: s.timestamp,
                    production,
                }
            })
            .collect()
    }

    /// The last `days` snapshots projected to their KPI records.
    pub fn kpi_trends(&self, days: usize) -> Vec<KpiPoint> {
        self.history
            .tail(days)
            .map(|s| KpiPoint {
                date: s.timestamp,
                kpis: s.kpis.clone(),
            })
            .collect()
    }

    /// Trend of one KPI metric over the trailing window of the history.
    pub fn kpi_trend<F>(&self, metric: F) -> Trend
    where
        F: Fn(&KpiRecord) -> f64,
    {
        let recent: Vec<&Snapshot> = self.history.iter().collect();
        trend::trend(&recent, |s| Some(metric(&s.kpis)))
    }
}
