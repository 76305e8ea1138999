//! Tokio driver for the controller: one task owns the periodic tick, the
//! control commands and the reset settling delay, so every state mutation is
//! serialized onto a single logical thread. Live snapshots fan out to
//! subscribers over a broadcast channel.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::controller::SimulationController;
use crate::scenario::Scenario;

/// Settling delay between clearing state on reset and re-seeding with a
/// fresh generator.
pub const RESET_SETTLE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy)]
enum Command {
    Toggle,
    Refresh,
    Reset,
}

/// Handle to a running simulation. Dropping it aborts the driver task,
/// which cancels the pending interval tick and any in-flight reset settling
/// delay; no late write can land after teardown.
pub struct SimHandle {
    controller: Arc<Mutex<SimulationController>>,
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<String>,
    driver: JoinHandle<()>,
}

impl SimHandle {
    /// Runs a closure against the controller under the lock. Readers get a
    /// consistent view; the closure must not block.
    pub fn with<R>(&self, f: impl FnOnce(&SimulationController) -> R) -> R {
        let sim = self.controller.lock().expect("controller lock poisoned");
        f(&sim)
    }

    /// Subscribe to the JSON payload of each new snapshot.
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.events.subscribe()
    }

    pub async fn toggle(&self) {
        let _ = self.commands.send(Command::Toggle).await;
    }

    pub async fn refresh(&self) {
        let _ = self.commands.send(Command::Refresh).await;
    }

    pub async fn reset(&self) {
        let _ = self.commands.send(Command::Reset).await;
    }

    pub fn shutdown(&self) {
        self.driver.abort();
    }
}

impl Drop for SimHandle {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

/// Builds the controller, spawns the driver task and returns the handle.
pub fn spawn(scenario: &Scenario) -> SimHandle {
    spawn_with_controller(SimulationController::new(scenario), scenario.update_interval())
}

/// Same as [`spawn`] but around a pre-built controller, so tests can inject
/// scripted generators.
pub fn spawn_with_controller(
    controller: SimulationController,
    interval: Duration,
) -> SimHandle {
    let controller = Arc::new(Mutex::new(controller));
    let (events, _) = broadcast::channel::<String>(256);
    let (commands, command_rx) = mpsc::channel::<Command>(32);

    let driver = tokio::spawn(drive(
        controller.clone(),
        command_rx,
        events.clone(),
        interval,
    ));

    SimHandle {
        controller,
        commands,
        events,
        driver,
    }
}

async fn drive(
    controller: Arc<Mutex<SimulationController>>,
    mut commands: mpsc::Receiver<Command>,
    events: broadcast::Sender<String>,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first interval tick completes immediately; consume it so the
    // first simulated tick lands one full interval after startup.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let mut sim = controller.lock().expect("controller lock poisoned");
                if sim.is_active() && !sim.is_loading() {
                    sim.tick();
                    publish(&events, &sim);
                }
            }
            cmd = commands.recv() => {
                match cmd {
                    None => break,
                    Some(Command::Toggle) => {
                        let mut sim = controller.lock().expect("controller lock poisoned");
                        sim.toggle_active();
                    }
                    Some(Command::Refresh) => {
                        let mut sim = controller.lock().expect("controller lock poisoned");
                        sim.refresh_now();
                        publish(&events, &sim);
                    }
                    Some(Command::Reset) => {
                        {
                            let mut sim =
                                controller.lock().expect("controller lock poisoned");
                            sim.begin_reset();
                        }
                        tokio::time::sleep(RESET_SETTLE).await;
                        {
                            let mut sim =
                                controller.lock().expect("controller lock poisoned");
                            sim.complete_reset();
                            publish(&events, &sim);
                        }
                        // A deadline missed during the settling sleep would
                        // fire immediately; restart the period instead.
                        ticker.reset();
                        info!("reset complete");
                    }
                }
            }
        }
    }
}

fn publish(events: &broadcast::Sender<String>, sim: &SimulationController) {
    if let Some(snapshot) = sim.current_snapshot() {
        if let Ok(payload) = serde_json::to_string(snapshot) {
            let _ = events.send(payload);
        }
    }
}
