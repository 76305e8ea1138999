use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use agrosim::{
    controller::SimulationController,
    scenario::ScenarioLoader,
    web::{self, WebServerConfig},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "agrosim farm telemetry engine")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/hillside_farm.yaml")]
    scenario: PathBuf,

    /// Run headless for N ticks and exit instead of serving
    #[arg(long)]
    ticks: Option<u64>,

    /// Override the tick interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Bind host for the dashboard feed
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Bind port for the dashboard feed
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agrosim=info".parse().expect("valid env filter")),
        )
        .init();

    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let mut scenario = loader.load(&cli.scenario)?;
    if let Some(interval_ms) = cli.interval_ms {
        scenario.update_interval_ms = interval_ms;
    }
    scenario.validate()?;

    if let Some(ticks) = cli.ticks {
        let mut controller = SimulationController::new(&scenario);
        for _ in 0..ticks {
            controller.tick();
        }
        match controller.current_snapshot() {
            Some(snapshot) => println!(
                "Scenario '{}' completed {} ticks. Revenue {:.0}, weather risk {}.",
                scenario.name, ticks, snapshot.kpis.total_revenue, snapshot.kpis.weather_risk
            ),
            None => println!(
                "Scenario '{}' produced no data: {}",
                scenario.name,
                controller.last_error().unwrap_or("unknown error")
            ),
        }
        return Ok(());
    }

    web::run(WebServerConfig {
        scenario,
        host: cli.host,
        port: cli.port,
    })
    .await
}
