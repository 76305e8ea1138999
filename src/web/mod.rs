//! JSON API and live event stream for the dashboard. This layer is a thin
//! read/control surface over the running simulation; it never mutates
//! engine state directly.

use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Result;
use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tracing::info;

use crate::{
    kpi::KpiRecord,
    model::Snapshot,
    runtime::{self, SimHandle},
    scenario::Scenario,
    trend::{EnvironmentalPoint, KpiPoint, ProductionPoint, Trend},
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateEnvelope {
    pub scenario: String,
    pub description: Option<String>,
    pub update_interval_ms: u64,
    pub is_loading: bool,
    pub is_active: bool,
    pub last_error: Option<String>,
    pub data_points: usize,
    pub current: Option<Snapshot>,
    pub kpi_trends: KpiTrendSummary,
}

/// Trailing-window trends for the headline KPI cards.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiTrendSummary {
    pub total_revenue: Trend,
    pub average_efficiency: Trend,
    pub average_growth: Trend,
    pub weather_risk: Trend,
}

struct AppState {
    sim: SimHandle,
    description: Option<String>,
    update_interval_ms: u64,
}

pub struct WebServerConfig {
    pub scenario: Scenario,
    pub host: String,
    pub port: u16,
}

pub async fn run(config: WebServerConfig) -> Result<()> {
    let WebServerConfig {
        scenario,
        host,
        port,
    } = config;

    let description = scenario.description.clone();
    let update_interval_ms = scenario.update_interval_ms;
    let sim = runtime::spawn(&scenario);

    let state = Arc::new(AppState {
        sim,
        description,
        update_interval_ms,
    });

    let router = Router::new()
        .route("/api/state", get(state_envelope))
        .route("/api/history", get(history))
        .route("/api/trends/environmental", get(environmental_trends))
        .route("/api/trends/production", get(production_trends))
        .route("/api/trends/kpis", get(kpi_trends))
        .route("/api/control/toggle", post(toggle))
        .route("/api/control/refresh", post(refresh))
        .route("/api/control/reset", post(reset))
        .route("/api/events", get(stream_events))
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!(%addr, "dashboard feed listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down dashboard feed");
}

fn default_days() -> usize {
    7
}

#[derive(Deserialize)]
struct TrendQuery {
    #[serde(default = "default_days")]
    days: usize,
    crop: Option<String>,
}

async fn state_envelope(State(state): State<Arc<AppState>>) -> Json<StateEnvelope> {
    let envelope = state.sim.with(|sim| StateEnvelope {
        scenario: sim.scenario_name().to_string(),
        description: state.description.clone(),
        update_interval_ms: state.update_interval_ms,
        is_loading: sim.is_loading(),
        is_active: sim.is_active(),
        last_error: sim.last_error().map(str::to_string),
        data_points: sim.data_points(),
        current: sim.current_snapshot().cloned(),
        kpi_trends: KpiTrendSummary {
            total_revenue: sim.kpi_trend(|k: &KpiRecord| k.total_revenue),
            average_efficiency: sim.kpi_trend(|k: &KpiRecord| k.average_efficiency),
            average_growth: sim.kpi_trend(|k: &KpiRecord| k.average_growth),
            weather_risk: sim.kpi_trend(|k: &KpiRecord| k.weather_risk),
        },
    });
    Json(envelope)
}

async fn history(State(state): State<Arc<AppState>>) -> Json<Vec<Snapshot>> {
    Json(state.sim.with(|sim| sim.history()))
}

async fn environmental_trends(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TrendQuery>,
) -> Json<Vec<EnvironmentalPoint>> {
    Json(state.sim.with(|sim| sim.environmental_trends(query.days)))
}

async fn production_trends(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TrendQuery>,
) -> Json<Vec<ProductionPoint>> {
    Json(
        state
            .sim
            .with(|sim| sim.production_trends(query.crop.as_deref(), query.days)),
    )
}

async fn kpi_trends(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TrendQuery>,
) -> Json<Vec<KpiPoint>> {
    Json(state.sim.with(|sim| sim.kpi_trends(query.days)))
}

async fn toggle(State(state): State<Arc<AppState>>) {
    state.sim.toggle().await;
}

async fn refresh(State(state): State<Arc<AppState>>) {
    state.sim.refresh().await;
}

async fn reset(State(state): State<Arc<AppState>>) {
    state.sim.reset().await;
}

async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.sim.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(payload) => Some(Ok(Event::default().data(payload))),
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(2))
            .text("keep-alive"),
    )
}
