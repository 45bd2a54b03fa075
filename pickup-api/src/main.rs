use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use anyhow::Context;
use pickup_api::{app, AppState};
use pickup_core::PickupPlanner;
use pickup_reminder::{ReminderScheduler, ReminderSettings};
use pickup_store::{app_config::Config, AviationStackClient, DistanceMatrixClient, LogNotifier, OpenAiAdvisor};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; real deployments use PICKUP__* variables
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    "pickup_api=debug,pickup_core=debug,pickup_reminder=debug,pickup_store=info,tower_http=debug".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Pickup API on port {}", config.server.port);

    let http = reqwest::Client::new();
    let providers = &config.providers;

    let planner = PickupPlanner::new(
        Arc::new(AviationStackClient::new(http.clone(), &providers.aviationstack_base_url, &providers.aviationstack_api_key)),
        Arc::new(DistanceMatrixClient::new(http.clone(), &providers.google_maps_base_url, &providers.google_maps_api_key)),
        Arc::new(OpenAiAdvisor::new(http, &providers.openai_base_url, &providers.openai_api_key, &providers.openai_model)),
    );

    let reminders = ReminderScheduler::new(
        Arc::new(LogNotifier),
        ReminderSettings {
            default_lead_minutes: config.reminders.default_lead_minutes,
            max_entries: config.reminders.max_entries,
            retention: Duration::from_secs(config.reminders.retention_seconds),
            sweep_interval: Duration::from_secs(config.reminders.sweep_interval_seconds.max(1)),
        },
    );
    reminders.spawn_sweeper();

    let app_state = AppState {
        planner: Arc::new(planner),
        reminders,
        default_buffer_minutes: config.planning.default_buffer_minutes,
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
