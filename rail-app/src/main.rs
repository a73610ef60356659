use std::time::Duration;

use rail_app::{maintenance, startup, state::AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rail_app=debug,rail_booking=debug,rail_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = rail_store::Config::load()?;
    tracing::info!(
        backend = ?config.database.backend,
        seat_ordering = ?config.booking.seat_ordering,
        charge_at_booking = config.booking.charge_at_booking,
        "Starting rail reservation core"
    );

    let state = AppState::from_config(&config).await?;
    startup::run_startup_checks(&state).await?;
    let pruner = maintenance::spawn_lock_pruner(
        state.locks.clone(),
        Duration::from_secs(config.maintenance.lock_prune_interval_secs),
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    pruner.abort();
    Ok(())
}
