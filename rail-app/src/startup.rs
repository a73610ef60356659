use rail_core::repository::TicketFilter;
use rail_core::TicketStatus;
use tracing::{info, warn};
use uuid::Uuid;

use crate::state::AppState;

#[derive(Debug, Clone, Default)]
pub struct StartupReport {
    pub corrected_trains: Vec<Uuid>,
    pub trains: usize,
    pub pending_tickets: usize,
}

/// Repair seat counters and report the approval backlog.
pub async fn run_startup_checks(state: &AppState) -> anyhow::Result<StartupReport> {
    let corrected_trains = state.trains.reconcile_seat_counts().await?;
    if !corrected_trains.is_empty() {
        warn!(count = corrected_trains.len(), "Trains had drifted seat counts");
    }

    let trains = state.trains.list_trains().await?.len();
    let pending_tickets = state
        .persistence
        .tickets
        .list(TicketFilter::default().with_status(TicketStatus::Pending))
        .await?
        .len();

    info!(trains, pending_tickets, "Startup checks complete");
    Ok(StartupReport {
        corrected_trains,
        trains,
        pending_tickets,
    })
}
