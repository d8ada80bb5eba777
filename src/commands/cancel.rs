use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use roomsync_core::config::RoomSyncConfig;
use roomsync_core::gateway::CalendarGateway;

pub async fn run(config: &RoomSyncConfig, appointment_id: &str, reason: &str) -> Result<()> {
    config
        .remote()
        .cancel_appointment(appointment_id, reason)
        .await
        .with_context(|| format!("Failed to cancel {}", appointment_id))?;

    println!("{} {}", "Cancelled".red(), appointment_id);

    Ok(())
}
