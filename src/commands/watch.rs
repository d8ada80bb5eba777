use anyhow::Result;
use roomsync_core::config::RoomSyncConfig;

use super::{Format, build_poller, report};
use crate::render::Render;

pub async fn run(config: &RoomSyncConfig, format: Format) -> Result<()> {
    let interval = config.poll_interval()?;
    let mut poller = build_poller(config, format);

    tracing::info!(
        provider = %config.provider,
        interval = %humantime::format_duration(interval),
        window_months = config.window_months,
        "watching room calendars"
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for Ctrl-C, running until killed");
            std::future::pending::<()>().await;
        }
    };

    poller
        .run(interval, shutdown, |pass, _| report(format, || pass.render()))
        .await;

    Ok(())
}
