mod commands;
mod logging;
mod render;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::Format;
use roomsync_core::config::RoomSyncConfig;

#[derive(Parser)]
#[command(name = "roomsync")]
#[command(about = "Mirror meeting-room calendars and stream the changes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll room calendars and print change events until interrupted
    Watch {
        /// Output format for change events
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Run a single pass and print the mirrored appointments
    Once {
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// List the resources that would be polled
    Resources,
    /// Cancel an appointment on its remote calendar
    Cancel {
        /// Provider item id of the appointment
        appointment_id: String,

        /// Message sent along with the cancellation
        #[arg(short, long, default_value = "Cancelled by roomsync")]
        reason: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init()?;

    let config = RoomSyncConfig::load()?;

    match cli.command {
        Commands::Watch { format } => commands::watch::run(&config, format).await,
        Commands::Once { format } => commands::once::run(&config, format).await,
        Commands::Resources => commands::resources::run(&config).await,
        Commands::Cancel {
            appointment_id,
            reason,
        } => commands::cancel::run(&config, &appointment_id, &reason).await,
    }
}
