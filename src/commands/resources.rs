use anyhow::Result;
use roomsync_core::config::RoomSyncConfig;

pub async fn run(config: &RoomSyncConfig) -> Result<()> {
    let resources = config.directory().list_resources().await?;

    if resources.is_empty() {
        println!("No resources found.");
    }

    for resource in resources {
        println!("{}", resource);
    }

    Ok(())
}
