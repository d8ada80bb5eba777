use anyhow::Result;
use roomsync_core::Appointment;
use roomsync_core::config::RoomSyncConfig;
use serde_json::{Map, Value};

use super::{Format, build_poller, report};
use crate::render::{Render, render_mirror};

/// One pass against an empty mirror: every appointment shows up as new.
pub async fn run(config: &RoomSyncConfig, format: Format) -> Result<()> {
    let mut poller = build_poller(config, format);

    let pass = poller.poll_once().await?;
    report(format, || pass.render());

    let appointments = poller.reconciler().appointments();
    match format {
        Format::Text => println!("\n{}", render_mirror(appointments)),
        Format::Json => {
            for line in mirror_lines(appointments)? {
                println!("{}", line);
            }
        }
    }

    Ok(())
}

/// The mirror as JSON lines, shaped like the change events before it:
/// `{"kind":"mirrored","appointment":{...}}`.
fn mirror_lines(appointments: &[Appointment]) -> Result<Vec<String>> {
    appointments
        .iter()
        .map(|appointment| {
            let mut object = Map::new();
            object.insert("kind".to_string(), Value::from("mirrored"));
            object.insert("appointment".to_string(), serde_json::to_value(appointment)?);
            Ok(serde_json::to_string(&object)?)
        })
        .collect()
}
