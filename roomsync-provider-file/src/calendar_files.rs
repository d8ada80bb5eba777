use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Months, NaiveDate};
use roomsync_core::remote::protocol::ProviderConfig;
use roomsync_core::{Appointment, ResourceId};

const EXTENSION: &str = "json";

/// A directory with one `{resource}.json` file per resource.
pub struct CalendarFiles {
    root: PathBuf,
}

impl CalendarFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        CalendarFiles { root: root.into() }
    }

    /// Reads the `root` key of the provider config.
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let root = config
            .get("root")
            .and_then(|v| v.as_str())
            .context("provider_config.root is not set")?;

        Ok(Self::new(shellexpand::tilde(root).into_owned()))
    }

    pub fn resources(&self) -> Result<Vec<ResourceId>> {
        let entries = std::fs::read_dir(&self.root)
            .with_context(|| format!("Failed to read {}", self.root.display()))?;

        let mut resources: Vec<ResourceId> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == EXTENSION))
            .filter_map(|path| {
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(ResourceId::from)
            })
            .collect();

        resources.sort();
        Ok(resources)
    }

    /// Appointments overlapping `[today, today + window_months)`.
    pub fn appointments(
        &self,
        resource: &ResourceId,
        today: NaiveDate,
        window_months: u32,
    ) -> Result<Vec<Appointment>> {
        let until = today
            .checked_add_months(Months::new(window_months))
            .context("Retrieval window out of range")?;

        let appointments = read_file(&self.path_for(resource))?
            .into_iter()
            .filter(|a| a.overlaps(today, until))
            .map(|mut a| {
                a.resource = Some(resource.clone());
                a
            })
            .collect();

        Ok(appointments)
    }

    /// Mark the appointment with this item id as cancelled, as a new revision.
    pub fn cancel(&self, appointment_id: &str, reason: &str) -> Result<()> {
        for resource in self.resources()? {
            let path = self.path_for(&resource);
            let mut appointments = read_file(&path)?;

            let Some(appointment) = appointments
                .iter_mut()
                .find(|a| a.version_id.unique_id == appointment_id)
            else {
                continue;
            };

            appointment.is_cancelled = true;
            appointment.version_id.change_key = uuid::Uuid::new_v4().to_string();
            eprintln!("Cancelled '{}' in {}: {}", appointment.subject, resource, reason);

            write_file(&path, &appointments)?;
            return Ok(());
        }

        anyhow::bail!("Appointment '{}' not found", appointment_id)
    }

    fn path_for(&self, resource: &ResourceId) -> PathBuf {
        self.root.join(format!("{}.{}", resource, EXTENSION))
    }
}

fn read_file(path: &Path) -> Result<Vec<Appointment>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

fn write_file(path: &Path, appointments: &[Appointment]) -> Result<()> {
    let contents = serde_json::to_string_pretty(appointments)?;
    std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}
