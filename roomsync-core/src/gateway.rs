//! Interfaces to the outside world: who the resources are, and what is on
//! their calendars.

use async_trait::async_trait;

use crate::appointment::{Appointment, ResourceId};
use crate::error::RoomSyncResult;

/// Enumerates the resources whose calendars are mirrored.
#[async_trait]
pub trait ResourceDirectory: Send + Sync {
    /// Fails with `RoomSyncError::Directory` when the lookup itself fails.
    async fn list_resources(&self) -> RoomSyncResult<Vec<ResourceId>>;
}

/// Reads and cancels appointments on remote calendars.
#[async_trait]
pub trait CalendarGateway: Send + Sync {
    /// Full snapshot of a resource's calendar from today through
    /// `window_months` months ahead.
    ///
    /// Fails with `RoomSyncError::ProviderFetch` for this resource only.
    async fn list_appointments(
        &self,
        resource: &ResourceId,
        window_months: u32,
    ) -> RoomSyncResult<Vec<Appointment>>;

    /// Cancel an appointment by its provider item id (`VersionId::unique_id`).
    async fn cancel_appointment(&self, appointment_id: &str, reason: &str) -> RoomSyncResult<()>;
}

/// A fixed list of resources, for deployments that don't use discovery.
#[derive(Debug, Clone)]
pub struct StaticDirectory(pub Vec<ResourceId>);

#[async_trait]
impl ResourceDirectory for StaticDirectory {
    async fn list_resources(&self) -> RoomSyncResult<Vec<ResourceId>> {
        Ok(self.0.clone())
    }
}
