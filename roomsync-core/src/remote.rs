//! Remote calendar operations via providers.

pub mod protocol;
pub mod provider;

use async_trait::async_trait;

use crate::appointment::{Appointment, ResourceId};
use crate::error::{RoomSyncError, RoomSyncResult};
use crate::gateway::{CalendarGateway, ResourceDirectory};
use crate::remote::protocol::{CancelAppointment, ListAppointments, ListResources, ProviderConfig};
use crate::remote::provider::Provider;

/// A provider plus the settings it is called with.
///
/// Serves as both the resource directory and the calendar gateway.
#[derive(Debug, Clone)]
pub struct Remote {
    pub provider: Provider,
    pub config: ProviderConfig,
}

impl Remote {
    pub fn new(provider: Provider, config: ProviderConfig) -> Self {
        Remote { provider, config }
    }
}

#[async_trait]
impl ResourceDirectory for Remote {
    async fn list_resources(&self) -> RoomSyncResult<Vec<ResourceId>> {
        self.provider
            .call(ListResources {
                provider_config: self.config.clone(),
            })
            .await
            .map_err(RoomSyncError::into_directory_error)
    }
}

#[async_trait]
impl CalendarGateway for Remote {
    async fn list_appointments(
        &self,
        resource: &ResourceId,
        window_months: u32,
    ) -> RoomSyncResult<Vec<Appointment>> {
        let appointments = self
            .provider
            .call(ListAppointments {
                provider_config: self.config.clone(),
                resource: resource.clone(),
                window_months,
            })
            .await
            .map_err(|e| e.into_fetch_error(resource.as_str()))?;

        Ok(appointments
            .into_iter()
            .map(|mut appointment| {
                appointment.resource = Some(resource.clone());
                appointment
            })
            .collect())
    }

    async fn cancel_appointment(&self, appointment_id: &str, reason: &str) -> RoomSyncResult<()> {
        self.provider
            .call(CancelAppointment {
                provider_config: self.config.clone(),
                appointment_id: appointment_id.to_string(),
                reason: reason.to_string(),
            })
            .await
    }
}
