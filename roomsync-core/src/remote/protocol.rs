//! Defines the JSON protocol used between roomsync and provider binaries
//! over stdin/stdout.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::appointment::{Appointment, ResourceId};

pub trait ProviderCommand: Serialize {
    type Response: DeserializeOwned;
    fn command() -> Command;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    ListResources,
    ListAppointments,
    CancelAppointment,
}

/// Request sent from roomsync to a provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub command: Command,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Response sent from a provider back to roomsync.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response<T> {
    Success { data: T },
    Error { error: String },
}

impl<T: Serialize> Response<T> {
    pub fn success(data: T) -> String {
        serde_json::to_string(&Response::Success { data })
            .unwrap_or_else(|e| Response::<()>::error(&format!("Failed to encode response: {e}")))
    }
}

impl Response<()> {
    pub fn error(msg: &str) -> String {
        let escaped = serde_json::Value::String(msg.to_string());
        format!(r#"{{"status":"error","error":{escaped}}}"#)
    }
}

/// Provider-specific settings, passed through from the config file.
pub type ProviderConfig = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Serialize, Deserialize)]
pub struct ListResources {
    pub provider_config: ProviderConfig,
}

impl ProviderCommand for ListResources {
    type Response = Vec<ResourceId>;
    fn command() -> Command {
        Command::ListResources
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListAppointments {
    pub provider_config: ProviderConfig,
    pub resource: ResourceId,
    pub window_months: u32,
}

impl ProviderCommand for ListAppointments {
    type Response = Vec<Appointment>;
    fn command() -> Command {
        Command::ListAppointments
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CancelAppointment {
    pub provider_config: ProviderConfig,
    pub appointment_id: String,
    pub reason: String,
}

impl ProviderCommand for CancelAppointment {
    type Response = ();
    fn command() -> Command {
        Command::CancelAppointment
    }
}
