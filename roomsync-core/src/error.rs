//! Error types for roomsync.

use thiserror::Error;

/// A precondition of an identity comparison was violated.
///
/// Both sides of a version or delta comparison must exist and must refer to
/// the same logical appointment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Stored appointment is missing")]
    MissingExisting,

    #[error("Incoming appointment is missing")]
    MissingIncoming,

    #[error("Appointments differ in stable identity ({existing} vs {incoming})")]
    Mismatch { existing: String, incoming: String },
}

/// Errors that can occur in roomsync operations.
#[derive(Error, Debug)]
pub enum RoomSyncError {
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Failed to fetch appointments for {resource}: {message}")]
    ProviderFetch { resource: String, message: String },

    #[error("Resource lookup failed: {0}")]
    Directory(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Provider '{0}' not found in PATH")]
    ProviderNotInstalled(String),

    #[error("Provider request timed out after {0}s")]
    ProviderTimeout(u64),

    #[error("Event sink error: {0}")]
    Sink(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RoomSyncError {
    /// Re-tag a provider failure as a fetch failure for one resource.
    pub fn into_fetch_error(self, resource: &str) -> Self {
        match self {
            RoomSyncError::ProviderFetch { .. } => self,
            other => RoomSyncError::ProviderFetch {
                resource: resource.to_string(),
                message: other.to_string(),
            },
        }
    }

    /// Re-tag a provider failure as a directory failure.
    pub fn into_directory_error(self) -> Self {
        match self {
            RoomSyncError::Directory(_) => self,
            other => RoomSyncError::Directory(other.to_string()),
        }
    }
}

/// Result type alias for roomsync operations.
pub type RoomSyncResult<T> = Result<T, RoomSyncError>;
