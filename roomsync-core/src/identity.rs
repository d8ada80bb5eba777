//! The two equality notions used during reconciliation.
//!
//! `same_appointment` asks whether two values describe the same logical
//! appointment. `same_version` asks whether they are the same revision of
//! it, and may only be asked once the first question has been answered yes.

use crate::appointment::Appointment;
use crate::error::IdentityError;

pub fn same_appointment(a: &Appointment, b: &Appointment) -> bool {
    a.stable_id == b.stable_id
}

/// Compare version identity of a stored and an incoming appointment.
pub fn same_version(
    existing: Option<&Appointment>,
    incoming: Option<&Appointment>,
) -> Result<bool, IdentityError> {
    let (existing, incoming) = require_pair(existing, incoming)?;

    if !same_appointment(existing, incoming) {
        return Err(IdentityError::Mismatch {
            existing: existing.stable_id.to_string(),
            incoming: incoming.stable_id.to_string(),
        });
    }

    Ok(existing.version_id == incoming.version_id)
}

/// Both sides of a comparison must be present.
pub(crate) fn require_pair<'a>(
    existing: Option<&'a Appointment>,
    incoming: Option<&'a Appointment>,
) -> Result<(&'a Appointment, &'a Appointment), IdentityError> {
    match (existing, incoming) {
        (Some(existing), Some(incoming)) => Ok((existing, incoming)),
        (None, _) => Err(IdentityError::MissingExisting),
        (_, None) => Err(IdentityError::MissingIncoming),
    }
}
