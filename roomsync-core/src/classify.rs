//! Change classification between two revisions of the same appointment.
//!
//! Every detector takes the stored revision and the incoming one. A missing
//! side is an `IdentityError`, same as for version comparison.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::appointment::Appointment;
use crate::error::IdentityError;
use crate::identity::require_pair;

/// The single highest-priority change found between two revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delta {
    Cancelled,
    LocationOrDateChanged,
    AttendeesChanged,
    AttendeeResponsesChanged,
    /// Something changed (subject, change key, ...) that no detector tracks
    Unclassified,
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Delta::Cancelled => "cancelled",
            Delta::LocationOrDateChanged => "location or date changed",
            Delta::AttendeesChanged => "attendees changed",
            Delta::AttendeeResponsesChanged => "attendee responses changed",
            Delta::Unclassified => "unclassified",
        };
        f.write_str(label)
    }
}

/// Classify in priority order: cancellation, then location/date, then
/// attendee count, then attendee responses.
pub fn classify(
    existing: Option<&Appointment>,
    incoming: Option<&Appointment>,
) -> Result<Delta, IdentityError> {
    if is_cancelled(existing, incoming)? {
        return Ok(Delta::Cancelled);
    }

    if location_changed(existing, incoming)? || date_changed(existing, incoming)? {
        return Ok(Delta::LocationOrDateChanged);
    }

    if attendee_count_changed(existing, incoming)? {
        return Ok(Delta::AttendeesChanged);
    }

    if attendee_responses_changed(existing, incoming)? {
        return Ok(Delta::AttendeeResponsesChanged);
    }

    Ok(Delta::Unclassified)
}

pub fn location_changed(
    existing: Option<&Appointment>,
    incoming: Option<&Appointment>,
) -> Result<bool, IdentityError> {
    let (existing, incoming) = require_pair(existing, incoming)?;
    Ok(existing.location != incoming.location)
}

/// Start or end moved to another calendar day. Time of day is ignored.
pub fn date_changed(
    existing: Option<&Appointment>,
    incoming: Option<&Appointment>,
) -> Result<bool, IdentityError> {
    let (existing, incoming) = require_pair(existing, incoming)?;
    Ok(existing.start_date() != incoming.start_date()
        || existing.end_date() != incoming.end_date())
}

/// Only cardinality is compared; swapping one attendee for another is not a change.
pub fn attendee_count_changed(
    existing: Option<&Appointment>,
    incoming: Option<&Appointment>,
) -> Result<bool, IdentityError> {
    let (existing, incoming) = require_pair(existing, incoming)?;
    Ok(existing.required_attendees.len() != incoming.required_attendees.len()
        || existing.optional_attendees.len() != incoming.optional_attendees.len())
}

pub fn is_cancelled(
    existing: Option<&Appointment>,
    incoming: Option<&Appointment>,
) -> Result<bool, IdentityError> {
    let (_, incoming) = require_pair(existing, incoming)?;
    Ok(incoming.is_cancelled)
}

/// Always reports no change.
///
/// A room mailbox does not see attendee replies; only the organizer's
/// mailbox does, so there is nothing reliable to diff yet.
pub fn attendee_responses_changed(
    existing: Option<&Appointment>,
    incoming: Option<&Appointment>,
) -> Result<bool, IdentityError> {
    require_pair(existing, incoming)?;
    Ok(false)
}
