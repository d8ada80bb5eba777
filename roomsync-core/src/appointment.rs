//! Provider-neutral appointment types.
//!
//! Providers convert their calendar API responses into these types, and the
//! reconciliation engine works exclusively with them.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Identifier of a bookable resource (usually a room mailbox address).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        ResourceId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        ResourceId(id.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(id: String) -> Self {
        ResourceId(id)
    }
}

/// Identifies the same logical appointment across revisions.
///
/// Instances of a recurring series share the `ical_uid` and differ in
/// `recurrence_id`. Single appointments carry an empty `recurrence_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StableId {
    pub ical_uid: String,
    #[serde(default)]
    pub recurrence_id: String,
}

impl StableId {
    pub fn new(ical_uid: impl Into<String>, recurrence_id: impl Into<String>) -> Self {
        StableId {
            ical_uid: ical_uid.into(),
            recurrence_id: recurrence_id.into(),
        }
    }
}

impl fmt::Display for StableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.recurrence_id.is_empty() {
            write!(f, "{}", self.ical_uid)
        } else {
            write!(f, "{} ({})", self.ical_uid, self.recurrence_id)
        }
    }
}

/// Identifies one revision of an appointment. The change key moves on every
/// remote edit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionId {
    pub unique_id: String,
    pub change_key: String,
}

impl VersionId {
    pub fn new(unique_id: impl Into<String>, change_key: impl Into<String>) -> Self {
        VersionId {
            unique_id: unique_id.into(),
            change_key: change_key.into(),
        }
    }
}

/// A named mailbox (used for the organizer)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mailbox {
    #[serde(default)]
    pub name: String,
    pub address: String,
}

/// An attendee's reply to the meeting request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    Accepted,
    Declined,
    Tentative,
    #[default]
    NoResponseReceived,
    Organizer,
    Unknown,
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ResponseType::Accepted => "Accepted",
            ResponseType::Declined => "Declined",
            ResponseType::Tentative => "Tentative",
            ResponseType::NoResponseReceived => "NoResponseReceived",
            ResponseType::Organizer => "Organizer",
            ResponseType::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

/// A meeting attendee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    #[serde(default)]
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub response: ResponseType,
}

/// One calendar occurrence as seen from a resource's mailbox.
///
/// Values are never edited in place: a newer revision replaces the stored
/// one wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub stable_id: StableId,
    pub version_id: VersionId,
    pub subject: String,
    /// Start in the source system's local time
    pub start: NaiveDateTime,
    /// End in the source system's local time
    pub end: NaiveDateTime,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub organizer: Mailbox,
    #[serde(default)]
    pub required_attendees: Vec<Attendee>,
    #[serde(default)]
    pub optional_attendees: Vec<Attendee>,
    #[serde(default)]
    pub is_cancelled: bool,

    /// Calendar this appointment was fetched from. Not part of its identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceId>,
}

impl Appointment {
    pub fn start_date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end.date()
    }

    /// True if the appointment ends on or after `today`.
    pub fn ends_on_or_after(&self, today: NaiveDate) -> bool {
        self.end_date() >= today
    }

    /// Whether the appointment overlaps the half-open day window `[from, to)`.
    pub fn overlaps(&self, from: NaiveDate, to: NaiveDate) -> bool {
        self.end_date() >= from && self.start_date() < to
    }
}

impl fmt::Display for Appointment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.subject)
    }
}
