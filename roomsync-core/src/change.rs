//! Change notifications produced by a reconciliation pass.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::appointment::Appointment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    New,
    Cancelled,
    LocationOrDateChanged,
    AttendeesChanged,
    /// Reserved: the response detector never fires yet
    AttendeeResponsesChanged,
    Deleted,
}

impl ChangeKind {
    pub fn symbol(&self) -> &'static str {
        match self {
            ChangeKind::New => "+",
            ChangeKind::Cancelled | ChangeKind::Deleted => "-",
            ChangeKind::LocationOrDateChanged
            | ChangeKind::AttendeesChanged
            | ChangeKind::AttendeeResponsesChanged => "~",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ChangeKind::New => "new",
            ChangeKind::Cancelled => "cancelled",
            ChangeKind::LocationOrDateChanged => "location or date changed",
            ChangeKind::AttendeesChanged => "attendees changed",
            ChangeKind::AttendeeResponsesChanged => "attendee responses changed",
            ChangeKind::Deleted => "deleted",
        };
        f.write_str(label)
    }
}

/// A classified change. Updates carry both the stored and the incoming revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeEvent {
    New {
        appointment: Appointment,
    },
    Cancelled {
        previous: Appointment,
        current: Appointment,
    },
    LocationOrDateChanged {
        previous: Appointment,
        current: Appointment,
    },
    AttendeesChanged {
        previous: Appointment,
        current: Appointment,
    },
    AttendeeResponsesChanged {
        previous: Appointment,
        current: Appointment,
    },
    Deleted {
        appointment: Appointment,
    },
}

impl ChangeEvent {
    pub fn kind(&self) -> ChangeKind {
        match self {
            ChangeEvent::New { .. } => ChangeKind::New,
            ChangeEvent::Cancelled { .. } => ChangeKind::Cancelled,
            ChangeEvent::LocationOrDateChanged { .. } => ChangeKind::LocationOrDateChanged,
            ChangeEvent::AttendeesChanged { .. } => ChangeKind::AttendeesChanged,
            ChangeEvent::AttendeeResponsesChanged { .. } => ChangeKind::AttendeeResponsesChanged,
            ChangeEvent::Deleted { .. } => ChangeKind::Deleted,
        }
    }

    /// The most recent known revision of the appointment this event is about.
    pub fn appointment(&self) -> &Appointment {
        match self {
            ChangeEvent::New { appointment } | ChangeEvent::Deleted { appointment } => appointment,
            ChangeEvent::Cancelled { current, .. }
            | ChangeEvent::LocationOrDateChanged { current, .. }
            | ChangeEvent::AttendeesChanged { current, .. }
            | ChangeEvent::AttendeeResponsesChanged { current, .. } => current,
        }
    }

    /// The stored revision that was replaced, for update-style events.
    pub fn previous(&self) -> Option<&Appointment> {
        match self {
            ChangeEvent::New { .. } | ChangeEvent::Deleted { .. } => None,
            ChangeEvent::Cancelled { previous, .. }
            | ChangeEvent::LocationOrDateChanged { previous, .. }
            | ChangeEvent::AttendeesChanged { previous, .. }
            | ChangeEvent::AttendeeResponsesChanged { previous, .. } => Some(previous),
        }
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.kind().symbol(), self.kind(), self.appointment())
    }
}
