//! Terminal rendering for roomsync types.
//!
//! Extension traits that add colored output to roomsync-core types using
//! owo_colors. Nothing here feeds back into reconciliation.

use owo_colors::OwoColorize;
use roomsync_core::poller::PassReport;
use roomsync_core::{Appointment, Attendee, ChangeEvent, ChangeKind};

/// Extension trait for terminal rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

/// Colorize text according to the change kind
fn colorize(kind: ChangeKind, text: &str) -> String {
    match kind {
        ChangeKind::New => text.green().to_string(),
        ChangeKind::Cancelled | ChangeKind::Deleted => text.red().to_string(),
        ChangeKind::LocationOrDateChanged
        | ChangeKind::AttendeesChanged
        | ChangeKind::AttendeeResponsesChanged => text.yellow().to_string(),
    }
}

impl Render for ChangeKind {
    fn render(&self) -> String {
        colorize(*self, self.symbol())
    }
}

impl Render for ChangeEvent {
    fn render(&self) -> String {
        let kind = self.kind();
        let appointment = self.appointment();
        let mut lines = vec![format!(
            "{} {} {} {}",
            kind.render(),
            colorize(kind, &appointment.subject),
            format!("({kind})").dimmed(),
            render_when(appointment).dimmed()
        )];

        if let Some(previous) = self.previous() {
            lines.extend(
                render_field_diffs(previous, appointment)
                    .into_iter()
                    .map(|l| format!("    {}", l)),
            );
        }

        lines.join("\n")
    }
}

impl Render for PassReport {
    fn render(&self) -> String {
        let mut lines = vec![
            format!("{:<35}{}", "Room", "Appointment Count").bold().to_string(),
            "-".repeat(55).dimmed().to_string(),
        ];

        for fetch in &self.resources {
            match &fetch.result {
                Ok(count) => lines.push(format!("{:<35}{}", fetch.resource.as_str(), count)),
                Err(e) => lines.push(format!(
                    "{:<35}{}",
                    fetch.resource.as_str(),
                    e.to_string().red()
                )),
            }
        }

        let stats = &self.stats;
        if stats.is_quiet() {
            lines.push("No changes".dimmed().to_string());
        } else {
            lines.push(
                format!(
                    "{} new, {} changed, {} cancelled, {} deleted, {} merged, {} expired",
                    stats.created,
                    stats.changed,
                    stats.cancelled,
                    stats.deleted,
                    stats.merged,
                    stats.expired
                )
                .dimmed()
                .to_string(),
            );
        }

        lines.join("\n")
    }
}

impl Render for Appointment {
    fn render(&self) -> String {
        let field = |label: &str, value: &str| format!("  {:>18}: {}", label.dimmed(), value);

        [
            field("Subject", &self.subject.bold().to_string()),
            field("Start Time", &self.start.to_string()),
            field("End Time", &self.end.to_string()),
            field("Location", &self.location),
            field("Resource", self.resource.as_ref().map_or("", |r| r.as_str())),
            field("ICal Id", &self.stable_id.to_string()),
            field("Unique Id", &self.version_id.unique_id),
            field("Change Key", &self.version_id.change_key),
            field(
                "Organizer",
                &format!("{} {}", self.organizer.name, self.organizer.address),
            ),
            field("Required Attendees", &render_attendees(&self.required_attendees)),
            field("Optional Attendees", &render_attendees(&self.optional_attendees)),
        ]
        .join("\n")
    }
}

/// Render every mirrored appointment, separated by rules.
pub fn render_mirror(appointments: &[Appointment]) -> String {
    if appointments.is_empty() {
        return "No appointments".dimmed().to_string();
    }

    let rule = format!("  {}", "-".repeat(65)).dimmed().to_string();
    let mut lines = vec![format!("Appointments ({})", appointments.len()).bold().to_string()];
    for appointment in appointments {
        lines.push(rule.clone());
        lines.push(appointment.render());
    }
    lines.push(rule);
    lines.join("\n")
}

fn render_when(appointment: &Appointment) -> String {
    if appointment.start_date() == appointment.end_date() {
        format!(
            "{} {}-{}",
            appointment.start_date(),
            appointment.start.format("%H:%M"),
            appointment.end.format("%H:%M")
        )
    } else {
        format!(
            "{} - {}",
            appointment.start.format("%Y-%m-%d %H:%M"),
            appointment.end.format("%Y-%m-%d %H:%M")
        )
    }
}

fn render_attendees(attendees: &[Attendee]) -> String {
    attendees
        .iter()
        .map(|a| format!("{} -> {}", a.name, a.response))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Field-by-field differences between two revisions
fn render_field_diffs(old: &Appointment, new: &Appointment) -> Vec<String> {
    let mut lines = Vec::new();
    let mut diff = |field: &str, old: String, new: String| {
        if old != new {
            lines.push(format!("{}: {} → {}", field.dimmed(), old.red(), new.green()));
        }
    };

    diff("subject", old.subject.clone(), new.subject.clone());
    diff("location", old.location.clone(), new.location.clone());
    diff("start", old.start.to_string(), new.start.to_string());
    diff("end", old.end.to_string(), new.end.to_string());
    diff(
        "required attendees",
        old.required_attendees.len().to_string(),
        new.required_attendees.len().to_string(),
    );
    diff(
        "optional attendees",
        old.optional_attendees.len().to_string(),
        new.optional_attendees.len().to_string(),
    );

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use roomsync_core::{Mailbox, ResponseType, StableId, VersionId};

    fn make_test_appointment(location: &str, hour: u32) -> Appointment {
        let day = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
        Appointment {
            stable_id: StableId::new("uid-1", ""),
            version_id: VersionId::new("item-1", "ck-1"),
            subject: "Design Review".to_string(),
            start: day.and_hms_opt(hour, 0, 0).unwrap(),
            end: day.and_hms_opt(hour + 1, 0, 0).unwrap(),
            location: location.to_string(),
            organizer: Mailbox::default(),
            required_attendees: vec![Attendee {
                name: "Bob".to_string(),
                address: "bob@example.com".to_string(),
                response: ResponseType::Accepted,
            }],
            optional_attendees: vec![],
            is_cancelled: false,
            resource: None,
        }
    }

    #[test]
    fn test_field_diffs_only_list_changes() {
        let old = make_test_appointment("Room 1", 9);
        let new = make_test_appointment("Room 2", 9);

        let diffs = render_field_diffs(&old, &new);

        assert_eq!(diffs.len(), 1);
        assert!(diffs[0].contains("location"));
        assert!(diffs[0].contains("Room 1"));
        assert!(diffs[0].contains("Room 2"));
    }

    #[test]
    fn test_same_day_when_is_compact() {
        assert_eq!(
            render_when(&make_test_appointment("Room 1", 9)),
            "2025-03-20 09:00-10:00"
        );
    }

    #[test]
    fn test_attendees_show_responses() {
        let appointment = make_test_appointment("Room 1", 9);
        assert_eq!(
            render_attendees(&appointment.required_attendees),
            "Bob -> Accepted"
        );
    }

    #[test]
    fn test_change_event_includes_diffs() {
        let event = ChangeEvent::LocationOrDateChanged {
            previous: make_test_appointment("Room 1", 9),
            current: make_test_appointment("Room 1", 11),
        };

        let rendered = event.render();

        assert!(rendered.contains("Design Review"));
        assert_eq!(rendered.lines().count(), 3);
    }

    #[test]
    fn test_empty_mirror() {
        assert!(render_mirror(&[]).contains("No appointments"));
    }
}
