//! The reconciliation engine.
//!
//! A pass compares a complete incoming snapshot against the mirror in two
//! phases:
//!
//! 1. Removal detection. Stored appointments missing from the snapshot are
//!    dropped. Those ending today or later are reported as `Deleted`; older
//!    ones just fell out of the provider's retrieval window and go silently.
//!    A scoped pass keeps upcoming appointments of resources outside the
//!    scope, but still expires past ones.
//! 2. Per-item reconciliation, in snapshot order. Unknown appointments are
//!    `New`. Known ones with a different version are classified, reported,
//!    and then replace the stored revision, except for cancellations, which
//!    are removed instead.
//!
//! Passes take `&mut self`, so one engine never runs two passes at once.

use std::collections::HashSet;

use chrono::{Local, NaiveDate};

use crate::appointment::{Appointment, ResourceId, StableId};
use crate::change::ChangeEvent;
use crate::classify::{Delta, classify};
use crate::error::RoomSyncResult;
use crate::identity::same_version;
use crate::sink::EventSink;
use crate::store::SnapshotStore;

/// Counters for one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassStats {
    pub created: usize,
    pub changed: usize,
    /// Newer revisions merged without any classified change
    pub merged: usize,
    pub cancelled: usize,
    pub deleted: usize,
    /// Past appointments dropped without an event
    pub expired: usize,
    pub emit_failures: usize,
}

impl PassStats {
    /// Number of events handed to the sink.
    pub fn events(&self) -> usize {
        self.created + self.changed + self.cancelled + self.deleted
    }

    pub fn is_quiet(&self) -> bool {
        self.events() == 0 && self.merged == 0 && self.expired == 0
    }
}

pub struct Reconciler<S> {
    store: SnapshotStore,
    sink: S,
}

impl<S: EventSink> Reconciler<S> {
    pub fn new(sink: S) -> Self {
        Self::with_store(SnapshotStore::new(), sink)
    }

    pub fn with_store(store: SnapshotStore, sink: S) -> Self {
        Reconciler { store, sink }
    }

    /// Run a full pass, using the local calendar date as "today".
    pub fn reconcile(&mut self, incoming: &[Appointment]) -> RoomSyncResult<PassStats> {
        self.reconcile_as_of(incoming, Local::now().date_naive())
    }

    pub fn reconcile_as_of(
        &mut self,
        incoming: &[Appointment],
        today: NaiveDate,
    ) -> RoomSyncResult<PassStats> {
        self.run_pass(incoming, today, |_| true)
    }

    /// Run a full pass where only appointments fetched from a resource in
    /// `scope` can be reported as deleted.
    ///
    /// Use this when some resources could not be fetched: their upcoming
    /// appointments are left alone instead of being reported as deleted.
    /// Past appointments still expire whatever their resource. Appointments
    /// with no recorded resource are always considered.
    pub fn reconcile_scoped(
        &mut self,
        incoming: &[Appointment],
        scope: &HashSet<ResourceId>,
        today: NaiveDate,
    ) -> RoomSyncResult<PassStats> {
        self.run_pass(incoming, today, |stored| match &stored.resource {
            Some(resource) => scope.contains(resource),
            None => true,
        })
    }

    /// Reconcile a single appointment without removal detection.
    ///
    /// For partial, non-authoritative updates where absence from the input
    /// means nothing.
    pub fn reconcile_one(&mut self, item: &Appointment) -> RoomSyncResult<PassStats> {
        let mut stats = PassStats::default();
        self.reconcile_item(item, &mut stats)?;
        Ok(stats)
    }

    pub fn count(&self) -> usize {
        self.store.count()
    }

    pub fn appointments(&self) -> &[Appointment] {
        self.store.all()
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    fn run_pass(
        &mut self,
        incoming: &[Appointment],
        today: NaiveDate,
        in_scope: impl Fn(&Appointment) -> bool,
    ) -> RoomSyncResult<PassStats> {
        let mut stats = PassStats::default();

        self.remove_missing(incoming, today, in_scope, &mut stats);

        for item in incoming {
            self.reconcile_item(item, &mut stats)?;
        }

        tracing::debug!(
            incoming = incoming.len(),
            stored = self.store.count(),
            created = stats.created,
            changed = stats.changed,
            merged = stats.merged,
            cancelled = stats.cancelled,
            deleted = stats.deleted,
            expired = stats.expired,
            "reconciliation pass complete"
        );

        Ok(stats)
    }

    fn remove_missing(
        &mut self,
        incoming: &[Appointment],
        today: NaiveDate,
        in_scope: impl Fn(&Appointment) -> bool,
        stats: &mut PassStats,
    ) {
        let seen: HashSet<&StableId> = incoming.iter().map(|a| &a.stable_id).collect();

        let missing: Vec<Appointment> = self
            .store
            .all()
            .iter()
            .filter(|stored| !seen.contains(&stored.stable_id))
            .cloned()
            .collect();

        for stored in missing {
            if stored.ends_on_or_after(today) {
                if !in_scope(&stored) {
                    continue;
                }
                self.emit(
                    ChangeEvent::Deleted {
                        appointment: stored.clone(),
                    },
                    stats,
                );
                self.store.remove(&stored);
                stats.deleted += 1;
            } else {
                tracing::trace!(stable_id = %stored.stable_id, "dropping past appointment");
                self.store.remove(&stored);
                stats.expired += 1;
            }
        }
    }

    fn reconcile_item(&mut self, item: &Appointment, stats: &mut PassStats) -> RoomSyncResult<()> {
        let Some(existing) = self.store.find_by_stable_id(&item.stable_id).cloned() else {
            self.store.upsert(item.clone());
            self.emit(
                ChangeEvent::New {
                    appointment: item.clone(),
                },
                stats,
            );
            stats.created += 1;
            return Ok(());
        };

        if same_version(Some(&existing), Some(item))? {
            return Ok(());
        }

        let previous = existing.clone();
        let current = item.clone();

        match classify(Some(&existing), Some(item))? {
            Delta::Cancelled => {
                self.emit(ChangeEvent::Cancelled { previous, current }, stats);
                self.store.remove(&existing);
                stats.cancelled += 1;
                return Ok(());
            }
            Delta::LocationOrDateChanged => {
                self.emit(ChangeEvent::LocationOrDateChanged { previous, current }, stats);
                stats.changed += 1;
            }
            Delta::AttendeesChanged => {
                self.emit(ChangeEvent::AttendeesChanged { previous, current }, stats);
                stats.changed += 1;
            }
            Delta::AttendeeResponsesChanged => {
                self.emit(ChangeEvent::AttendeeResponsesChanged { previous, current }, stats);
                stats.changed += 1;
            }
            Delta::Unclassified => {
                tracing::debug!(stable_id = %item.stable_id, "merging unclassified revision");
                stats.merged += 1;
            }
        }

        self.store.upsert(item.clone());
        Ok(())
    }

    fn emit(&mut self, event: ChangeEvent, stats: &mut PassStats) {
        let kind = event.kind();
        if let Err(e) = self.sink.emit(event) {
            tracing::warn!(%kind, error = %e, "failed to emit change event");
            stats.emit_failures += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::ChangeKind;
    use crate::error::RoomSyncError;
    use crate::sink::Recorder;
    use crate::test_support::{make_test_appointment, make_test_attendee, test_today};
    use chrono::Duration;

    fn reconciler_with(appointments: &[Appointment]) -> Reconciler<Recorder> {
        let mut reconciler = Reconciler::new(Recorder::new());
        reconciler
            .reconcile_as_of(appointments, test_today())
            .unwrap();
        reconciler.sink_mut().take();
        reconciler
    }

    fn in_the_past(mut appointment: Appointment) -> Appointment {
        appointment.start -= Duration::days(10);
        appointment.end -= Duration::days(10);
        appointment
    }

    #[test]
    fn test_new_item_emits_new() {
        let mut reconciler = Reconciler::new(Recorder::new());
        let x = make_test_appointment("x", "1");

        let stats = reconciler.reconcile_as_of(&[x.clone()], test_today()).unwrap();

        assert_eq!(reconciler.sink().kinds(), vec![ChangeKind::New]);
        assert_eq!(reconciler.sink().events()[0].appointment(), &x);
        assert_eq!(reconciler.count(), 1);
        assert_eq!(stats.created, 1);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let incoming = vec![
            make_test_appointment("a", "1"),
            make_test_appointment("b", "1"),
        ];
        let mut reconciler = reconciler_with(&incoming);
        let before = reconciler.appointments().to_vec();

        let stats = reconciler.reconcile_as_of(&incoming, test_today()).unwrap();

        assert!(reconciler.sink().events().is_empty());
        assert!(stats.is_quiet());
        assert_eq!(reconciler.appointments(), before.as_slice());
    }

    #[test]
    fn test_past_removal_is_silent() {
        let past = in_the_past(make_test_appointment("a", "1"));
        let mut reconciler = reconciler_with(&[past]);

        let stats = reconciler.reconcile_as_of(&[], test_today()).unwrap();

        assert!(reconciler.sink().events().is_empty());
        assert_eq!(reconciler.count(), 0);
        assert_eq!(stats.expired, 1);
    }

    #[test]
    fn test_future_removal_emits_deleted() {
        let a = make_test_appointment("a", "1");
        let b = make_test_appointment("b", "1");
        let mut reconciler = reconciler_with(&[a.clone(), b.clone()]);

        reconciler.reconcile_as_of(&[b], test_today()).unwrap();

        assert_eq!(reconciler.sink().kinds(), vec![ChangeKind::Deleted]);
        assert_eq!(reconciler.sink().events()[0].appointment(), &a);
        assert_eq!(reconciler.count(), 1);
    }

    #[test]
    fn test_appointment_ending_today_counts_as_future() {
        let mut a = make_test_appointment("a", "1");
        a.start = test_today().and_hms_opt(0, 0, 0).unwrap() - Duration::days(1);
        a.end = test_today().and_hms_opt(0, 30, 0).unwrap();
        let mut reconciler = reconciler_with(&[a]);

        reconciler.reconcile_as_of(&[], test_today()).unwrap();

        assert_eq!(reconciler.sink().kinds(), vec![ChangeKind::Deleted]);
    }

    #[test]
    fn test_cancellation_is_terminal() {
        let a1 = make_test_appointment("a", "1");
        let mut a2 = make_test_appointment("a", "2");
        a2.is_cancelled = true;
        a2.location = "Room 2".to_string();
        a2.required_attendees.push(make_test_attendee("x@example.com"));
        let mut reconciler = reconciler_with(&[a1]);

        reconciler.reconcile_as_of(&[a2.clone()], test_today()).unwrap();

        assert_eq!(reconciler.sink().kinds(), vec![ChangeKind::Cancelled]);
        assert_eq!(reconciler.sink().events()[0].appointment(), &a2);
        assert_eq!(reconciler.count(), 0);
    }

    #[test]
    fn test_cancelled_item_comes_back_as_new_next_pass() {
        let a1 = make_test_appointment("a", "1");
        let mut a2 = make_test_appointment("a", "2");
        a2.is_cancelled = true;
        let mut reconciler = reconciler_with(&[a1]);

        reconciler.reconcile_as_of(&[a2.clone()], test_today()).unwrap();
        reconciler.reconcile_as_of(&[a2], test_today()).unwrap();

        assert_eq!(
            reconciler.sink().kinds(),
            vec![ChangeKind::Cancelled, ChangeKind::New]
        );
    }

    #[test]
    fn test_location_change_beats_attendee_change() {
        let mut a1 = make_test_appointment("a", "1");
        a1.location = "Room1".to_string();
        let mut a2 = make_test_appointment("a", "2");
        a2.location = "Room2".to_string();
        a2.required_attendees.push(make_test_attendee("x@example.com"));
        let mut reconciler = reconciler_with(&[a1]);

        reconciler.reconcile_as_of(&[a2.clone()], test_today()).unwrap();

        assert_eq!(
            reconciler.sink().kinds(),
            vec![ChangeKind::LocationOrDateChanged]
        );
        assert_eq!(reconciler.appointments(), &[a2]);
    }

    #[test]
    fn test_date_change_emits_single_combined_event() {
        let a1 = make_test_appointment("a", "1");
        let mut a2 = make_test_appointment("a", "2");
        a2.start += Duration::days(1);
        a2.end += Duration::days(1);
        a2.location = "Elsewhere".to_string();
        let mut reconciler = reconciler_with(&[a1]);

        reconciler.reconcile_as_of(&[a2], test_today()).unwrap();

        assert_eq!(
            reconciler.sink().kinds(),
            vec![ChangeKind::LocationOrDateChanged]
        );
    }

    #[test]
    fn test_attendee_only_delta() {
        let a1 = make_test_appointment("a", "1");
        let mut a2 = make_test_appointment("a", "2");
        a2.optional_attendees.push(make_test_attendee("x@example.com"));
        let mut reconciler = reconciler_with(&[a1]);

        reconciler.reconcile_as_of(&[a2.clone()], test_today()).unwrap();

        assert_eq!(reconciler.sink().kinds(), vec![ChangeKind::AttendeesChanged]);
        assert_eq!(reconciler.appointments(), &[a2]);
    }

    #[test]
    fn test_unclassified_delta_still_merges() {
        let a1 = make_test_appointment("a", "1");
        let mut a2 = make_test_appointment("a", "2");
        a2.subject = "Renamed".to_string();
        a2.start += Duration::minutes(30);
        let mut reconciler = reconciler_with(&[a1]);

        let stats = reconciler.reconcile_as_of(&[a2.clone()], test_today()).unwrap();

        assert!(reconciler.sink().events().is_empty());
        assert_eq!(reconciler.appointments(), &[a2]);
        assert_eq!(stats.merged, 1);
    }

    #[test]
    fn test_same_version_is_not_diffed() {
        let a1 = make_test_appointment("a", "1");
        let mut same_revision = a1.clone();
        same_revision.location = "Somewhere else".to_string();
        let mut reconciler = reconciler_with(&[a1.clone()]);

        reconciler
            .reconcile_as_of(&[same_revision], test_today())
            .unwrap();

        assert!(reconciler.sink().events().is_empty());
        assert_eq!(reconciler.appointments(), &[a1]);
    }

    #[test]
    fn test_recurring_instances_are_distinct() {
        let mut first = make_test_appointment("series", "1");
        first.stable_id.recurrence_id = "20250320T090000".to_string();
        let mut second = make_test_appointment("series", "1");
        second.stable_id.recurrence_id = "20250327T090000".to_string();

        let mut reconciler = Reconciler::new(Recorder::new());
        reconciler
            .reconcile_as_of(&[first, second], test_today())
            .unwrap();

        assert_eq!(reconciler.count(), 2);
        assert_eq!(
            reconciler.sink().kinds(),
            vec![ChangeKind::New, ChangeKind::New]
        );
    }

    #[test]
    fn test_reconcile_one_skips_removal_detection() {
        let a = make_test_appointment("a", "1");
        let mut reconciler = reconciler_with(&[a]);

        reconciler
            .reconcile_one(&make_test_appointment("b", "1"))
            .unwrap();

        assert_eq!(reconciler.count(), 2);
        assert_eq!(reconciler.sink().kinds(), vec![ChangeKind::New]);
    }

    #[test]
    fn test_scoped_pass_keeps_unfetched_resources() {
        let mut room1 = make_test_appointment("a", "1");
        room1.resource = Some(ResourceId::from("room1@example.com"));
        let mut room2 = make_test_appointment("b", "1");
        room2.resource = Some(ResourceId::from("room2@example.com"));
        let mut reconciler = reconciler_with(&[room1, room2]);

        // room2 fetched fine and is now empty; room1's fetch failed
        let scope: HashSet<_> = [ResourceId::from("room2@example.com")].into();
        reconciler
            .reconcile_scoped(&[], &scope, test_today())
            .unwrap();

        assert_eq!(reconciler.sink().kinds(), vec![ChangeKind::Deleted]);
        assert_eq!(reconciler.count(), 1);
        assert_eq!(reconciler.appointments()[0].stable_id.ical_uid, "a");
    }

    #[test]
    fn test_scoped_pass_expires_past_entries_of_any_resource() {
        let mut retired = make_test_appointment("a", "1");
        retired.resource = Some(ResourceId::from("decommissioned@example.com"));
        let mut reconciler = reconciler_with(&[retired]);

        let scope: HashSet<_> = [ResourceId::from("room2@example.com")].into();
        let a_year_later = test_today() + Duration::days(365);
        let stats = reconciler
            .reconcile_scoped(&[], &scope, a_year_later)
            .unwrap();

        assert_eq!(reconciler.count(), 0);
        assert_eq!(stats.expired, 1);
        assert!(reconciler.sink().events().is_empty());
    }

    #[test]
    fn test_same_meeting_in_two_rooms_keeps_flipping() {
        // One booking seen through two room mailboxes: same iCal UID, but each
        // mailbox has its own item id and change key.
        let mut via_room1 = make_test_appointment("shared", "ck-room1");
        via_room1.version_id.unique_id = "item-room1".to_string();
        via_room1.resource = Some(ResourceId::from("room1@example.com"));
        let mut via_room2 = make_test_appointment("shared", "ck-room2");
        via_room2.version_id.unique_id = "item-room2".to_string();
        via_room2.resource = Some(ResourceId::from("room2@example.com"));
        let incoming = vec![via_room1, via_room2.clone()];

        let mut reconciler = reconciler_with(&incoming);
        let stats = reconciler.reconcile_as_of(&incoming, test_today()).unwrap();

        assert_eq!(reconciler.count(), 1);
        assert_eq!(reconciler.appointments(), &[via_room2]);
        assert_eq!(stats.merged, 2);
        assert!(!stats.is_quiet());
        assert!(reconciler.sink().events().is_empty());
    }

    struct FailingSink;

    impl EventSink for FailingSink {
        fn emit(&mut self, _event: ChangeEvent) -> RoomSyncResult<()> {
            Err(RoomSyncError::Sink("downstream unavailable".into()))
        }
    }

    #[test]
    fn test_sink_failure_does_not_roll_back() {
        let mut reconciler = Reconciler::new(FailingSink);

        let stats = reconciler
            .reconcile_as_of(
                &[
                    make_test_appointment("a", "1"),
                    make_test_appointment("b", "1"),
                ],
                test_today(),
            )
            .unwrap();

        assert_eq!(reconciler.count(), 2);
        assert_eq!(stats.created, 2);
        assert_eq!(stats.emit_failures, 2);
    }
}
