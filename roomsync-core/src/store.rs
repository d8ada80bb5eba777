//! In-memory mirror of the currently known appointments.

use crate::appointment::{Appointment, StableId};

/// Appointments keyed by stable identity, in insertion order.
///
/// Holds at most one entry per `StableId`. There is no locking here; the
/// reconciler owning the store is the only writer.
#[derive(Debug, Default, Clone)]
pub struct SnapshotStore {
    appointments: Vec<Appointment>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new appointment, or replace the stored revision in place.
    pub fn upsert(&mut self, appointment: Appointment) {
        match self.position(&appointment.stable_id) {
            Some(index) => self.appointments[index] = appointment,
            None => self.appointments.push(appointment),
        }
    }

    /// Remove by stable identity. Removing an unknown appointment is a no-op.
    pub fn remove(&mut self, appointment: &Appointment) -> Option<Appointment> {
        let index = self.position(&appointment.stable_id)?;
        Some(self.appointments.remove(index))
    }

    pub fn find_by_stable_id(&self, stable_id: &StableId) -> Option<&Appointment> {
        self.appointments.iter().find(|a| &a.stable_id == stable_id)
    }

    pub fn count(&self) -> usize {
        self.appointments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.appointments.is_empty()
    }

    pub fn all(&self) -> &[Appointment] {
        &self.appointments
    }

    fn position(&self, stable_id: &StableId) -> Option<usize> {
        self.appointments
            .iter()
            .position(|a| &a.stable_id == stable_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::make_test_appointment;

    #[test]
    fn test_upsert_inserts_then_replaces_in_place() {
        let mut store = SnapshotStore::new();
        store.upsert(make_test_appointment("a", "1"));
        store.upsert(make_test_appointment("b", "1"));
        store.upsert(make_test_appointment("c", "1"));

        let mut updated = make_test_appointment("b", "2");
        updated.subject = "Renamed".to_string();
        store.upsert(updated);

        assert_eq!(store.count(), 3);
        let uids: Vec<_> = store
            .all()
            .iter()
            .map(|a| a.stable_id.ical_uid.as_str())
            .collect();
        assert_eq!(uids, vec!["a", "b", "c"]);
        assert_eq!(store.all()[1].subject, "Renamed");
        assert_eq!(store.all()[1].version_id.change_key, "2");
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut store = SnapshotStore::new();
        store.upsert(make_test_appointment("a", "1"));

        assert!(store.remove(&make_test_appointment("zzz", "1")).is_none());
        assert_eq!(store.count(), 1);

        // Removal matches on stable identity, not version
        assert!(store.remove(&make_test_appointment("a", "9")).is_some());
        assert!(store.is_empty());
    }

    #[test]
    fn test_find_by_stable_id() {
        let mut store = SnapshotStore::new();
        let appointment = make_test_appointment("a", "1");
        store.upsert(appointment.clone());

        assert_eq!(
            store.find_by_stable_id(&appointment.stable_id),
            Some(&appointment)
        );
        assert!(
            store
                .find_by_stable_id(&StableId::new("a", "20250101T000000"))
                .is_none()
        );
    }
}
