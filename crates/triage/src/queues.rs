//! Emergency and appointment admission queues. Each is a sorted `Vec` with
//! its own mutex and condvar — small enough (bounded by `max_emergency`/
//! `max_appointments`) that a `Vec` with insertion sort beats a heap for
//! the composite ordering these need.

use std::sync::{Condvar, Mutex};

use common::Patient;

fn emergency_rank(p: &Patient) -> (std::cmp::Reverse<bool>, u8, u64) {
    (std::cmp::Reverse(p.is_critical), p.priority, p.arrival_tick)
}

/// Sorted by (critical desc, priority asc, arrival asc) — the head is
/// always the next patient a treatment worker should pick.
pub struct EmergencyQueue {
    patients: Mutex<Vec<Patient>>,
    not_empty: Condvar,
    capacity: usize,
}

impl EmergencyQueue {
    pub fn new(capacity: usize) -> Self {
        EmergencyQueue {
            patients: Mutex::new(Vec::new()),
            not_empty: Condvar::new(),
            capacity,
        }
    }

    /// Returns `false` (no state change) if already at capacity.
    pub fn insert(&self, patient: Patient) -> bool {
        let mut guard = self.patients.lock().unwrap_or_else(|e| e.into_inner());
        if guard.len() >= self.capacity {
            return false;
        }
        let pos = guard.partition_point(|existing| emergency_rank(existing) <= emergency_rank(&patient));
        guard.insert(pos, patient);
        drop(guard);
        self.not_empty.notify_all();
        true
    }

    /// Re-sorts in place after a patient's `priority`/`is_critical` changed
    /// (vital monitor crossing into critical).
    pub fn resort(&self) {
        let mut guard = self.patients.lock().unwrap_or_else(|e| e.into_inner());
        guard.sort_by_key(emergency_rank);
    }

    pub fn pop_front(&self) -> Option<Patient> {
        let mut guard = self.patients.lock().unwrap_or_else(|e| e.into_inner());
        if guard.is_empty() {
            None
        } else {
            Some(guard.remove(0))
        }
    }

    pub fn len(&self) -> usize {
        self.patients.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Applies `f` to every patient (the vital monitor's decay pass) and
    /// removes any for which `f` returns `false` (death), returning the
    /// removed patients.
    pub fn retain_decay(&self, mut f: impl FnMut(&mut Patient) -> bool) -> Vec<Patient> {
        let mut guard = self.patients.lock().unwrap_or_else(|e| e.into_inner());
        let mut dead = Vec::new();
        let mut i = 0;
        while i < guard.len() {
            if f(&mut guard[i]) {
                i += 1;
            } else {
                dead.push(guard.remove(i));
            }
        }
        guard.sort_by_key(emergency_rank);
        dead
    }

    pub fn notify_waiters(&self) {
        self.not_empty.notify_all();
    }
}

/// Sorted by `scheduled_tick` ascending.
pub struct AppointmentQueue {
    patients: Mutex<Vec<Patient>>,
    not_empty: Condvar,
    capacity: usize,
}

impl AppointmentQueue {
    pub fn new(capacity: usize) -> Self {
        AppointmentQueue {
            patients: Mutex::new(Vec::new()),
            not_empty: Condvar::new(),
            capacity,
        }
    }

    pub fn insert(&self, patient: Patient) -> bool {
        let mut guard = self.patients.lock().unwrap_or_else(|e| e.into_inner());
        if guard.len() >= self.capacity {
            return false;
        }
        let pos = guard.partition_point(|existing| existing.scheduled_tick <= patient.scheduled_tick);
        guard.insert(pos, patient);
        drop(guard);
        self.not_empty.notify_all();
        true
    }

    /// Pops the head only if its `scheduled_tick` is already due.
    pub fn pop_due(&self, current_tick: common::Tick) -> Option<Patient> {
        let mut guard = self.patients.lock().unwrap_or_else(|e| e.into_inner());
        match guard.first() {
            Some(p) if p.scheduled_tick.map(|t| t <= current_tick).unwrap_or(true) => {
                Some(guard.remove(0))
            }
            _ => None,
        }
    }

    /// Removes and returns a critical appointment patient (flagged by the
    /// vital monitor for promotion into the emergency queue).
    pub fn take_critical(&self) -> Option<Patient> {
        let mut guard = self.patients.lock().unwrap_or_else(|e| e.into_inner());
        let idx = guard.iter().position(|p| p.is_critical)?;
        Some(guard.remove(idx))
    }

    pub fn len(&self) -> usize {
        self.patients.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn notify_waiters(&self) {
        self.not_empty.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::patient::Specialty;

    fn emergency(id: &str, priority: u8, arrival: u64) -> Patient {
        Patient::new_emergency(id.to_string(), arrival, priority, 500, vec![], vec![])
    }

    #[test]
    fn emergency_queue_orders_critical_first_then_priority_then_arrival() {
        let q = EmergencyQueue::new(10);
        q.insert(emergency("PAC00001", 3, 0));
        q.insert(emergency("PAC00002", 1, 1));
        let mut critical = emergency("PAC00003", 5, 2);
        critical.is_critical = true;
        q.insert(critical);

        assert_eq!(q.pop_front().unwrap().id, "PAC00003");
        assert_eq!(q.pop_front().unwrap().id, "PAC00002");
        assert_eq!(q.pop_front().unwrap().id, "PAC00001");
    }

    #[test]
    fn emergency_queue_rejects_past_capacity() {
        let q = EmergencyQueue::new(1);
        assert!(q.insert(emergency("PAC00001", 1, 0)));
        assert!(!q.insert(emergency("PAC00002", 1, 1)));
    }

    #[test]
    fn appointment_queue_orders_by_scheduled_tick() {
        let q = AppointmentQueue::new(10);
        q.insert(Patient::new_appointment("PAC00001".into(), 0, 50, Specialty::Cardio, vec![]));
        q.insert(Patient::new_appointment("PAC00002".into(), 0, 10, Specialty::Ortho, vec![]));

        assert!(q.pop_due(5).is_none());
        assert_eq!(q.pop_due(10).unwrap().id, "PAC00002");
        assert_eq!(q.pop_due(50).unwrap().id, "PAC00001");
    }

    #[test]
    fn retain_decay_removes_patients_that_fail_the_predicate() {
        let q = EmergencyQueue::new(10);
        q.insert(emergency("PAC00001", 1, 0));
        q.insert(emergency("PAC00002", 2, 1));

        let dead = q.retain_decay(|p| {
            p.stability -= 600;
            p.stability > 0
        });
        assert_eq!(dead.len(), 2);
        assert!(q.is_empty());
    }
}
