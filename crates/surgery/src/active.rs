//! The active-surgeries index: a back-reference registry the dispatcher
//! consults to route `MSG_LAB_RESULTS_READY`/`MSG_PHARM_READY` to a worker
//! still waiting on its dependencies. The worker, not the index, owns the
//! `Surgery` record; the index only lets the dispatcher reach it.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};

use common::Surgery;

/// One entry per surgery currently owned by a live worker thread. `changed`
/// is notified whenever the dispatcher flips a dependency flag, waking the
/// worker blocked in its await-deps phase.
pub struct SurgerySlot {
    pub surgery: Mutex<Surgery>,
    pub changed: Condvar,
}

impl SurgerySlot {
    pub fn new(surgery: Surgery) -> Self {
        SurgerySlot {
            surgery: Mutex::new(surgery),
            changed: Condvar::new(),
        }
    }
}

#[derive(Default)]
pub struct ActiveSurgeries {
    entries: Mutex<HashMap<u64, Arc<SurgerySlot>>>,
}

impl ActiveSurgeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, surgery_id: u64, slot: Arc<SurgerySlot>) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(surgery_id, slot);
    }

    pub fn get(&self, surgery_id: u64) -> Option<Arc<SurgerySlot>> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&surgery_id)
            .cloned()
    }

    pub fn remove(&self, surgery_id: u64) {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).remove(&surgery_id);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::surgery::Urgency;
    use common::patient::Specialty;

    fn sample(id: u64) -> Surgery {
        Surgery::new(id, "PAC00001".into(), Specialty::Cardio, Urgency::High, 10, 5, vec![], vec![])
    }

    #[test]
    fn register_then_lookup_round_trips() {
        let index = ActiveSurgeries::new();
        index.register(1, Arc::new(SurgerySlot::new(sample(1))));
        assert!(index.get(1).is_some());
        index.remove(1);
        assert!(index.get(1).is_none());
    }

    #[test]
    fn changed_condvar_wakes_a_waiting_worker() {
        let slot = Arc::new(SurgerySlot::new(sample(2)));
        let slot2 = slot.clone();
        let handle = std::thread::spawn(move || {
            let guard = slot2.surgery.lock().unwrap();
            let (guard, _) = slot2
                .changed
                .wait_timeout_while(guard, std::time::Duration::from_secs(1), |s| !s.tests_done)
                .unwrap();
            guard.tests_done
        });
        std::thread::sleep(std::time::Duration::from_millis(20));
        {
            let mut guard = slot.surgery.lock().unwrap();
            guard.tests_done = true;
        }
        slot.changed.notify_all();
        assert!(handle.join().unwrap());
    }
}
