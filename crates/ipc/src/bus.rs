//! The shared-state region: every queue, semaphore, and mutex-guarded table
//! a subsystem coordinator needs, collected behind one `Arc<Bus>` and handed
//! to each coordinator's spawn function. This is the single-process
//! replacement for the original design's named shared-memory segments.

use std::sync::Arc;

use common::config::Config;
use common::message::{ManagerFeedbackMsg, PharmMsg, SurgeryMsg, TriageMsg};
use common::Surgery;

use crate::clock::SharedClock;
use crate::control::ControlStore;
use crate::lab_pool::LabWorkQueue;
use crate::pending::PendingList;
use crate::queue::PriorityQueue;
use crate::rooms::RoomTable;
use crate::semaphore::CountingSemaphore;
use crate::stats::Stats;
use crate::stock::StockTable;

/// Per-patient bookkeeping kept in the triage pending list while it waits on
/// async lab/pharmacy responses.
pub struct TriagePendingEntry {
    pub patient_id: String,
    pub needs_labs: bool,
    pub needs_meds: bool,
    pub labs_ok: bool,
    pub meds_ok: bool,
}

impl TriagePendingEntry {
    pub fn satisfied(&self) -> bool {
        (!self.needs_labs || self.labs_ok) && (!self.needs_meds || self.meds_ok)
    }
}

pub struct Bus {
    pub config: Config,
    pub clock: Arc<SharedClock>,
    pub control: Arc<ControlStore>,
    pub stats: Arc<Stats>,
    pub rooms: Arc<RoomTable>,
    pub stock: Arc<StockTable>,
    pub medical_teams: Arc<CountingSemaphore>,
    pub lab_queue: Arc<LabWorkQueue>,
    pub pharmacy_concurrency: Arc<CountingSemaphore>,

    pub triage_inbound: Arc<PriorityQueue<TriageMsg>>,
    pub surgery_inbound: Arc<PriorityQueue<SurgeryMsg>>,
    pub pharmacy_inbound: Arc<PriorityQueue<PharmMsg>>,
    pub manager_feedback: Arc<PriorityQueue<ManagerFeedbackMsg>>,

    pub triage_pending: Arc<PendingList<u64, TriagePendingEntry>>,
    pub surgery_pending: Arc<PendingList<u64, Surgery>>,
}

impl Bus {
    pub fn new(config: Config) -> Self {
        let stock = StockTable::new(&config.pharmacy.medications);
        let medical_teams = CountingSemaphore::new(config.surgery.max_medical_teams as usize);
        let lab_queue = LabWorkQueue::new(
            config.lab.max_simultaneous_tests_lab1 as usize,
            config.lab.max_simultaneous_tests_lab2 as usize,
        );
        // Pharmacy concurrency is fixed at 4 per the Design Notes' shared-
        // resource policy, independent of the medication table size.
        let pharmacy_concurrency = CountingSemaphore::new(4);

        Bus {
            config,
            clock: Arc::new(SharedClock::new()),
            control: Arc::new(ControlStore::new()),
            stats: Arc::new(Stats::new()),
            rooms: Arc::new(RoomTable::new()),
            stock: Arc::new(stock),
            medical_teams: Arc::new(medical_teams),
            lab_queue: Arc::new(lab_queue),
            pharmacy_concurrency: Arc::new(pharmacy_concurrency),
            triage_inbound: Arc::new(PriorityQueue::new()),
            surgery_inbound: Arc::new(PriorityQueue::new()),
            pharmacy_inbound: Arc::new(PriorityQueue::new()),
            manager_feedback: Arc::new(PriorityQueue::new()),
            triage_pending: Arc::new(PendingList::new()),
            surgery_pending: Arc::new(PendingList::new()),
        }
    }

    /// Shuts down every blocking primitive so subsystem worker threads
    /// observing it unblock within one tick, per the suspension-points
    /// invariant.
    pub fn shutdown(&self) {
        tracing::info!("bus shutdown: waking every queue and semaphore");
        self.control.set_shutdown(true);
        self.triage_inbound.shutdown();
        self.surgery_inbound.shutdown();
        self.pharmacy_inbound.shutdown();
        self.manager_feedback.shutdown();
        self.lab_queue.shutdown();
        self.rooms.shutdown();
        self.medical_teams.shutdown();
        self.pharmacy_concurrency.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_entry_waits_for_both_flags() {
        let mut entry = TriagePendingEntry {
            patient_id: "PAC00001".into(),
            needs_labs: true,
            needs_meds: true,
            labs_ok: false,
            meds_ok: false,
        };
        assert!(!entry.satisfied());
        entry.labs_ok = true;
        assert!(!entry.satisfied());
        entry.meds_ok = true;
        assert!(entry.satisfied());
    }

    #[test]
    fn pending_entry_with_no_dependencies_is_immediately_satisfied() {
        let entry = TriagePendingEntry {
            patient_id: "PAC00002".into(),
            needs_labs: false,
            needs_meds: false,
            labs_ok: false,
            meds_ok: false,
        };
        assert!(entry.satisfied());
    }
}
