//! Treatment worker pool: three threads draining the emergency and
//! appointment queues. Worker 2 is the appointment specialist (tries
//! appointment first, emergency second); workers 0 and 1 are the inverse.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use common::lab::LabJob;
use common::message::{MedItem, PharmJob, PharmMsg, Priority, Sender, TriageMsg};
use common::{Patient, PatientKind, Tick};
use ipc::bus::TriagePendingEntry;
use ipc::{clock, Bus};

use crate::queues::{AppointmentQueue, EmergencyQueue};

pub const TRIAGE_OPERATION_ID_MIN: u64 = 1000;
pub const TRIAGE_OPERATION_ID_MAX: u64 = 1999;

/// Allocates operation ids from the 1000..1999 range reserved for triage,
/// wrapping back to the start rather than growing unbounded — by the time
/// it wraps, operation ids that low are long since retired from the
/// pending list (8000-tick expiry bounds how long one stays live).
pub struct OperationIdAllocator {
    next: AtomicU64,
}

impl OperationIdAllocator {
    pub fn new() -> Self {
        OperationIdAllocator { next: AtomicU64::new(TRIAGE_OPERATION_ID_MIN) }
    }

    pub fn allocate(&self) -> u64 {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        if id > TRIAGE_OPERATION_ID_MAX {
            self.next.store(TRIAGE_OPERATION_ID_MIN + 1, Ordering::Relaxed);
            TRIAGE_OPERATION_ID_MIN
        } else {
            id
        }
    }
}

impl Default for OperationIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Wakes blocked treatment workers whenever either admission queue grows.
#[derive(Default)]
pub struct ReadyNotifier {
    gate: Mutex<()>,
    ready: Condvar,
}

impl ReadyNotifier {
    pub fn notify_all(&self) {
        self.ready.notify_all();
    }

    pub fn wait_briefly(&self) {
        let guard = self.gate.lock().unwrap_or_else(|e| e.into_inner());
        let _ = self.ready.wait_timeout(guard, Duration::from_millis(20));
    }
}

fn priority_for(patient: &Patient, critical_threshold: i32) -> Priority {
    if patient.stability <= critical_threshold || patient.priority == 1 {
        Priority::Urgent
    } else if patient.stability < 2 * critical_threshold || patient.priority == 2 {
        Priority::High
    } else {
        Priority::Normal
    }
}

/// Worker ids 0 and 1 try emergency first; worker id 2 is the appointment
/// specialist and tries appointment first.
fn pick_patient(
    worker_id: usize,
    emergency: &EmergencyQueue,
    appointment: &AppointmentQueue,
    current_tick: Tick,
) -> Option<(Patient, bool)> {
    if worker_id == 2 {
        if let Some(p) = appointment.pop_due(current_tick) {
            return Some((p, false));
        }
        emergency.pop_front().map(|p| (p, true))
    } else {
        if let Some(p) = emergency.pop_front() {
            return Some((p, true));
        }
        appointment.pop_due(current_tick).map(|p| (p, false))
    }
}

pub fn run(
    worker_id: usize,
    bus: Arc<Bus>,
    emergency: Arc<EmergencyQueue>,
    appointment: Arc<AppointmentQueue>,
    notifier: Arc<ReadyNotifier>,
    op_ids: Arc<OperationIdAllocator>,
) {
    let critical_threshold = bus.config.triage.critical_threshold;
    let time_unit_ms = bus.config.time_unit_ms;

    while !bus.control.should_stop() {
        let current_tick = bus.clock.current();
        let picked = pick_patient(worker_id, &emergency, &appointment, current_tick);
        let (patient, is_emergency) = match picked {
            Some(p) => p,
            None => {
                notifier.wait_briefly();
                continue;
            }
        };

        let duration = if is_emergency {
            bus.config.triage.triage_emergency_duration
        } else {
            bus.config.triage.triage_appointment_duration
        };
        clock::wait_ticks(duration, time_unit_ms);

        let wait_time = bus.clock.current().saturating_sub(patient.arrival_tick);
        bus.stats.record_triage_wait_time(wait_time);

        let needs_labs = patient.needs_labs();
        let needs_meds = patient.needs_meds();
        if !needs_labs && !needs_meds {
            bus.stats.patient_completed();
            continue;
        }

        let operation_id = op_ids.allocate();
        let priority = priority_for(&patient, critical_threshold);

        if needs_labs {
            bus.lab_queue.inbound.send(
                priority,
                LabJob {
                    operation_id,
                    patient_id: patient.id.clone(),
                    tests: patient.tests.clone(),
                    request_tick: current_tick,
                    sender: Sender::Triage,
                    priority,
                },
            );
        }
        if needs_meds {
            bus.pharmacy_inbound.send(
                priority,
                PharmMsg(PharmJob {
                    operation_id,
                    patient_id: patient.id.clone(),
                    items: patient
                        .meds
                        .iter()
                        .map(|name| MedItem { name: name.clone(), qty: 1 })
                        .collect(),
                    request_tick: current_tick,
                    sender: Sender::Triage,
                    priority,
                }),
            );
        }

        bus.triage_pending.insert(
            operation_id,
            TriagePendingEntry {
                patient_id: patient.id.clone(),
                needs_labs,
                needs_meds,
                labs_ok: false,
                meds_ok: false,
            },
            current_tick,
        );
    }
}

/// Handles an inbound `Admit` message: routes to the right queue, counting
/// rejection when at capacity.
pub fn admit(
    bus: &Bus,
    emergency: &EmergencyQueue,
    appointment: &AppointmentQueue,
    notifier: &ReadyNotifier,
    msg: TriageMsg,
) {
    if let TriageMsg::Admit(patient) = msg {
        let kind = patient.kind;
        let inserted = match kind {
            PatientKind::Emergency => emergency.insert(patient),
            PatientKind::Appointment => appointment.insert(patient),
        };
        if !inserted {
            bus.stats.patient_rejected();
            tracing::warn!("triage admission rejected: queue at capacity");
        } else {
            match kind {
                PatientKind::Emergency => bus.stats.emergency_admitted(),
                PatientKind::Appointment => bus.stats.appointment_admitted(),
            }
            notifier.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_id_allocator_stays_in_range_and_wraps() {
        let alloc = OperationIdAllocator::new();
        let first = alloc.allocate();
        assert_eq!(first, TRIAGE_OPERATION_ID_MIN);
        for _ in 0..(TRIAGE_OPERATION_ID_MAX - TRIAGE_OPERATION_ID_MIN) {
            alloc.allocate();
        }
        let wrapped = alloc.allocate();
        assert_eq!(wrapped, TRIAGE_OPERATION_ID_MIN);
    }

    #[test]
    fn priority_stamping_matches_thresholds() {
        let mut p = Patient::new_emergency("PAC00001".into(), 0, 3, 50, vec![], vec![]);
        assert_eq!(priority_for(&p, 100), Priority::Urgent);
        p.stability = 150;
        assert_eq!(priority_for(&p, 100), Priority::High);
        p.stability = 500;
        assert_eq!(priority_for(&p, 100), Priority::Normal);
        p.priority = 1;
        p.stability = 500;
        assert_eq!(priority_for(&p, 100), Priority::Urgent);
    }

    #[test]
    fn admit_past_capacity_counts_only_rejection_not_admission() {
        let config: common::config::Config = toml::from_str(
            r#"
            time_unit_ms = 1
            max_emergency_patients = 1
            max_appointments = 10
            max_surgeries_pending = 10
            [triage]
            triage_emergency_duration = 1
            triage_appointment_duration = 1
            critical_threshold = 100
            [surgery]
            bo1_min_duration = 1
            bo1_max_duration = 1
            bo2_min_duration = 1
            bo2_max_duration = 1
            bo3_min_duration = 1
            bo3_max_duration = 1
            cleanup_min_time = 1
            cleanup_max_time = 1
            max_medical_teams = 1
            [pharmacy]
            pharmacy_prep_time_min = 1
            pharmacy_prep_time_max = 1
            auto_restock_enabled = false
            restock_qty_multiplier = 1
            [lab]
            lab1_min_duration = 1
            lab1_max_duration = 1
            lab2_min_duration = 1
            lab2_max_duration = 1
            max_simultaneous_tests_lab1 = 1
            max_simultaneous_tests_lab2 = 1
            "#,
        )
        .unwrap();
        let bus = Bus::new(config);
        let emergency = EmergencyQueue::new(1);
        let appointment = AppointmentQueue::new(10);
        let notifier = ReadyNotifier::default();

        let first = Patient::new_emergency("PAC00001".into(), 0, 1, 500, vec![], vec![]);
        admit(&bus, &emergency, &appointment, &notifier, TriageMsg::Admit(first));
        let second = Patient::new_emergency("PAC00002".into(), 0, 1, 500, vec![], vec![]);
        admit(&bus, &emergency, &appointment, &notifier, TriageMsg::Admit(second));

        let snap = bus.stats.snapshot();
        assert_eq!(snap.emergencies_admitted, 1);
        assert_eq!(snap.rejected_patients, 1);
    }

    #[test]
    fn worker_2_tries_appointment_queue_first() {
        let emergency = EmergencyQueue::new(10);
        let appointment = AppointmentQueue::new(10);
        appointment.insert(common::Patient::new_appointment(
            "PAC00001".into(),
            0,
            0,
            common::patient::Specialty::Cardio,
            vec![],
        ));
        let picked = pick_patient(2, &emergency, &appointment, 0);
        assert!(picked.is_some());
        assert!(!picked.unwrap().1);
    }
}
