//! Single consumer of `surgery_inbound`, drained strictly FIFO (surgery
//! requests carry no priority class) so response messages interleave
//! naturally with new requests. Spawns one worker thread per surgery and
//! routes dependency-ready responses to whichever thread, if any, is still
//! waiting on them.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use common::config::MAX_WAIT_DEPENDENCIES_TIME;
use common::message::SurgeryMsg;
use ipc::Bus;

use crate::active::{ActiveSurgeries, SurgerySlot};
use crate::worker;

pub fn run(bus: Arc<Bus>, active: Arc<ActiveSurgeries>) {
    loop {
        let msg = match bus.surgery_inbound.recv_timeout(Duration::from_millis(50)) {
            Some(msg) => msg,
            None => {
                if bus.control.should_stop() && bus.surgery_inbound.is_shutdown() {
                    break;
                }
                age_pending(&bus);
                continue;
            }
        };

        match msg {
            SurgeryMsg::Request(surgery) => {
                let surgery_id = surgery.surgery_id;
                let slot = Arc::new(SurgerySlot::new(surgery));
                active.register(surgery_id, slot.clone());
                spawn_worker(&bus, &active, slot, surgery_id, false);
            }
            SurgeryMsg::LabResultsReady { surgery_id, .. } => {
                mark_and_wake(&bus, &active, surgery_id, |s| s.tests_done = true);
            }
            SurgeryMsg::PharmReady { surgery_id, .. } => {
                mark_and_wake(&bus, &active, surgery_id, |s| s.meds_ok = true);
            }
            SurgeryMsg::PharmFailed { surgery_id, reason, .. } => {
                tracing::warn!(surgery_id, %reason, "surgery pharmacy dependency failed");
            }
        }

        age_pending(&bus);
    }
}

fn spawn_worker(
    bus: &Arc<Bus>,
    active: &Arc<ActiveSurgeries>,
    slot: Arc<SurgerySlot>,
    surgery_id: u64,
    skip_deps_phase: bool,
) {
    let bus = bus.clone();
    let active = active.clone();
    thread::spawn(move || worker::run(bus, active, slot, surgery_id, skip_deps_phase));
}

/// Sets a dependency flag on either the active record (waking its worker) or
/// the pending record (promoting it back to a live worker once both
/// dependencies are satisfied).
fn mark_and_wake(bus: &Arc<Bus>, active: &Arc<ActiveSurgeries>, surgery_id: u64, mark: impl FnOnce(&mut common::Surgery)) {
    if let Some(slot) = active.get(surgery_id) {
        {
            let mut surgery = slot.surgery.lock().unwrap_or_else(|e| e.into_inner());
            mark(&mut surgery);
        }
        slot.changed.notify_all();
        return;
    }

    let satisfied = bus.surgery_pending.with_mut(&surgery_id, |surgery| {
        mark(surgery);
        surgery.dependencies_satisfied()
    });

    if satisfied == Some(true) {
        if let Some(surgery) = bus.surgery_pending.remove(&surgery_id) {
            let slot = Arc::new(SurgerySlot::new(surgery));
            active.register(surgery_id, slot.clone());
            spawn_worker(bus, active, slot, surgery_id, true);
        }
    }
}

fn age_pending(bus: &Bus) {
    let current_tick = bus.clock.current();
    let expired = bus.surgery_pending.expire(current_tick, MAX_WAIT_DEPENDENCIES_TIME);
    for (surgery_id, _surgery) in expired {
        bus.stats.surgery_cancelled();
        tracing::warn!(surgery_id, "surgery pending entry expired, cancelled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::patient::Specialty;
    use common::surgery::Urgency;
    use common::Surgery;

    fn cfg() -> common::config::Config {
        toml::from_str(
            r#"
            time_unit_ms = 1
            max_emergency_patients = 10
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
        .unwrap()
    }

    #[test]
    fn mark_and_wake_promotes_pending_record_once_satisfied() {
        let bus = Bus::new(cfg());
        let active = Arc::new(ActiveSurgeries::new());
        let surgery = Surgery::new(
            7,
            "PAC00001".into(),
            Specialty::Ortho,
            Urgency::Medium,
            0,
            10,
            vec![common::lab::TestKind::Preop],
            vec!["ANALGESICO_A".into()],
        );
        bus.surgery_pending.insert(7, surgery, 0);

        let bus = Arc::new(bus);
        mark_and_wake(&bus, &active, 7, |s| s.tests_done = true);
        assert!(bus.surgery_pending.contains(&7));
        assert!(active.get(7).is_none());

        mark_and_wake(&bus, &active, 7, |s| s.meds_ok = true);
        assert!(!bus.surgery_pending.contains(&7));
        assert!(active.get(7).is_some());
    }
}
