//! Single consumer of `triage_inbound`: routes `Admit` messages to the
//! matching queue and dependency-completion responses to the pending list,
//! completing a patient once every flag it needs is set.

use std::sync::Arc;
use std::time::Duration;

use common::message::TriageMsg;
use ipc::Bus;

use crate::queues::{AppointmentQueue, EmergencyQueue};
use crate::workers::{admit, ReadyNotifier};

const MAX_WAIT_DEPENDENCIES_TIME: common::Tick = common::config::MAX_WAIT_DEPENDENCIES_TIME;

pub fn run(
    bus: Arc<Bus>,
    emergency: Arc<EmergencyQueue>,
    appointment: Arc<AppointmentQueue>,
    notifier: Arc<ReadyNotifier>,
) {
    loop {
        let msg = match bus.triage_inbound.recv_timeout(Duration::from_millis(50)) {
            Some(msg) => msg,
            None => {
                if bus.control.should_stop() && bus.triage_inbound.is_shutdown() {
                    break;
                }
                age_pending(&bus);
                continue;
            }
        };

        match msg {
            TriageMsg::Admit(_) => admit(&bus, &emergency, &appointment, &notifier, msg),
            TriageMsg::LabResultsReady { operation_id, .. } => {
                complete_if_ready(&bus, operation_id, |entry| entry.labs_ok = true);
            }
            TriageMsg::PharmReady { operation_id, .. } => {
                complete_if_ready(&bus, operation_id, |entry| entry.meds_ok = true);
            }
            TriageMsg::PharmFailed { operation_id, reason, .. } => {
                tracing::warn!(operation_id, %reason, "triage pending patient lost pharmacy dependency");
                bus.triage_pending.remove(&operation_id);
            }
        }

        age_pending(&bus);
    }
}

fn complete_if_ready(bus: &Bus, operation_id: u64, mark: impl FnOnce(&mut ipc::bus::TriagePendingEntry)) {
    let satisfied = bus.triage_pending.with_mut(&operation_id, |entry| {
        mark(entry);
        entry.satisfied()
    });
    if satisfied == Some(true) {
        bus.triage_pending.remove(&operation_id);
        bus.stats.patient_completed();
    }
}

fn age_pending(bus: &Bus) {
    let current_tick = bus.clock.current();
    let expired = bus.triage_pending.expire(current_tick, MAX_WAIT_DEPENDENCIES_TIME);
    for (operation_id, entry) in expired {
        tracing::warn!(operation_id, patient_id = %entry.patient_id, "triage pending entry expired");
    }
}
