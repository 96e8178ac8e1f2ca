//! Per-surgery worker: the state machine from dependency request through
//! execution and cleanup. One thread per active surgery, spawned by the
//! dispatcher and torn down either on completion, cancellation, or a
//! dependency-wait timeout (which hands the record to the pending list
//! instead of killing it).

use std::sync::Arc;
use std::time::Duration;

use common::config::INITIAL_DEPENDENCY_TIMEOUT;
use common::lab::LabJob;
use common::message::{MedItem, PharmJob, PharmMsg, Priority, Sender};
use common::patient::Specialty;
use common::Tick;
use ipc::rooms::RoomId;
use ipc::{clock, Bus};
use rand::Rng;

use crate::active::{ActiveSurgeries, SurgerySlot};

/// BO1 serves cardiac surgeries, BO2 orthopedic, BO3 neurological — a fixed
/// room assignment by specialty rather than a pool-wide free-for-all, so
/// each room's utilization tracks one surgical discipline.
fn room_for(surgery_type: Specialty) -> RoomId {
    match surgery_type {
        Specialty::Cardio => RoomId::Bo1,
        Specialty::Ortho => RoomId::Bo2,
        Specialty::Neuro => RoomId::Bo3,
    }
}

fn duration_range(bus: &Bus, room: RoomId) -> (Tick, Tick) {
    let s = &bus.config.surgery;
    match room {
        RoomId::Bo1 => (s.bo1_min_duration, s.bo1_max_duration),
        RoomId::Bo2 => (s.bo2_min_duration, s.bo2_max_duration),
        RoomId::Bo3 => (s.bo3_min_duration, s.bo3_max_duration),
    }
}

fn draw(min: Tick, max: Tick) -> Tick {
    if min >= max {
        return min;
    }
    rand::thread_rng().gen_range(min..=max)
}

/// Practically unbounded wait for a room/team permit — real cancellation
/// only happens via semaphore shutdown, not timeout, once resources are
/// being acquired.
const RESOURCE_WAIT: Duration = Duration::from_secs(365 * 24 * 3600);

fn request_dependencies(bus: &Bus, slot: &SurgerySlot, surgery_id: u64) {
    let (patient_id, needs_tests, needs_meds, tests, meds, request_tick) = {
        let surgery = slot.surgery.lock().unwrap_or_else(|e| e.into_inner());
        (
            surgery.patient_id.clone(),
            surgery.needs_tests,
            surgery.needs_meds,
            surgery.tests.clone(),
            surgery.meds.clone(),
            bus.clock.current(),
        )
    };

    if needs_tests {
        bus.lab_queue.inbound.send(
            Priority::Urgent,
            LabJob {
                operation_id: surgery_id,
                patient_id: patient_id.clone(),
                tests,
                request_tick,
                sender: Sender::Surgery,
                priority: Priority::Urgent,
            },
        );
    }
    if needs_meds {
        bus.pharmacy_inbound.send(
            Priority::Urgent,
            PharmMsg(PharmJob {
                operation_id: surgery_id,
                patient_id,
                items: meds.into_iter().map(|name| MedItem { name, qty: 1 }).collect(),
                request_tick,
                sender: Sender::Surgery,
                priority: Priority::Urgent,
            }),
        );
    }
}

/// Waits on the slot's condvar until dependencies are satisfied or the
/// initial timeout elapses. Returns `true` if satisfied.
fn await_dependencies(bus: &Bus, slot: &SurgerySlot) -> bool {
    let timeout = Duration::from_millis(INITIAL_DEPENDENCY_TIMEOUT * bus.config.time_unit_ms);
    let guard = slot.surgery.lock().unwrap_or_else(|e| e.into_inner());
    let (guard, _) = slot
        .changed
        .wait_timeout_while(guard, timeout, |s| !s.dependencies_satisfied())
        .unwrap_or_else(|e| e.into_inner());
    guard.dependencies_satisfied()
}

fn await_scheduled_tick(bus: &Bus, scheduled_tick: Tick) {
    loop {
        let current = bus.clock.current();
        if current >= scheduled_tick || bus.control.should_stop() {
            break;
        }
        clock::wait_ticks(1, bus.config.time_unit_ms);
    }
}

pub fn run(
    bus: Arc<Bus>,
    active: Arc<ActiveSurgeries>,
    slot: Arc<SurgerySlot>,
    surgery_id: u64,
    skip_deps_phase: bool,
) {
    if !skip_deps_phase {
        request_dependencies(&bus, &slot, surgery_id);
        if !await_dependencies(&bus, &slot) {
            let surgery = slot.surgery.lock().unwrap_or_else(|e| e.into_inner()).clone();
            active.remove(surgery_id);
            bus.surgery_pending.insert(surgery_id, surgery, bus.clock.current());
            tracing::info!(surgery_id, "surgery dependencies not ready, moved to pending list");
            return;
        }
    }

    let (surgery_type, scheduled_tick, patient_id) = {
        let surgery = slot.surgery.lock().unwrap_or_else(|e| e.into_inner());
        (surgery.surgery_type, surgery.scheduled_tick, surgery.patient_id.clone())
    };

    await_scheduled_tick(&bus, scheduled_tick);
    if bus.control.should_stop() {
        active.remove(surgery_id);
        bus.stats.surgery_cancelled();
        return;
    }

    let wait_time = bus.clock.current().saturating_sub(scheduled_tick);
    bus.stats.record_surgery_wait_time(wait_time);

    let room = room_for(surgery_type);
    let room_permit = bus.rooms.acquire(room, RESOURCE_WAIT);
    let room_permit = match room_permit {
        Some(p) => p,
        None => {
            active.remove(surgery_id);
            bus.stats.surgery_cancelled();
            tracing::warn!(surgery_id, "surgery cancelled: could not acquire room");
            return;
        }
    };

    let team_permit = bus.medical_teams.acquire_timeout(RESOURCE_WAIT);
    let team_permit = match team_permit {
        Some(p) => p,
        None => {
            drop(room_permit);
            active.remove(surgery_id);
            bus.stats.surgery_cancelled();
            tracing::warn!(surgery_id, "surgery cancelled: could not acquire medical team");
            return;
        }
    };

    let (min, max) = duration_range(&bus, room);
    let duration = draw(min, max);
    let start_tick = bus.clock.current();
    bus.rooms.mark_occupied(room, patient_id, start_tick, start_tick + duration);
    clock::wait_ticks(duration, bus.config.time_unit_ms);

    drop(team_permit);

    bus.rooms.mark_cleaning(room);
    let (cmin, cmax) = (bus.config.surgery.cleanup_min_time, bus.config.surgery.cleanup_max_time);
    clock::wait_ticks(draw(cmin, cmax), bus.config.time_unit_ms);
    bus.rooms.mark_free(room);
    drop(room_permit);

    bus.stats.surgery_completed();
    active.remove(surgery_id);
    tracing::info!(surgery_id, "surgery completed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::surgery::Urgency;

    #[test]
    fn room_assignment_follows_specialty() {
        assert_eq!(room_for(Specialty::Cardio), RoomId::Bo1);
        assert_eq!(room_for(Specialty::Ortho), RoomId::Bo2);
        assert_eq!(room_for(Specialty::Neuro), RoomId::Bo3);
    }

    #[test]
    fn draw_handles_degenerate_range() {
        assert_eq!(draw(5, 5), 5);
        assert_eq!(draw(5, 4), 5);
    }

    #[test]
    fn await_dependencies_returns_immediately_when_already_satisfied() {
        let config: common::config::Config = toml::from_str(
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
        .unwrap();
        let bus = Bus::new(config);
        let surgery = common::Surgery::new(
            1,
            "PAC00001".into(),
            Specialty::Cardio,
            Urgency::Low,
            10,
            5,
            vec![],
            vec![],
        );
        let slot = SurgerySlot::new(surgery);
        assert!(await_dependencies(&bus, &slot));
    }
}
