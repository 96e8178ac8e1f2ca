//! Vital monitor: once per tick, ages every emergency patient's stability
//! down by one, handles death and the critical-threshold crossing, and
//! promotes critical appointment patients into the emergency queue.

use std::sync::Arc;

use ipc::{clock, Bus};

use crate::queues::{AppointmentQueue, EmergencyQueue};

pub fn run(bus: Arc<Bus>, emergency: Arc<EmergencyQueue>, appointment: Arc<AppointmentQueue>) {
    let critical_threshold = bus.config.triage.critical_threshold;
    let time_unit_ms = bus.config.time_unit_ms;

    while !bus.control.should_stop() {
        clock::wait_ticks(1, time_unit_ms);
        if bus.control.should_stop() {
            break;
        }

        let dead = emergency.retain_decay(|patient| {
            patient.stability -= 1;
            if patient.stability <= 0 {
                return false;
            }
            if !patient.is_critical && patient.stability <= critical_threshold {
                patient.is_critical = true;
            }
            true
        });
        for patient in dead {
            tracing::warn!(patient_id = %patient.id, "PATIENT_DIED");
            bus.stats.patient_died();
        }

        while let Some(critical_appointment) = appointment.take_critical() {
            emergency.insert(critical_appointment);
            bus.stats.critical_transfer();
        }
    }
}
