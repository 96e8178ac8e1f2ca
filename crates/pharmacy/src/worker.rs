//! Per-request pharmacy worker: stock check, reserve, prepare (unlocked
//! sleep), dispense, notify. Any insufficient-stock row rolls back whatever
//! was already reserved for this request before notifying failure.

use std::sync::Arc;

use common::message::{ManagerFeedbackMsg, PharmJob, Sender, SurgeryMsg, TriageMsg};
use ipc::stock::MedId;
use ipc::{clock, Bus};
use rand::Rng;

fn draw(min: u64, max: u64) -> u64 {
    if min >= max {
        return min;
    }
    rand::thread_rng().gen_range(min..=max)
}

/// Resolves every requested medication name to a row id, failing the whole
/// request if any name is unknown to the stock table.
fn resolve_rows(bus: &Bus, job: &PharmJob) -> Option<Vec<(MedId, u32)>> {
    job.items
        .iter()
        .map(|item| bus.stock.find(&item.name).map(|id| (id, item.qty)))
        .collect()
}

fn reserve_all(bus: &Bus, rows: &[(MedId, u32)]) -> Result<(), usize> {
    for (i, (med, qty)) in rows.iter().enumerate() {
        if !bus.stock.reserve(*med, *qty) {
            return Err(i);
        }
    }
    Ok(())
}

fn rollback(bus: &Bus, rows: &[(MedId, u32)], reserved_count: usize) {
    for (med, qty) in rows.iter().take(reserved_count) {
        bus.stock.release_reservation(*med, *qty);
    }
}

fn notify_success(bus: &Bus, job: &PharmJob) {
    match job.sender {
        Sender::Surgery => {
            bus.surgery_inbound.send(
                job.priority,
                SurgeryMsg::PharmReady { surgery_id: job.operation_id, operation_id: job.operation_id },
            );
        }
        Sender::Triage => {
            bus.triage_inbound.send(
                job.priority,
                TriageMsg::PharmReady { patient_id: job.patient_id.clone(), operation_id: job.operation_id },
            );
        }
        Sender::Manager => {
            bus.manager_feedback.send(
                job.priority,
                ManagerFeedbackMsg::PharmReady { operation_id: job.operation_id, success: true, tick: bus.clock.current() },
            );
        }
    }
}

fn notify_failure(bus: &Bus, job: &PharmJob, reason: &str) {
    match job.sender {
        Sender::Surgery => {
            bus.surgery_inbound.send(
                job.priority,
                SurgeryMsg::PharmFailed {
                    surgery_id: job.operation_id,
                    operation_id: job.operation_id,
                    reason: reason.to_string(),
                },
            );
        }
        Sender::Triage => {
            bus.triage_inbound.send(
                job.priority,
                TriageMsg::PharmFailed {
                    patient_id: job.patient_id.clone(),
                    operation_id: job.operation_id,
                    reason: reason.to_string(),
                },
            );
        }
        Sender::Manager => {
            bus.manager_feedback.send(
                job.priority,
                ManagerFeedbackMsg::PharmReady { operation_id: job.operation_id, success: false, tick: bus.clock.current() },
            );
        }
    }
}

pub fn run(bus: Arc<Bus>, job: PharmJob) {
    let rows = match resolve_rows(&bus, &job) {
        Some(rows) => rows,
        None => {
            tracing::warn!(operation_id = job.operation_id, "pharmacy request names unknown medication");
            notify_failure(&bus, &job, "unknown medication");
            return;
        }
    };

    let concurrency = bus.pharmacy_concurrency.acquire();
    let concurrency = match concurrency {
        Some(p) => p,
        None => return,
    };

    if let Err(reserved_count) = reserve_all(&bus, &rows) {
        rollback(&bus, &rows, reserved_count);
        drop(concurrency);
        tracing::warn!(operation_id = job.operation_id, "pharmacy request rejected: insufficient stock");
        notify_failure(&bus, &job, "insufficient stock");
        return;
    }
    drop(concurrency);

    let prep = draw(bus.config.pharmacy.pharmacy_prep_time_min, bus.config.pharmacy.pharmacy_prep_time_max);
    clock::wait_ticks(prep, bus.config.time_unit_ms);

    let concurrency = match bus.pharmacy_concurrency.acquire() {
        Some(p) => p,
        None => {
            rollback(&bus, &rows, rows.len());
            return;
        }
    };

    for ((med, qty), item) in rows.iter().zip(job.items.iter()) {
        let (depleted, restocked) = bus.stock.dispense(
            *med,
            *qty,
            bus.config.pharmacy.auto_restock_enabled,
            bus.config.pharmacy.restock_qty_multiplier,
        );
        bus.stats.medication_used(&item.name, *qty);
        if depleted {
            bus.stats.stock_depletion();
        }
        if restocked {
            bus.stats.auto_restock();
        }
    }
    drop(concurrency);

    bus.stats.pharmacy_dispensed();
    notify_success(&bus, &job);
}
