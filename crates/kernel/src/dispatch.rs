//! The dispatch kernel's main loop: reads commands from an input stream,
//! validates them, schedules or delivers them, and advances the logical
//! clock. Mirrors the multiplexed-wait design in §4.1, with the self-pipe
//! signal pattern implemented as a second producer into the same channel
//! the line reader feeds.

use std::io::BufRead;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use common::message::{ManagerFeedbackMsg, PharmMsg, SurgeryMsg, TriageMsg};
use common::Priority;
use ipc::Bus;

use crate::command::{self, StatusTarget};
use crate::scheduler::Scheduler;
use crate::validate::{self, Action};

enum KernelEvent {
    Line(String),
    Eof,
    Shutdown,
}

/// Runs the kernel loop to completion, returning the process exit code (0
/// on clean shutdown; this function does not itself fail on bad commands,
/// only on stdin errors).
pub fn run(bus: Arc<Bus>, input: impl BufRead + Send + 'static) -> i32 {
    let (tx, rx) = mpsc::channel::<KernelEvent>();

    let reader_tx = tx.clone();
    thread::spawn(move || {
        let mut input = input;
        loop {
            let mut line = String::new();
            match input.read_line(&mut line) {
                Ok(0) => {
                    let _ = reader_tx.send(KernelEvent::Eof);
                    break;
                }
                Ok(_) => {
                    let trimmed = line.trim();
                    if !trimmed.is_empty() && reader_tx.send(KernelEvent::Line(trimmed.to_string())).is_err() {
                        break;
                    }
                }
                Err(_) => {
                    let _ = reader_tx.send(KernelEvent::Eof);
                    break;
                }
            }
        }
    });

    let signal_tx = tx.clone();
    let ctrlc_result = ctrlc::set_handler(move || {
        let _ = signal_tx.send(KernelEvent::Shutdown);
    });
    if let Err(err) = ctrlc_result {
        tracing::warn!(%err, "failed to install signal handler, continuing without it");
    }

    let feedback_bus = bus.clone();
    thread::spawn(move || manager_feedback_reader(feedback_bus));

    let mut scheduler = Scheduler::new();
    let mut next_surgery_id: u64 = 1;
    let mut next_manager_operation_id: u64 = 3000;
    let time_unit_ms = bus.config.time_unit_ms;
    let mut accumulated_ms: u64 = 0;
    let mut last_wake = Instant::now();

    loop {
        if bus.control.should_stop() {
            break;
        }

        let timeout = match scheduler.next_deliver_tick() {
            Some(next_tick) => {
                let current = bus.clock.current();
                let ticks_away = next_tick.saturating_sub(current);
                let ms_needed = ticks_away.saturating_mul(time_unit_ms).saturating_sub(accumulated_ms);
                Duration::from_millis(ms_needed)
            }
            None => Duration::from_millis(time_unit_ms.max(1)),
        };

        match rx.recv_timeout(timeout) {
            Ok(KernelEvent::Line(line)) => {
                handle_line(&bus, &mut scheduler, &mut next_surgery_id, &mut next_manager_operation_id, &line);
            }
            Ok(KernelEvent::Shutdown) | Ok(KernelEvent::Eof) => {
                break;
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }

        let elapsed = last_wake.elapsed().as_millis() as u64;
        last_wake = Instant::now();
        accumulated_ms += elapsed;
        let whole_ticks = accumulated_ms / time_unit_ms.max(1);
        if whole_ticks > 0 {
            accumulated_ms -= whole_ticks * time_unit_ms.max(1);
            let new_tick = bus.clock.advance(whole_ticks);
            bus.stats.set_tick(new_tick);
            deliver_due(&bus, &mut scheduler, new_tick);
        }
    }

    tracing::info!("dispatch kernel shutting down");
    bus.shutdown();
    0
}

fn handle_line(
    bus: &Arc<Bus>,
    scheduler: &mut Scheduler,
    next_surgery_id: &mut u64,
    next_manager_operation_id: &mut u64,
    line: &str,
) {
    let cmd = match command::parse(line) {
        Ok(cmd) => cmd,
        Err(err) => {
            tracing::warn!(%err, %line, "rejected malformed command");
            return;
        }
    };

    let current_tick = bus.clock.current();
    let action = match validate::validate(
        cmd,
        current_tick,
        &bus.config,
        next_surgery_id,
        next_manager_operation_id,
    ) {
        Ok(action) => action,
        Err(err) => {
            tracing::warn!(%err, %line, "rejected invalid command");
            return;
        }
    };

    match &action {
        Action::Shutdown => {
            bus.control.set_shutdown(true);
        }
        Action::Help => {
            tracing::info!("{}", HELP_TEXT);
        }
        Action::Status(target) => {
            report_status(bus, *target);
        }
        Action::Restock { medname, quantity } => {
            if let Some(med) = bus.stock.find(medname) {
                let new_level = bus.stock.add_stock(med, *quantity);
                tracing::info!(%medname, new_level, "manual restock applied");
            } else {
                tracing::warn!(%medname, "restock rejected: unknown medication");
            }
        }
        Action::NewEmergency { init, .. }
        | Action::NewAppointment { init, .. }
        | Action::NewSurgery { init, .. }
        | Action::PharmacyRequest { init, .. }
        | Action::LabRequest { init, .. } => {
            let deliver_tick = current_tick + init;
            if deliver_tick <= current_tick {
                deliver_one(bus, action);
            } else {
                scheduler.insert(deliver_tick, action);
            }
        }
    }
}

/// Drains completions of manager-issued `LAB_REQUEST`/`PHARMACY_REQUEST`
/// commands and logs them; this is the operator's only visibility into those
/// since they have no patient or surgery record waiting on the reply.
fn manager_feedback_reader(bus: Arc<Bus>) {
    loop {
        match bus.manager_feedback.recv_timeout(Duration::from_millis(200)) {
            Some(msg) => match msg {
                ManagerFeedbackMsg::LabResultsReady { operation_id, tick } => {
                    tracing::info!(operation_id, tick, "LAB_REQUEST completed");
                }
                ManagerFeedbackMsg::PharmReady { operation_id, success, tick } => {
                    tracing::info!(operation_id, success, tick, "PHARMACY_REQUEST completed");
                }
            },
            None => {
                if bus.control.should_stop() && bus.manager_feedback.is_shutdown() {
                    break;
                }
            }
        }
    }
}

fn deliver_due(bus: &Arc<Bus>, scheduler: &mut Scheduler, current_tick: common::Tick) {
    for event in scheduler.drain_due(current_tick) {
        deliver_one(bus, event.action);
    }
}

fn deliver_one(bus: &Arc<Bus>, action: Action) {
    match action {
        Action::NewEmergency { patient, .. } => {
            bus.triage_inbound.send(Priority::Normal, TriageMsg::Admit(patient));
        }
        Action::NewAppointment { patient, .. } => {
            bus.triage_inbound.send(Priority::Normal, TriageMsg::Admit(patient));
        }
        Action::NewSurgery { surgery, .. } => {
            bus.surgery_inbound.send(Priority::Normal, SurgeryMsg::Request(surgery));
        }
        Action::PharmacyRequest { job, .. } => {
            let priority = job.priority;
            bus.pharmacy_inbound.send(priority, PharmMsg(job));
        }
        Action::LabRequest { job, .. } => {
            let priority = job.priority;
            bus.lab_queue.inbound.send(priority, job);
        }
        Action::Shutdown | Action::Help | Action::Status(_) | Action::Restock { .. } => {
            unreachable!("non-scheduled actions never reach the scheduler")
        }
    }
}

fn report_status(bus: &Arc<Bus>, target: StatusTarget) {
    let snap = bus.stats.snapshot();
    match target {
        StatusTarget::All => {
            tracing::info!(?snap, "STATUS ALL");
        }
        StatusTarget::Triage => {
            tracing::info!(
                pending = bus.triage_pending.len(),
                emergencies_admitted = snap.emergencies_admitted,
                appointments_admitted = snap.appointments_admitted,
                "STATUS TRIAGE"
            );
        }
        StatusTarget::Surgery => {
            tracing::info!(
                pending = bus.surgery_pending.len(),
                completed = snap.surgeries_completed,
                cancelled = snap.cancelled_surgeries,
                "STATUS SURGERY"
            );
        }
        StatusTarget::Pharmacy => {
            tracing::info!(
                dispensed = snap.pharmacy_dispensed,
                depletions = snap.stock_depletions,
                restocks = snap.auto_restocks,
                "STATUS PHARMACY"
            );
        }
        StatusTarget::Lab => {
            tracing::info!(completed = snap.lab_tests_completed, "STATUS LAB");
        }
    }
}

const HELP_TEXT: &str = "\
SHUTDOWN
STATUS {ALL|TRIAGE|SURGERY|PHARMACY|LAB}
EMERGENCY <PACid> init:<n> triage:<1-5> stability:<n>=100 [tests:[..]] [meds:[..]]
APPOINTMENT <PACid> init:<n> scheduled:<n> doctor:{CARDIO|ORTHO|NEURO} [tests:[..]]
SURGERY <PACid> init:<n> type:{CARDIO|ORTHO|NEURO} scheduled:<n> urgency:{LOW|MEDIUM|HIGH} tests:[..,PREOP,..] meds:[..]
PHARMACY_REQUEST <REQid> init:<n> priority:{URGENT|HIGH|NORMAL} items:[name:qty,..]
LAB_REQUEST <LABid> init:<n> priority:{URGENT|NORMAL} lab:{LAB1|LAB2|BOTH} tests:[..]
RESTOCK <medname> quantity:<n>
HELP";
