//! Spawns the five concurrent triage activities (minus the queue managers,
//! which fold into the response dispatcher since both queues live behind a
//! single inbound channel) and returns their join handles.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use ipc::Bus;

use crate::monitor;
use crate::queues::{AppointmentQueue, EmergencyQueue};
use crate::workers::{self, OperationIdAllocator, ReadyNotifier};
use crate::dispatcher;

pub const TREATMENT_WORKER_COUNT: usize = 3;

pub struct TriageHandles {
    pub threads: Vec<JoinHandle<()>>,
}

pub fn spawn(bus: Arc<Bus>) -> TriageHandles {
    let emergency = Arc::new(EmergencyQueue::new(bus.config.max_emergency_patients as usize));
    let appointment = Arc::new(AppointmentQueue::new(bus.config.max_appointments as usize));
    let notifier = Arc::new(ReadyNotifier::default());
    let op_ids = Arc::new(OperationIdAllocator::new());

    let mut threads = Vec::new();

    {
        let bus = bus.clone();
        let emergency = emergency.clone();
        let appointment = appointment.clone();
        threads.push(thread::spawn(move || monitor::run(bus, emergency, appointment)));
    }

    {
        let bus = bus.clone();
        let emergency = emergency.clone();
        let appointment = appointment.clone();
        let notifier = notifier.clone();
        threads.push(thread::spawn(move || dispatcher::run(bus, emergency, appointment, notifier)));
    }

    for worker_id in 0..TREATMENT_WORKER_COUNT {
        let bus = bus.clone();
        let emergency = emergency.clone();
        let appointment = appointment.clone();
        let notifier = notifier.clone();
        let op_ids = op_ids.clone();
        threads.push(thread::spawn(move || {
            workers::run(worker_id, bus, emergency, appointment, notifier, op_ids)
        }));
    }

    TriageHandles { threads }
}
