//! Spawns the Lab Service: one dispatcher thread re-enqueuing by priority,
//! plus a fixed pool of worker threads draining the resulting FIFO.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use ipc::Bus;

use crate::dispatcher;
use crate::internal_queue::InternalQueue;
use crate::worker;

pub const LAB_WORKER_COUNT: usize = 5;

pub struct LabHandles {
    pub threads: Vec<JoinHandle<()>>,
}

pub fn spawn(bus: Arc<Bus>) -> LabHandles {
    let internal = Arc::new(InternalQueue::new());
    let mut threads = Vec::new();

    {
        let bus = bus.clone();
        let internal = internal.clone();
        threads.push(thread::spawn(move || dispatcher::run(bus, internal)));
    }

    for _ in 0..LAB_WORKER_COUNT {
        let bus = bus.clone();
        let internal = internal.clone();
        threads.push(thread::spawn(move || worker::run(bus, internal)));
    }

    LabHandles { threads }
}
