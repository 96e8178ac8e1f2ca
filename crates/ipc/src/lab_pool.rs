//! Lab Service shared state: the inbound request queue plus the two
//! per-lab counting semaphores (LAB1/LAB2 slots). Kept in `ipc` rather than
//! the `lab` crate so `bus.rs` can own it without `ipc` depending on `lab`.

use common::lab::LabJob;

use crate::queue::PriorityQueue;
use crate::semaphore::CountingSemaphore;

pub struct LabWorkQueue {
    pub inbound: PriorityQueue<LabJob>,
    pub lab1_slots: CountingSemaphore,
    pub lab2_slots: CountingSemaphore,
}

impl LabWorkQueue {
    pub fn new(lab1_capacity: usize, lab2_capacity: usize) -> Self {
        LabWorkQueue {
            inbound: PriorityQueue::new(),
            lab1_slots: CountingSemaphore::new(lab1_capacity),
            lab2_slots: CountingSemaphore::new(lab2_capacity),
        }
    }

    pub fn shutdown(&self) {
        self.inbound.shutdown();
        self.lab1_slots.shutdown();
        self.lab2_slots.shutdown();
    }
}
