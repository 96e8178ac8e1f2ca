//! Drains the bus's priority-ordered inbound queue and re-enqueues each job
//! onto the internal FIFO the fixed worker pool drains from.

use std::sync::Arc;
use std::time::Duration;

use ipc::Bus;

use crate::internal_queue::InternalQueue;

pub fn run(bus: Arc<Bus>, internal: Arc<InternalQueue>) {
    loop {
        match bus.lab_queue.inbound.recv_timeout(Duration::from_millis(50)) {
            Some(job) => internal.push(job),
            None => {
                if bus.control.should_stop() && bus.lab_queue.inbound.is_shutdown() {
                    internal.shutdown();
                    break;
                }
            }
        }
    }
}
