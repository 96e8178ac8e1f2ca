//! Drains pharmacy requests by priority and spawns one worker thread per
//! request, capped at `MAX_CONCURRENT_REQUESTS` in flight at once.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use ipc::semaphore::CountingSemaphore;
use ipc::Bus;

use crate::worker;

pub const MAX_CONCURRENT_REQUESTS: usize = 20;

pub fn run(bus: Arc<Bus>, spawn_cap: Arc<CountingSemaphore>) {
    loop {
        let msg = match bus.pharmacy_inbound.recv_timeout(Duration::from_millis(50)) {
            Some(msg) => msg,
            None => {
                if bus.control.should_stop() && bus.pharmacy_inbound.is_shutdown() {
                    break;
                }
                continue;
            }
        };

        let bus = bus.clone();
        let spawn_cap = spawn_cap.clone();
        thread::spawn(move || {
            // Blocks here rather than in the dispatcher loop, so the
            // dispatcher keeps draining the priority queue while requests
            // queue up for a free concurrency slot.
            let _permit = match spawn_cap.acquire() {
                Some(p) => p,
                None => return,
            };
            worker::run(bus, msg.0);
        });
    }
}
