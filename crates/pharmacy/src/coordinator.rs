//! Spawns the Pharmacy Service's single dispatcher thread, which itself
//! spawns a bounded number of concurrent per-request worker threads.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use ipc::semaphore::CountingSemaphore;
use ipc::Bus;

use crate::dispatcher;
use crate::dispatcher::MAX_CONCURRENT_REQUESTS;

pub struct PharmacyHandles {
    pub threads: Vec<JoinHandle<()>>,
}

pub fn spawn(bus: Arc<Bus>) -> PharmacyHandles {
    let spawn_cap = Arc::new(CountingSemaphore::new(MAX_CONCURRENT_REQUESTS));
    let handle = thread::spawn(move || dispatcher::run(bus, spawn_cap));
    PharmacyHandles { threads: vec![handle] }
}
