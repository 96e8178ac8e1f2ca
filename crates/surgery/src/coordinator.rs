//! Spawns the Surgery Coordinator's one dispatcher thread. Per-surgery
//! worker threads are spawned dynamically by the dispatcher as requests and
//! promotions arrive, not up front.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use ipc::Bus;

use crate::active::ActiveSurgeries;
use crate::dispatcher;

pub struct SurgeryHandles {
    pub threads: Vec<JoinHandle<()>>,
}

pub fn spawn(bus: Arc<Bus>) -> SurgeryHandles {
    let active = Arc::new(ActiveSurgeries::new());
    let handle = thread::spawn(move || dispatcher::run(bus, active));
    SurgeryHandles { threads: vec![handle] }
}
