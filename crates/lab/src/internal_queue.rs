//! The Lab Service's internal FIFO. The dispatcher drains the bus's
//! priority-ordered inbound queue and re-enqueues here in arrival order;
//! workers only ever see FIFO order once a job has cleared priority
//! selection, matching the two-stage dispatch described for the service.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

use common::lab::LabJob;

struct State {
    jobs: VecDeque<LabJob>,
    shutdown: bool,
}

#[derive(Default)]
pub struct InternalQueue {
    state: Mutex<State>,
    not_empty: Condvar,
}

impl Default for State {
    fn default() -> Self {
        State { jobs: VecDeque::new(), shutdown: false }
    }
}

impl InternalQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, job: LabJob) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.jobs.push_back(job);
        drop(state);
        self.not_empty.notify_one();
    }

    /// Blocks until a job is available or the queue shuts down, at which
    /// point workers drain out without finishing already-queued jobs, per
    /// the shutdown contract for this service.
    pub fn pop_blocking(&self) -> Option<LabJob> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            if state.shutdown {
                return None;
            }
            if let Some(job) = state.jobs.pop_front() {
                return Some(job);
            }
            state = self.not_empty.wait(state).unwrap_or_else(|e| e.into_inner());
        }
    }

    pub fn shutdown(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.shutdown = true;
        drop(state);
        self.not_empty.notify_all();
    }
}
