//! Lab Service: priority-to-FIFO dispatcher plus a fixed worker pool running
//! single-lab and two-phase PREOP test flows against the LAB1/LAB2 capacity
//! semaphores.

pub mod coordinator;
pub mod dispatcher;
pub mod internal_queue;
pub mod worker;

pub use coordinator::{spawn, LabHandles};
