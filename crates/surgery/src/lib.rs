//! Surgery Coordinator: per-surgery worker state machine, the active-
//! surgeries index, and the FIFO dispatcher that spawns and resumes them.

pub mod active;
pub mod coordinator;
pub mod dispatcher;
pub mod worker;

pub use coordinator::{spawn, SurgeryHandles};
