//! Triage Coordinator: emergency/appointment admission queues, the vital
//! monitor, the treatment worker pool, and the response dispatcher.

pub mod coordinator;
pub mod dispatcher;
pub mod monitor;
pub mod queues;
pub mod workers;

pub use coordinator::{spawn, TriageHandles};
