//! Domain types and configuration shared by every subsystem crate.
//!
//! Nothing in this crate blocks, spawns a thread, or touches a mutex — it is
//! the plain-data layer the rest of the workspace builds concurrency on top
//! of.

pub mod config;
pub mod lab;
pub mod message;
pub mod patient;
pub mod pharmacy;
pub mod surgery;

pub use config::Config;
pub use message::{Envelope, MessageKind, Priority, Sender};
pub use patient::{Patient, PatientId, PatientKind};
pub use surgery::{Surgery, SurgeryId, SurgeryType, Urgency};

/// The simulator's logical time unit. Every duration in the system is
/// expressed in ticks; `Config::time_unit_ms` is the only place ticks are
/// related back to wall-clock milliseconds.
pub type Tick = u64;
