//! Pharmacy Service: priority-ordered dispatch, bounded concurrent workers,
//! stock check/reserve/prepare/dispense with auto-restock on threshold.

pub mod coordinator;
pub mod dispatcher;
pub mod worker;

pub use coordinator::{spawn, PharmacyHandles};
